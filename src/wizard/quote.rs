// Loan economics.
//
// The formula is fixed by the backend's amortization model and must be
// reproduced exactly: the submitted installment has to match what the
// server recomputes. `daily_rate` is in percentage units (0.5 = 0.5%/day).

/// Client-side quote submitted with the loan application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanQuote {
    pub principal: f64,
    pub monthly_rate: f64,
    pub total_amount: f64,
    pub installment: f64,
    pub duration_months: u32,
}

/// Round half-up to 2 decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn compute(principal: f64, daily_rate: f64, duration_months: u32) -> LoanQuote {
    let monthly_rate = daily_rate * 30.0 / 100.0;
    let total_amount = round2(principal * (1.0 + monthly_rate * duration_months as f64));
    let installment = round2(total_amount / duration_months as f64);
    LoanQuote {
        principal,
        monthly_rate,
        total_amount,
        installment,
        duration_months,
    }
}
