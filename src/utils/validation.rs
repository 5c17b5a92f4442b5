// Input validation utilities
//
// Shape checks for identity and banking fields. These run entirely
// client-side; the backend re-validates everything on its own.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

/// Nigerian mobile numbers in local format: 11 digits starting 070/080/081/090/091.
pub fn validate_phone_number(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Phone number is required"));
    }
    let re = Regex::new(r"^0[789][01]\d{8}$")
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile phone regex: {}", e))?;
    if !re.is_match(s) {
        return Err(anyhow::anyhow!(
            "Enter a valid 11-digit Nigerian mobile number (e.g. 08031234567)"
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Email address is required"));
    }
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile email regex: {}", e))?;
    if !re.is_match(s) {
        return Err(anyhow::anyhow!("Enter a valid email address"));
    }
    Ok(())
}

/// BVN: exactly 11 digits.
pub fn validate_bvn(value: &str) -> Result<()> {
    validate_digits(value, 11, "BVN")
}

/// NIN: exactly 11 digits.
pub fn validate_nin(value: &str) -> Result<()> {
    validate_digits(value, 11, "NIN")
}

/// NUBAN account numbers are 10 digits.
pub fn validate_account_number(value: &str) -> Result<()> {
    validate_digits(value, 10, "Account number")
}

fn validate_digits(value: &str, len: usize, label: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("{} is required", label));
    }
    if s.len() != len || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow::anyhow!("{} must be exactly {} digits", label, len));
    }
    Ok(())
}

/// Date of birth: ISO date, in the past, and implying age >= 18.
pub fn validate_date_of_birth(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Date of birth is required"));
    }
    let dob = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Date of birth must be in YYYY-MM-DD format"))?;
    let today = Utc::now().date_naive();
    if dob >= today {
        return Err(anyhow::anyhow!("Date of birth must be in the past"));
    }
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    if age < 18 {
        return Err(anyhow::anyhow!("Applicants must be at least 18 years old"));
    }
    Ok(())
}

/// Loan amount: positive number within the product's bounds.
pub fn validate_loan_amount(value: &str, min: f64, max: f64) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Loan amount is required"));
    }
    let amount: f64 = s
        .parse()
        .map_err(|_| anyhow::anyhow!("Loan amount must be a number"))?;
    if amount < min || amount > max {
        return Err(anyhow::anyhow!(
            "Loan amount must be between {} and {}",
            min,
            max
        ));
    }
    Ok(())
}

pub fn validate_required(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow::anyhow!("{} is required", label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_local_mobile_format() {
        assert!(validate_phone_number("08031234567").is_ok());
        assert!(validate_phone_number("09112345678").is_ok());
        assert!(validate_phone_number("07011223344").is_ok());
    }

    #[test]
    fn phone_rejects_wrong_shape() {
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("0803123456").is_err()); // 10 digits
        assert!(validate_phone_number("+2348031234567").is_err()); // intl format not accepted here
        assert!(validate_phone_number("06031234567").is_err()); // bad prefix
    }

    #[test]
    fn bvn_and_nin_are_eleven_digits() {
        assert!(validate_bvn("12345678901").is_ok());
        assert!(validate_bvn("1234567890").is_err());
        assert!(validate_nin("1234567890a").is_err());
    }

    #[test]
    fn account_number_is_ten_digits() {
        assert!(validate_account_number("0123456789").is_ok());
        assert!(validate_account_number("01234567890").is_err());
    }

    #[test]
    fn dob_enforces_adult_age() {
        assert!(validate_date_of_birth("1990-04-12").is_ok());
        assert!(validate_date_of_birth("not-a-date").is_err());
        let last_year = chrono::Utc::now().date_naive() - chrono::Duration::days(365);
        assert!(validate_date_of_birth(&last_year.format("%Y-%m-%d").to_string()).is_err());
    }

    #[test]
    fn loan_amount_bounds() {
        assert!(validate_loan_amount("50000", 10_000.0, 5_000_000.0).is_ok());
        assert!(validate_loan_amount("100", 10_000.0, 5_000_000.0).is_err());
        assert!(validate_loan_amount("abc", 10_000.0, 5_000_000.0).is_err());
    }
}
