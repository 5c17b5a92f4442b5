// Loan application submission and system-parameter lookups.

use log::{info, warn};

use super::client::{ApiClient, ApiError};
use super::Backend;
use crate::models::requests::LoanApplicationRequest;
use crate::models::responses::{LoanApplicationResponse, SystemParameterResponse};

/// Fallback daily interest rate (percent) when the parameter service is
/// unavailable.
pub const FALLBACK_DAILY_RATE: f64 = 0.5;

/// Fallback tenure option list (months).
pub const FALLBACK_TENURE_OPTIONS: [&str; 5] = ["3", "6", "9", "11", "12"];

pub const PARAM_DAILY_RATE: &str = "loanInterestRate";
pub const PARAM_TENURE_OPTIONS: &str = "loanTenureOptions";

impl ApiClient {
    pub async fn get_system_parameter(&self, name: &str) -> Result<Option<String>, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&format!("parameters/{}", name)))
            .send()
            .await?;
        let data: Option<SystemParameterResponse> = self.read_optional_envelope(response).await?;
        Ok(data.map(|p| p.value))
    }

    pub async fn submit_loan_application(
        &self,
        req: &LoanApplicationRequest,
    ) -> Result<LoanApplicationResponse, ApiError> {
        info!(
            "[PHASE: api] [STEP: loan_submit] Submitting loan application (cid={}, customer_id={}, amount={}, months={})",
            self.correlation_id(),
            req.customer_id,
            req.amount,
            req.duration_months
        );
        let response = self
            .http
            .post(self.endpoint("loans"))
            .json(req)
            .send()
            .await?;
        self.read_envelope(response).await
    }
}

/// Daily interest rate from the parameter service, with the hardcoded
/// fallback when the service is unavailable or returns garbage.
pub async fn daily_interest_rate<B: Backend + ?Sized>(api: &B) -> f64 {
    match api.get_system_parameter(PARAM_DAILY_RATE).await {
        Ok(Some(value)) => value.trim().parse().unwrap_or_else(|_| {
            warn!(
                "[PHASE: api] [STEP: parameters] Unparseable interest rate '{}', using fallback {}",
                value, FALLBACK_DAILY_RATE
            );
            FALLBACK_DAILY_RATE
        }),
        Ok(None) => FALLBACK_DAILY_RATE,
        Err(e) => {
            warn!(
                "[PHASE: api] [STEP: parameters] Interest rate lookup failed ({}), using fallback {}",
                e, FALLBACK_DAILY_RATE
            );
            FALLBACK_DAILY_RATE
        }
    }
}

/// Tenure option list (months) from the parameter service, falling back to
/// the hardcoded list. The parameter value is a comma-separated list.
pub async fn tenure_options<B: Backend + ?Sized>(api: &B) -> Vec<String> {
    let fallback = || {
        FALLBACK_TENURE_OPTIONS
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
    };
    match api.get_system_parameter(PARAM_TENURE_OPTIONS).await {
        Ok(Some(value)) => {
            let options: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if options.is_empty() {
                fallback()
            } else {
                options
            }
        }
        Ok(None) => fallback(),
        Err(e) => {
            warn!(
                "[PHASE: api] [STEP: parameters] Tenure option lookup failed ({}), using fallback",
                e
            );
            fallback()
        }
    }
}
