// API request models
// Mirrors the lending backend's public contracts; field names follow the
// backend's camelCase JSON convention.

use serde::{Deserialize, Serialize};

// =========================
// Customers
// =========================

/// Body for both customer create (POST) and update (PUT /{id}).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpsertRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub marital_status: String,
    pub phone_number: String,
    pub email: String,
    pub nin: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDataRequest {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub bvn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentDataRequest {
    pub employer: String,
    pub monthly_income: String,
}

// =========================
// Verification
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BvnLookupRequest {
    pub bvn: String,
    /// The backend honors this flag to keep lookups internal-only (no
    /// external bureau call is made on our behalf).
    #[serde(default = "default_true")]
    pub internal_only: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpGenerateRequest {
    pub length: u8,
}

impl Default for OtpGenerateRequest {
    fn default() -> Self {
        Self { length: 6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSmsRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpEmailRequest {
    pub email: String,
    pub code: String,
}

// =========================
// Loans
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationRequest {
    pub customer_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub interest_rate: f64,
    pub installment_amount: f64,
    pub duration_months: u32,
    pub comment: String,
}

fn default_currency() -> String {
    "NGN".to_string()
}
