// Registration field values collected by the wizard.
//
// All values are kept as strings (the terms checkbox aside) because they are
// entered, persisted and re-rendered as text; parsing into numbers/dates only
// happens at validation and submission boundaries.

use serde::{Deserialize, Serialize};

use super::state::Channel;

/// Every field the wizard collects, in one flat namespace.
///
/// Steps declare which subset they own (see `wizard::steps`), and the
/// validator only ever looks at the fields declared for the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Gender,
    DateOfBirth,
    MaritalStatus,
    PhoneNumber,
    Email,
    Nin,
    StreetAddress,
    City,
    State,
    Bvn,
    BankName,
    AccountNumber,
    AccountName,
    Employer,
    EmployerName,
    MonthlyIncome,
    SelfieDataUri,
    LoanAmount,
    LoanTenureMonths,
    TermsAccepted,
}

impl Field {
    /// Human label used for inline validation errors and TUI input captions.
    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Gender => "Gender",
            Field::DateOfBirth => "Date of birth",
            Field::MaritalStatus => "Marital status",
            Field::PhoneNumber => "Phone number",
            Field::Email => "Email address",
            Field::Nin => "NIN",
            Field::StreetAddress => "Street address",
            Field::City => "City",
            Field::State => "State",
            Field::Bvn => "BVN",
            Field::BankName => "Bank",
            Field::AccountNumber => "Account number",
            Field::AccountName => "Account name",
            Field::Employer => "Employer",
            Field::EmployerName => "Employer name",
            Field::MonthlyIncome => "Monthly income",
            Field::SelfieDataUri => "Selfie",
            Field::LoanAmount => "Loan amount",
            Field::LoanTenureMonths => "Loan tenure (months)",
            Field::TermsAccepted => "Terms and conditions",
        }
    }

    /// The verification channel whose `verified` flag must be invalidated
    /// when this field's value changes away from the value that was verified.
    pub fn verification_channel(self) -> Option<Channel> {
        match self {
            Field::PhoneNumber => Some(Channel::Phone),
            Field::Email => Some(Channel::Email),
            Field::Bvn => Some(Channel::Bvn),
            _ => None,
        }
    }
}

/// Raw field values, persisted verbatim as the `registration_fields` blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationFields {
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
    pub bvn: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub employer: String,
    pub employer_name: String,
    pub monthly_income: String,
    pub selfie_data_uri: String,
    pub loan_amount: String,
    pub loan_tenure_months: String,
    pub terms_accepted: bool,
}

impl RegistrationFields {
    pub fn get(&self, field: Field) -> String {
        match field {
            Field::FirstName => self.first_name.clone(),
            Field::LastName => self.last_name.clone(),
            Field::Gender => self.gender.clone(),
            Field::DateOfBirth => self.date_of_birth.clone(),
            Field::MaritalStatus => self.marital_status.clone(),
            Field::PhoneNumber => self.phone_number.clone(),
            Field::Email => self.email.clone(),
            Field::Nin => self.nin.clone(),
            Field::StreetAddress => self.street_address.clone(),
            Field::City => self.city.clone(),
            Field::State => self.state.clone(),
            Field::Bvn => self.bvn.clone(),
            Field::BankName => self.bank_name.clone(),
            Field::AccountNumber => self.account_number.clone(),
            Field::AccountName => self.account_name.clone(),
            Field::Employer => self.employer.clone(),
            Field::EmployerName => self.employer_name.clone(),
            Field::MonthlyIncome => self.monthly_income.clone(),
            Field::SelfieDataUri => self.selfie_data_uri.clone(),
            Field::LoanAmount => self.loan_amount.clone(),
            Field::LoanTenureMonths => self.loan_tenure_months.clone(),
            Field::TermsAccepted => {
                if self.terms_accepted {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
        }
    }

    pub fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::FirstName => self.first_name = value.to_string(),
            Field::LastName => self.last_name = value.to_string(),
            Field::Gender => self.gender = value.to_string(),
            Field::DateOfBirth => self.date_of_birth = value.to_string(),
            Field::MaritalStatus => self.marital_status = value.to_string(),
            Field::PhoneNumber => self.phone_number = value.to_string(),
            Field::Email => self.email = value.to_string(),
            Field::Nin => self.nin = value.to_string(),
            Field::StreetAddress => self.street_address = value.to_string(),
            Field::City => self.city = value.to_string(),
            Field::State => self.state = value.to_string(),
            Field::Bvn => self.bvn = value.to_string(),
            Field::BankName => self.bank_name = value.to_string(),
            Field::AccountNumber => self.account_number = value.to_string(),
            Field::AccountName => self.account_name = value.to_string(),
            Field::Employer => self.employer = value.to_string(),
            Field::EmployerName => self.employer_name = value.to_string(),
            Field::MonthlyIncome => self.monthly_income = value.to_string(),
            Field::SelfieDataUri => self.selfie_data_uri = value.to_string(),
            Field::LoanAmount => self.loan_amount = value.to_string(),
            Field::LoanTenureMonths => self.loan_tenure_months = value.to_string(),
            Field::TermsAccepted => self.terms_accepted = value.trim().eq_ignore_ascii_case("true"),
        }
    }
}
