// Per-step validation.
//
// Validates only the fields declared for a step. Pure: reads field values,
// returns error annotations, never contacts the server and never mutates
// wizard state.

use crate::models::fields::{Field, RegistrationFields};
use crate::utils::validation as rules;

pub const EMPLOYER_OTHER: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Validate one field in the context of the full field set (cross-field
/// rules need the context). `None` means the field passes.
fn check(field: Field, fields: &RegistrationFields, loan_bounds: (f64, f64)) -> Option<String> {
    let value = fields.get(field);
    let result = match field {
        Field::FirstName | Field::LastName | Field::Gender | Field::MaritalStatus => {
            rules::validate_required(&value, field.label())
        }
        Field::DateOfBirth => rules::validate_date_of_birth(&value),
        Field::PhoneNumber => rules::validate_phone_number(&value),
        Field::Email => rules::validate_email(&value),
        Field::Nin => rules::validate_nin(&value),
        Field::StreetAddress | Field::City | Field::State => {
            rules::validate_required(&value, field.label())
        }
        Field::Bvn => rules::validate_bvn(&value),
        Field::BankName | Field::AccountName => rules::validate_required(&value, field.label()),
        Field::AccountNumber => rules::validate_account_number(&value),
        Field::Employer => rules::validate_required(&value, field.label()),
        // A custom employer name is only required when "Other" is selected.
        Field::EmployerName => {
            if fields.employer.trim() == EMPLOYER_OTHER {
                rules::validate_required(&value, field.label())
            } else {
                Ok(())
            }
        }
        Field::MonthlyIncome => rules::validate_required(&value, field.label()),
        Field::SelfieDataUri => {
            if value.trim().is_empty() {
                Err(anyhow::anyhow!("A captured selfie is required"))
            } else {
                Ok(())
            }
        }
        Field::LoanAmount => rules::validate_loan_amount(&value, loan_bounds.0, loan_bounds.1),
        Field::LoanTenureMonths => {
            rules::validate_required(&value, field.label()).and_then(|_| {
                value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(|_| ())
                    .ok_or_else(|| anyhow::anyhow!("Loan tenure must be a whole number of months"))
            })
        }
        Field::TermsAccepted => {
            if fields.terms_accepted {
                Ok(())
            } else {
                Err(anyhow::anyhow!("You must accept the terms and conditions"))
            }
        }
    };
    result.err().map(|e| e.to_string())
}

/// Validate the declared fields of a step. Empty result means pass.
pub fn validate_fields(
    declared: &[Field],
    fields: &RegistrationFields,
    loan_bounds: (f64, f64),
) -> Vec<FieldError> {
    declared
        .iter()
        .filter_map(|&field| {
            check(field, fields, loan_bounds).map(|message| FieldError { field, message })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::steps::Step;

    const BOUNDS: (f64, f64) = (10_000.0, 5_000_000.0);

    fn filled_personal() -> RegistrationFields {
        let mut f = RegistrationFields::default();
        f.first_name = "Ada".to_string();
        f.last_name = "Obi".to_string();
        f.gender = "Female".to_string();
        f.date_of_birth = "1990-04-12".to_string();
        f.marital_status = "Single".to_string();
        f
    }

    #[test]
    fn personal_step_passes_when_filled() {
        let errors = validate_fields(Step::Personal.fields(), &filled_personal(), BOUNDS);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn personal_step_reports_each_missing_field() {
        let errors = validate_fields(
            Step::Personal.fields(),
            &RegistrationFields::default(),
            BOUNDS,
        );
        assert_eq!(errors.len(), Step::Personal.fields().len());
    }

    #[test]
    fn employer_name_required_only_for_other() {
        let mut f = RegistrationFields::default();
        f.employer = "Acme Ltd".to_string();
        f.monthly_income = "250000".to_string();
        assert!(validate_fields(Step::Employment.fields(), &f, BOUNDS).is_empty());

        f.employer = EMPLOYER_OTHER.to_string();
        let errors = validate_fields(Step::Employment.fields(), &f, BOUNDS);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::EmployerName);

        f.employer_name = "Side Hustle Ventures".to_string();
        assert!(validate_fields(Step::Employment.fields(), &f, BOUNDS).is_empty());
    }

    #[test]
    fn loan_step_checks_amount_tenure_and_terms() {
        let mut f = RegistrationFields::default();
        f.loan_amount = "100000".to_string();
        f.loan_tenure_months = "6".to_string();
        f.terms_accepted = false;
        let errors = validate_fields(Step::Loan.fields(), &f, BOUNDS);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::TermsAccepted);

        f.terms_accepted = true;
        f.loan_amount = "5".to_string();
        let errors = validate_fields(Step::Loan.fields(), &f, BOUNDS);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::LoanAmount);
    }

    #[test]
    fn validation_is_scoped_to_the_declared_fields() {
        // Phone step must not complain about untouched later fields.
        let mut f = RegistrationFields::default();
        f.phone_number = "08031234567".to_string();
        assert!(validate_fields(Step::Phone.fields(), &f, BOUNDS).is_empty());
    }
}
