// Wizard step table.
//
// Each step declares the fields it owns; the validator and the dispatcher
// are both driven off this table so adding a step cannot silently miss a
// branch (match exhaustiveness covers every variant).

use crate::models::fields::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Personal,
    Phone,
    Email,
    Identity,
    Address,
    Bvn,
    Banking,
    Employment,
    Selfie,
    Loan,
}

impl Step {
    pub const ALL: [Step; 10] = [
        Step::Personal,
        Step::Phone,
        Step::Email,
        Step::Identity,
        Step::Address,
        Step::Bvn,
        Step::Banking,
        Step::Employment,
        Step::Selfie,
        Step::Loan,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// 1-based index, matching `WizardState::current_step`.
    pub fn index(self) -> usize {
        match self {
            Step::Personal => 1,
            Step::Phone => 2,
            Step::Email => 3,
            Step::Identity => 4,
            Step::Address => 5,
            Step::Bvn => 6,
            Step::Banking => 7,
            Step::Employment => 8,
            Step::Selfie => 9,
            Step::Loan => 10,
        }
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Step::ALL.get(index.checked_sub(1)?).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Personal => "Personal details",
            Step::Phone => "Phone number",
            Step::Email => "Email address",
            Step::Identity => "Identity (NIN)",
            Step::Address => "Home address",
            Step::Bvn => "BVN verification",
            Step::Banking => "Banking details",
            Step::Employment => "Employment",
            Step::Selfie => "Selfie capture",
            Step::Loan => "Loan application",
        }
    }

    /// Fields validated (and, where applicable, submitted) for this step.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Step::Personal => &[
                Field::FirstName,
                Field::LastName,
                Field::Gender,
                Field::DateOfBirth,
                Field::MaritalStatus,
            ],
            Step::Phone => &[Field::PhoneNumber],
            Step::Email => &[Field::Email],
            Step::Identity => &[Field::Nin],
            Step::Address => &[Field::StreetAddress, Field::City, Field::State],
            Step::Bvn => &[Field::Bvn],
            Step::Banking => &[Field::BankName, Field::AccountNumber, Field::AccountName],
            Step::Employment => &[Field::Employer, Field::EmployerName, Field::MonthlyIncome],
            Step::Selfie => &[Field::SelfieDataUri],
            Step::Loan => &[
                Field::LoanAmount,
                Field::LoanTenureMonths,
                Field::TermsAccepted,
            ],
        }
    }

    /// The step an individual field belongs to (used to drop completion
    /// marks when a field changes after the fact).
    pub fn owning(field: Field) -> Option<Step> {
        Step::ALL
            .iter()
            .copied()
            .find(|s| s.fields().contains(&field))
    }

    /// Whether advancing past this step involves a server call.
    pub fn has_side_effect(self) -> bool {
        !matches!(self, Step::Personal | Step::Identity)
    }
}
