// Wizard engine.
//
// Ties the sequencer, validator, side-effect dispatch, verification
// sub-flows and the persistence bridge together. All server-call failures
// are converted into `WizardError` at this boundary; nothing propagates as
// a panic into the rendering layer.

use log::{info, warn};

use crate::api::{loans, ApiError, Backend};
use crate::models::fields::Field;
use crate::models::requests::{
    CustomerUpsertRequest, EmploymentDataRequest, FinancialDataRequest, LoanApplicationRequest,
};
use crate::models::responses::BvnRecord;
use crate::models::state::{Channel, WizardState};
use crate::persistence::WizardStore;
use crate::utils::data_uri;
use crate::utils::logging::mask_identity_number;
use crate::wizard::quote;
use crate::wizard::sequencer::{JumpOutcome, Sequencer};
use crate::wizard::steps::Step;
use crate::wizard::validator::{self, FieldError};

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("{} is already registered with another account", .0.as_str())]
    Duplicate(Channel),

    #[error("the code you entered does not match; check the message we sent and try again")]
    OtpMismatch,

    #[error("no verification code is pending for this step")]
    NoOtpPending,

    #[error("no record was found for this BVN")]
    BvnNotFound,

    #[error("the selfie capture could not be read: {0}")]
    InvalidSelfie(String),

    #[error("no customer record exists yet for this session")]
    MissingCustomerId,

    #[error("another step is still being processed")]
    HandlerInFlight,

    #[error("failed to persist wizard state: {0}")]
    Storage(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of advancing (or attempting to advance) past the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step completed; the cursor moved forward.
    Advanced,
    /// An OTP was dispatched for this channel; the step advances once
    /// `submit_otp` is given the matching code.
    AwaitingOtp(Channel),
    /// The BVN record did not match the entered identity; the cursor was
    /// routed back to step 1 so the applicant can correct their details.
    BvnMismatch(BvnComparison),
    /// Final submission succeeded; persisted state has been cleared.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldComparison {
    pub entered: String,
    pub authoritative: String,
    pub matches: bool,
}

/// Field-by-field comparison between entered identity data and the BVN
/// record. Only the name fields are blocking; phone and date of birth are
/// shown for information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BvnComparison {
    pub first_name: FieldComparison,
    pub last_name: FieldComparison,
    pub phone_number: FieldComparison,
    pub date_of_birth: FieldComparison,
    pub all_matches: bool,
}

#[derive(Debug, Clone)]
struct OtpChallenge {
    channel: Channel,
    code: String,
}

pub struct WizardEngine<B: Backend> {
    api: B,
    store: WizardStore,
    state: WizardState,
    sequencer: Sequencer,
    /// In-memory only; an OTP code never touches durable storage.
    otp: Option<OtpChallenge>,
    in_flight: bool,
    loan_bounds: (f64, f64),
}

impl<B: Backend> WizardEngine<B> {
    /// Build an engine, rehydrating any session found in the store.
    pub fn new(api: B, store: WizardStore, loan_bounds: (f64, f64)) -> Result<Self, WizardError> {
        let state = store
            .load()
            .map_err(|e| WizardError::Storage(e.to_string()))?
            .unwrap_or_else(WizardState::new);
        let sequencer = Sequencer::restore(
            Step::COUNT,
            state.current_step,
            state.completed_steps.clone(),
        );
        Ok(Self {
            api,
            store,
            state,
            sequencer,
            otp: None,
            in_flight: false,
            loan_bounds,
        })
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> Step {
        // The sequencer clamps to [1, COUNT], so the index is always valid.
        Step::from_index(self.sequencer.current()).unwrap_or(Step::Personal)
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        self.sequencer.is_completed(step.index())
    }

    pub fn pending_otp(&self) -> Option<Channel> {
        self.otp.as_ref().map(|c| c.channel)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Write a field value. Invalidates verification tied to the field when
    /// the value moves away from what was verified, drops the owning step's
    /// completion mark, and mirrors the state to storage.
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), WizardError> {
        let owning = Step::owning(field).map(Step::index);
        let before = self.state.fields.get(field);
        self.state.apply_field_change(field, value, owning);
        if before != value {
            if let Some(step) = owning {
                self.sequencer.unmark_completed(step);
            }
        }
        self.persist()
    }

    /// Unconditional backward navigation.
    pub fn handle_back(&mut self) -> Result<(), WizardError> {
        self.sequencer.retreat();
        self.persist()
    }

    /// Jump to an arbitrary step. Free when the target is behind the cursor
    /// or already completed. A forward jump over unfinished work validates
    /// the *current* step and then reports `NeedsCurrentStep`: the caller
    /// must complete the current step through `handle_next` before retrying.
    pub fn jump_to(&mut self, target: usize) -> Result<JumpOutcome, WizardError> {
        match self.sequencer.jump_to(target) {
            JumpOutcome::Moved => {
                self.persist()?;
                Ok(JumpOutcome::Moved)
            }
            JumpOutcome::NeedsCurrentStep => {
                let step = self.current_step();
                let errors = validator::validate_fields(
                    step.fields(),
                    &self.state.fields,
                    self.loan_bounds,
                );
                if !errors.is_empty() {
                    return Err(WizardError::Validation(errors));
                }
                Ok(JumpOutcome::NeedsCurrentStep)
            }
        }
    }

    /// Validate the current step and run its side effect; advance on success.
    /// Only one handler may be in flight at a time.
    pub async fn handle_next(&mut self) -> Result<StepOutcome, WizardError> {
        if self.in_flight {
            return Err(WizardError::HandlerInFlight);
        }
        self.in_flight = true;
        let result = self.run_current_step().await;
        self.in_flight = false;
        result
    }

    async fn run_current_step(&mut self) -> Result<StepOutcome, WizardError> {
        let step = self.current_step();

        // A completed step whose fields have not changed since is navigable
        // without re-validation or re-running its side effect.
        if self.sequencer.is_completed(step.index()) && !self.sequencer.is_last() {
            self.sequencer.advance();
            self.persist()?;
            return Ok(StepOutcome::Advanced);
        }

        let errors =
            validator::validate_fields(step.fields(), &self.state.fields, self.loan_bounds);
        if !errors.is_empty() {
            return Err(WizardError::Validation(errors));
        }

        info!(
            "[PHASE: wizard] [STEP: {}] Dispatching step {} of {}",
            step.title(),
            step.index(),
            Step::COUNT
        );

        match step {
            Step::Personal | Step::Identity => self.advance_current(),
            Step::Phone => self.contact_step(Channel::Phone).await,
            Step::Email => self.contact_step(Channel::Email).await,
            Step::Address => self.address_step().await,
            Step::Bvn => self.bvn_step().await,
            Step::Banking => self.banking_step().await,
            Step::Employment => self.employment_step().await,
            Step::Selfie => self.selfie_step().await,
            Step::Loan => self.loan_step().await,
        }
    }

    /// Compare an entered code against the pending challenge. A match marks
    /// the channel verified for the current field value and advances.
    pub fn submit_otp(&mut self, input: &str) -> Result<StepOutcome, WizardError> {
        let Some(challenge) = self.otp.clone() else {
            return Err(WizardError::NoOtpPending);
        };
        if input.trim() != challenge.code {
            return Err(WizardError::OtpMismatch);
        }

        let value = match challenge.channel {
            Channel::Phone => self.state.fields.phone_number.clone(),
            Channel::Email => self.state.fields.email.clone(),
            Channel::Bvn => self.state.fields.bvn.clone(),
        };
        self.state
            .verification
            .channel_mut(challenge.channel)
            .mark_verified(&value);
        self.otp = None;

        info!(
            "[PHASE: wizard] [STEP: otp] Channel {} verified",
            challenge.channel.as_str()
        );
        self.advance_current()
    }

    /// Drop all session state, in memory and on disk.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        self.store
            .clear()
            .map_err(|e| WizardError::Storage(e.to_string()))?;
        self.state = WizardState::new();
        self.sequencer = Sequencer::new(Step::COUNT);
        self.otp = None;
        Ok(())
    }

    // =========================
    // Step handlers
    // =========================

    /// Phone/email: duplicate check, then OTP dispatch. Skipped entirely
    /// when the channel is already verified for the current value.
    async fn contact_step(&mut self, channel: Channel) -> Result<StepOutcome, WizardError> {
        let value = match channel {
            Channel::Phone => self.state.fields.phone_number.clone(),
            Channel::Email => self.state.fields.email.clone(),
            Channel::Bvn => unreachable!("BVN has its own handler"),
        };

        if self.state.verification.channel(channel).is_verified_for(&value) {
            return self.advance_current();
        }

        // Duplicate check fails open: a transport or server error must not
        // block a legitimate applicant, so it is treated as "not duplicate".
        let exists = match channel {
            Channel::Phone => self.api.phone_exists(&value).await,
            Channel::Email => self.api.email_exists(&value).await,
            Channel::Bvn => unreachable!(),
        };
        match exists {
            Ok(true) => return Err(WizardError::Duplicate(channel)),
            Ok(false) => {}
            Err(e) => {
                warn!(
                    "[PHASE: wizard] [STEP: duplicate_check] {} duplicate check failed open: {}",
                    channel.as_str(),
                    e
                );
            }
        }

        let code = self.api.generate_otp().await?;
        match channel {
            Channel::Phone => self.api.send_otp_sms(&value, &code).await?,
            Channel::Email => self.api.send_otp_email(&value, &code).await?,
            Channel::Bvn => unreachable!(),
        }
        self.otp = Some(OtpChallenge { channel, code });
        Ok(StepOutcome::AwaitingOtp(channel))
    }

    /// Create the customer record on first pass, update it afterwards. The
    /// customer id is immutable once set; a create response without an id is
    /// a failure even when the HTTP call succeeded.
    async fn address_step(&mut self) -> Result<StepOutcome, WizardError> {
        let req = self.customer_payload();
        match self.state.server_linkage.customer_id.clone() {
            Some(id) => {
                self.api.update_customer(&id, &req).await?;
            }
            None => {
                let created = self.api.create_customer(&req).await?;
                let id = created
                    .id
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        ApiError::Protocol("customer create response carried no id".to_string())
                    })?;
                info!(
                    "[PHASE: wizard] [STEP: customer] Customer record created (customer_id={})",
                    id
                );
                self.state.server_linkage.customer_id = Some(id);
            }
        }
        self.advance_current()
    }

    async fn bvn_step(&mut self) -> Result<StepOutcome, WizardError> {
        let bvn = self.state.fields.bvn.clone();
        if self.state.verification.bvn.is_verified_for(&bvn) {
            return self.advance_current();
        }

        let record = self
            .api
            .lookup_bvn(&bvn)
            .await?
            .ok_or(WizardError::BvnNotFound)?;
        let comparison = compare_bvn(&self.state.fields, &record);

        if comparison.all_matches {
            self.state.verification.bvn.mark_verified(&bvn);
            info!(
                "[PHASE: wizard] [STEP: bvn] BVN verified (bvn={})",
                mask_identity_number(&bvn)
            );
            return self.advance_current();
        }

        // Mismatch policy: the identity fields, not the BVN, are assumed to
        // be at fault. The applicant is routed back to step 1 to correct
        // them rather than retrying the lookup in place.
        warn!(
            "[PHASE: wizard] [STEP: bvn] BVN record mismatch, routing back to step 1 (bvn={})",
            mask_identity_number(&bvn)
        );
        self.sequencer.force_jump(Step::Personal.index());
        self.persist()?;
        Ok(StepOutcome::BvnMismatch(comparison))
    }

    async fn banking_step(&mut self) -> Result<StepOutcome, WizardError> {
        let customer_id = self.require_customer_id()?;
        if self.state.server_linkage.financial_data_saved {
            return self.advance_current();
        }
        let req = FinancialDataRequest {
            bank_name: self.state.fields.bank_name.clone(),
            account_number: self.state.fields.account_number.clone(),
            account_name: self.state.fields.account_name.clone(),
            bvn: self.state.fields.bvn.clone(),
        };
        self.api.save_financial_data(&customer_id, &req).await?;
        self.state.server_linkage.financial_data_saved = true;
        self.advance_current()
    }

    async fn employment_step(&mut self) -> Result<StepOutcome, WizardError> {
        let customer_id = self.require_customer_id()?;
        if self.state.server_linkage.employment_data_saved {
            return self.advance_current();
        }
        let employer = if self.state.fields.employer.trim() == validator::EMPLOYER_OTHER {
            self.state.fields.employer_name.clone()
        } else {
            self.state.fields.employer.clone()
        };
        let req = EmploymentDataRequest {
            employer,
            monthly_income: self.state.fields.monthly_income.clone(),
        };
        self.api.save_employment_data(&customer_id, &req).await?;
        self.state.server_linkage.employment_data_saved = true;
        self.advance_current()
    }

    async fn selfie_step(&mut self) -> Result<StepOutcome, WizardError> {
        let customer_id = self.require_customer_id()?;
        if self.state.server_linkage.selfie_saved {
            return self.advance_current();
        }
        let (mime, bytes) = data_uri::decode(&self.state.fields.selfie_data_uri)
            .map_err(|e| WizardError::InvalidSelfie(e.to_string()))?;
        self.api
            .upload_profile_picture(&customer_id, bytes, &mime)
            .await?;
        self.state.server_linkage.selfie_saved = true;
        self.advance_current()
    }

    async fn loan_step(&mut self) -> Result<StepOutcome, WizardError> {
        let customer_id = self.require_customer_id()?;

        // Validation already guaranteed these parse; keep the fallback
        // errors named anyway so a failure here is still actionable.
        let principal: f64 = self.state.fields.loan_amount.trim().parse().map_err(|_| {
            WizardError::Validation(vec![FieldError {
                field: Field::LoanAmount,
                message: "Loan amount must be a number".to_string(),
            }])
        })?;
        let months: u32 = self
            .state
            .fields
            .loan_tenure_months
            .trim()
            .parse()
            .map_err(|_| {
                WizardError::Validation(vec![FieldError {
                    field: Field::LoanTenureMonths,
                    message: "Loan tenure must be a whole number of months".to_string(),
                }])
            })?;

        let daily_rate = loans::daily_interest_rate(&self.api).await;
        let q = quote::compute(principal, daily_rate, months);

        let req = LoanApplicationRequest {
            customer_id,
            amount: q.principal,
            currency: "NGN".to_string(),
            interest_rate: daily_rate,
            installment_amount: q.installment,
            duration_months: q.duration_months,
            comment: format!(
                "Onboarding application: {} months at {}%/day, total {}",
                q.duration_months, daily_rate, q.total_amount
            ),
        };
        self.api.submit_loan_application(&req).await?;

        self.sequencer.advance();
        // Persisted state is cleared only now, on final success.
        self.store
            .clear()
            .map_err(|e| WizardError::Storage(e.to_string()))?;
        info!("[PHASE: wizard] [STEP: loan] Loan application submitted, session cleared");
        Ok(StepOutcome::Finished)
    }

    // =========================
    // Internals
    // =========================

    fn advance_current(&mut self) -> Result<StepOutcome, WizardError> {
        self.sequencer.advance();
        self.persist()?;
        Ok(StepOutcome::Advanced)
    }

    fn require_customer_id(&self) -> Result<String, WizardError> {
        self.state
            .server_linkage
            .customer_id
            .clone()
            .ok_or(WizardError::MissingCustomerId)
    }

    fn customer_payload(&self) -> CustomerUpsertRequest {
        let f = &self.state.fields;
        CustomerUpsertRequest {
            first_name: f.first_name.trim().to_string(),
            last_name: f.last_name.trim().to_string(),
            gender: f.gender.trim().to_string(),
            date_of_birth: f.date_of_birth.trim().to_string(),
            marital_status: f.marital_status.trim().to_string(),
            phone_number: f.phone_number.trim().to_string(),
            email: f.email.trim().to_string(),
            nin: f.nin.trim().to_string(),
            street_address: f.street_address.trim().to_string(),
            city: f.city.trim().to_string(),
            state: f.state.trim().to_string(),
        }
    }

    fn persist(&mut self) -> Result<(), WizardError> {
        self.state.current_step = self.sequencer.current();
        self.state.completed_steps = self.sequencer.completed().clone();
        self.store
            .save(&self.state)
            .map_err(|e| WizardError::Storage(e.to_string()))
    }
}

fn text_matches(entered: &str, authoritative: &str) -> bool {
    entered.trim().eq_ignore_ascii_case(authoritative.trim())
}

fn compare_bvn(
    fields: &crate::models::fields::RegistrationFields,
    record: &BvnRecord,
) -> BvnComparison {
    let first_name = FieldComparison {
        entered: fields.first_name.clone(),
        authoritative: record.first_name.clone(),
        matches: text_matches(&fields.first_name, &record.first_name),
    };
    let last_name = FieldComparison {
        entered: fields.last_name.clone(),
        authoritative: record.last_name.clone(),
        matches: text_matches(&fields.last_name, &record.last_name),
    };
    let record_phone = record.phone_number.clone().unwrap_or_default();
    let phone_number = FieldComparison {
        entered: fields.phone_number.clone(),
        authoritative: record_phone.clone(),
        matches: text_matches(&fields.phone_number, &record_phone),
    };
    let record_dob = record.date_of_birth.clone().unwrap_or_default();
    let date_of_birth = FieldComparison {
        entered: fields.date_of_birth.clone(),
        authoritative: record_dob.clone(),
        matches: text_matches(&fields.date_of_birth, &record_dob),
    };

    // Only the name fields block; phone/DOB mismatches are shown but tolerated.
    let all_matches = first_name.matches && last_name.matches;
    BvnComparison {
        first_name,
        last_name,
        phone_number,
        date_of_birth,
        all_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::responses::{CustomerResponse, LoanApplicationResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    const BOUNDS: (f64, f64) = (10_000.0, 5_000_000.0);

    /// In-memory backend with adjustable behavior per scenario.
    #[derive(Default)]
    struct FakeBackend {
        phone_duplicate: Option<Result<bool, ()>>,
        email_duplicate: Option<Result<bool, ()>>,
        bvn_record: Mutex<Option<BvnRecord>>,
        otp_code: String,
        create_calls: AtomicUsize,
        update_calls: AtomicUsize,
        loan_requests: Mutex<Vec<LoanApplicationRequest>>,
        uploaded_pictures: Mutex<Vec<(String, usize, String)>>,
        daily_rate_param: Option<String>,
    }

    impl FakeBackend {
        fn happy() -> Self {
            Self {
                phone_duplicate: Some(Ok(false)),
                email_duplicate: Some(Ok(false)),
                bvn_record: Mutex::new(Some(BvnRecord {
                    first_name: "Ada".to_string(),
                    last_name: "Obi".to_string(),
                    phone_number: Some("08031234567".to_string()),
                    date_of_birth: Some("1990-04-12".to_string()),
                })),
                otp_code: "123456".to_string(),
                daily_rate_param: Some("0.5".to_string()),
                ..Default::default()
            }
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn create_customer(
            &self,
            _req: &CustomerUpsertRequest,
        ) -> Result<CustomerResponse, ApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CustomerResponse {
                id: Some("cus_123".to_string()),
                first_name: None,
                last_name: None,
                phone_number: None,
                email: None,
            })
        }

        async fn update_customer(
            &self,
            _customer_id: &str,
            _req: &CustomerUpsertRequest,
        ) -> Result<CustomerResponse, ApiError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CustomerResponse {
                id: Some("cus_123".to_string()),
                first_name: None,
                last_name: None,
                phone_number: None,
                email: None,
            })
        }

        async fn save_financial_data(
            &self,
            _customer_id: &str,
            _req: &FinancialDataRequest,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn save_employment_data(
            &self,
            _customer_id: &str,
            _req: &EmploymentDataRequest,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn upload_profile_picture(
            &self,
            customer_id: &str,
            image: Vec<u8>,
            mime_type: &str,
        ) -> Result<(), ApiError> {
            self.uploaded_pictures.lock().unwrap().push((
                customer_id.to_string(),
                image.len(),
                mime_type.to_string(),
            ));
            Ok(())
        }

        async fn lookup_bvn(&self, _bvn: &str) -> Result<Option<BvnRecord>, ApiError> {
            Ok(self.bvn_record.lock().unwrap().clone())
        }

        async fn generate_otp(&self) -> Result<String, ApiError> {
            Ok(self.otp_code.clone())
        }

        async fn send_otp_sms(&self, _phone: &str, _code: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn send_otp_email(&self, _email: &str, _code: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn phone_exists(&self, _phone: &str) -> Result<bool, ApiError> {
            match self.phone_duplicate {
                Some(Ok(v)) => Ok(v),
                Some(Err(())) => Err(server_error()),
                None => Ok(false),
            }
        }

        async fn email_exists(&self, _email: &str) -> Result<bool, ApiError> {
            match self.email_duplicate {
                Some(Ok(v)) => Ok(v),
                Some(Err(())) => Err(server_error()),
                None => Ok(false),
            }
        }

        async fn get_system_parameter(&self, name: &str) -> Result<Option<String>, ApiError> {
            if name == loans::PARAM_DAILY_RATE {
                Ok(self.daily_rate_param.clone())
            } else {
                Ok(None)
            }
        }

        async fn submit_loan_application(
            &self,
            req: &LoanApplicationRequest,
        ) -> Result<LoanApplicationResponse, ApiError> {
            self.loan_requests.lock().unwrap().push(req.clone());
            Ok(LoanApplicationResponse {
                id: Some("loan_1".to_string()),
                status: Some("pending".to_string()),
            })
        }
    }

    fn engine_with(
        api: FakeBackend,
        dir: &std::path::Path,
    ) -> WizardEngine<FakeBackend> {
        WizardEngine::new(api, WizardStore::new(dir), BOUNDS).unwrap()
    }

    fn fill_identity(engine: &mut WizardEngine<FakeBackend>) {
        engine.set_field(Field::FirstName, "Ada").unwrap();
        engine.set_field(Field::LastName, "Obi").unwrap();
        engine.set_field(Field::Gender, "Female").unwrap();
        engine.set_field(Field::DateOfBirth, "1990-04-12").unwrap();
        engine.set_field(Field::MaritalStatus, "Single").unwrap();
    }

    fn fill_address(engine: &mut WizardEngine<FakeBackend>) {
        engine
            .set_field(Field::StreetAddress, "12 Marina Road")
            .unwrap();
        engine.set_field(Field::City, "Lagos").unwrap();
        engine.set_field(Field::State, "Lagos").unwrap();
    }

    /// Drive a fresh engine through steps 1-5 (identity through customer
    /// creation), verifying phone and email by OTP along the way.
    async fn advance_to_bvn(engine: &mut WizardEngine<FakeBackend>) {
        fill_identity(engine);
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);

        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();
        assert_eq!(
            engine.handle_next().await.unwrap(),
            StepOutcome::AwaitingOtp(Channel::Phone)
        );
        assert_eq!(engine.submit_otp("123456").unwrap(), StepOutcome::Advanced);

        engine.set_field(Field::Email, "ada@example.com").unwrap();
        assert_eq!(
            engine.handle_next().await.unwrap(),
            StepOutcome::AwaitingOtp(Channel::Email)
        );
        assert_eq!(engine.submit_otp("123456").unwrap(), StepOutcome::Advanced);

        engine.set_field(Field::Nin, "12345678901").unwrap();
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);

        fill_address(engine);
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);
        assert_eq!(engine.current_step(), Step::Bvn);
    }

    #[tokio::test]
    async fn advance_requires_validation_to_pass() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());

        let err = engine.handle_next().await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(engine.current_step(), Step::Personal);

        fill_identity(&mut engine);
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);
        assert_eq!(engine.current_step(), Step::Phone);
    }

    #[tokio::test]
    async fn duplicate_phone_blocks_the_step() {
        let dir = tempdir().unwrap();
        let api = FakeBackend {
            phone_duplicate: Some(Ok(true)),
            ..FakeBackend::happy()
        };
        let mut engine = engine_with(api, dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();
        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();

        let err = engine.handle_next().await.unwrap_err();
        assert!(matches!(err, WizardError::Duplicate(Channel::Phone)));
        assert_eq!(engine.current_step(), Step::Phone);
    }

    #[tokio::test]
    async fn duplicate_check_fails_open_on_server_error() {
        let dir = tempdir().unwrap();
        let api = FakeBackend {
            phone_duplicate: Some(Err(())),
            ..FakeBackend::happy()
        };
        let mut engine = engine_with(api, dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();
        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();

        // The failed check is treated as "not duplicate"; OTP dispatch
        // proceeds.
        assert_eq!(
            engine.handle_next().await.unwrap(),
            StepOutcome::AwaitingOtp(Channel::Phone)
        );
    }

    #[tokio::test]
    async fn otp_mismatch_keeps_the_step_and_challenge() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();
        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();
        engine.handle_next().await.unwrap();

        let err = engine.submit_otp("000000").unwrap_err();
        assert!(matches!(err, WizardError::OtpMismatch));
        assert_eq!(engine.current_step(), Step::Phone);

        // Retry with the right code still works.
        assert_eq!(engine.submit_otp("123456").unwrap(), StepOutcome::Advanced);
        assert!(engine.state().verification.phone.verified);
        assert_eq!(
            engine.state().verification.phone.verified_value,
            "08031234567"
        );
    }

    #[tokio::test]
    async fn verified_unchanged_phone_skips_otp_on_revisit() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();
        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();
        engine.handle_next().await.unwrap();
        engine.submit_otp("123456").unwrap();

        // Back to the phone step: no new OTP, straight advance.
        engine.handle_back().unwrap();
        assert_eq!(engine.current_step(), Step::Phone);
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);
    }

    #[tokio::test]
    async fn changed_phone_invalidates_verification_and_requires_new_otp() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();
        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();
        engine.handle_next().await.unwrap();
        engine.submit_otp("123456").unwrap();

        engine.handle_back().unwrap();
        engine.set_field(Field::PhoneNumber, "08099887766").unwrap();
        assert!(!engine.state().verification.phone.verified);
        assert_eq!(
            engine.handle_next().await.unwrap(),
            StepOutcome::AwaitingOtp(Channel::Phone)
        );
    }

    #[tokio::test]
    async fn customer_is_created_once_then_updated() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        advance_to_bvn(&mut engine).await;
        assert_eq!(
            engine.state().server_linkage.customer_id.as_deref(),
            Some("cus_123")
        );
        assert_eq!(engine.api.create_calls.load(Ordering::SeqCst), 1);

        // Back to the address step and forward again with a change: the
        // update path runs, never a second create.
        engine.jump_to(Step::Address.index()).unwrap();
        engine.set_field(Field::City, "Ibadan").unwrap();
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);
        assert_eq!(engine.api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.api.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bvn_match_is_case_insensitive_and_advances() {
        let dir = tempdir().unwrap();
        let api = FakeBackend::happy();
        *api.bvn_record.lock().unwrap() = Some(BvnRecord {
            first_name: "ADA".to_string(),
            last_name: "obi".to_string(),
            phone_number: Some("08030000000".to_string()), // informational only
            date_of_birth: None,
        });
        let mut engine = engine_with(api, dir.path());
        advance_to_bvn(&mut engine).await;

        engine.set_field(Field::Bvn, "12345678901").unwrap();
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Advanced);
        assert_eq!(engine.current_step(), Step::Banking);
        assert!(engine.state().verification.bvn.verified);
    }

    #[tokio::test]
    async fn bvn_name_mismatch_routes_to_step_one() {
        let dir = tempdir().unwrap();
        let api = FakeBackend::happy();
        *api.bvn_record.lock().unwrap() = Some(BvnRecord {
            first_name: "Ngozi".to_string(),
            last_name: "Obi".to_string(),
            phone_number: Some("08031234567".to_string()),
            date_of_birth: Some("1990-04-12".to_string()),
        });
        let mut engine = engine_with(api, dir.path());
        advance_to_bvn(&mut engine).await;

        engine.set_field(Field::Bvn, "12345678901").unwrap();
        match engine.handle_next().await.unwrap() {
            StepOutcome::BvnMismatch(cmp) => {
                assert!(!cmp.all_matches);
                assert!(!cmp.first_name.matches);
                assert!(cmp.last_name.matches);
            }
            other => panic!("expected BvnMismatch, got {:?}", other),
        }
        assert_eq!(engine.current_step(), Step::Personal);
    }

    #[tokio::test]
    async fn bvn_not_found_is_an_error_and_stays_put() {
        let dir = tempdir().unwrap();
        let api = FakeBackend::happy();
        *api.bvn_record.lock().unwrap() = None;
        let mut engine = engine_with(api, dir.path());
        advance_to_bvn(&mut engine).await;

        engine.set_field(Field::Bvn, "12345678901").unwrap();
        let err = engine.handle_next().await.unwrap_err();
        assert!(matches!(err, WizardError::BvnNotFound));
        assert_eq!(engine.current_step(), Step::Bvn);
    }

    #[tokio::test]
    async fn full_run_submits_exact_loan_economics_and_clears_state() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        advance_to_bvn(&mut engine).await;

        engine.set_field(Field::Bvn, "12345678901").unwrap();
        engine.handle_next().await.unwrap();

        engine.set_field(Field::BankName, "First Bank").unwrap();
        engine.set_field(Field::AccountNumber, "0123456789").unwrap();
        engine.set_field(Field::AccountName, "Ada Obi").unwrap();
        engine.handle_next().await.unwrap();

        engine.set_field(Field::Employer, "Acme Ltd").unwrap();
        engine.set_field(Field::MonthlyIncome, "250000").unwrap();
        engine.handle_next().await.unwrap();

        let selfie = crate::utils::data_uri::encode("image/jpeg", &[0xFF, 0xD8, 0xFF]);
        engine.set_field(Field::SelfieDataUri, &selfie).unwrap();
        engine.handle_next().await.unwrap();
        assert!(engine.state().server_linkage.selfie_saved);
        assert_eq!(
            engine.api.uploaded_pictures.lock().unwrap()[0],
            ("cus_123".to_string(), 3, "image/jpeg".to_string())
        );

        engine.set_field(Field::LoanAmount, "100000").unwrap();
        engine.set_field(Field::LoanTenureMonths, "6").unwrap();
        engine.set_field(Field::TermsAccepted, "true").unwrap();
        assert_eq!(engine.handle_next().await.unwrap(), StepOutcome::Finished);

        let submitted = engine.api.loan_requests.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let req = &submitted[0];
        assert_eq!(req.customer_id, "cus_123");
        assert_eq!(req.amount, 100_000.0);
        assert_eq!(req.currency, "NGN");
        assert_eq!(req.interest_rate, 0.5);
        assert_eq!(req.installment_amount, 31_666.67);
        assert_eq!(req.duration_months, 6);
        drop(submitted);

        // Persisted state is gone after the final success.
        assert!(WizardStore::new(dir.path()).load().unwrap().is_none());
    }

    #[tokio::test]
    async fn unparseable_loan_numbers_surface_as_named_field_errors() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        engine.state.server_linkage.customer_id = Some("cus_123".to_string());
        engine.state.fields.loan_amount = "one hundred".to_string();
        engine.state.fields.loan_tenure_months = "6".to_string();

        match engine.loan_step().await.unwrap_err() {
            WizardError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, Field::LoanAmount);
                assert!(!errors[0].message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }

        engine.state.fields.loan_amount = "100000".to_string();
        engine.state.fields.loan_tenure_months = "six".to_string();
        match engine.loan_step().await.unwrap_err() {
            WizardError::Validation(errors) => {
                assert_eq!(errors[0].field, Field::LoanTenureMonths);
                assert!(!errors[0].message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine.api.loan_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_restores_step_fields_and_verification() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        advance_to_bvn(&mut engine).await;
        let before = engine.state().clone();
        drop(engine);

        // Simulated reload: a brand-new engine over the same storage.
        let engine = engine_with(FakeBackend::happy(), dir.path());
        assert_eq!(engine.current_step(), Step::Bvn);
        assert_eq!(engine.state(), &before);
        assert!(engine.state().verification.phone.verified);
        assert!(engine.state().verification.email.verified);
    }

    #[tokio::test]
    async fn jump_ahead_over_unfinished_work_needs_current_step() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();

        // Phone step is empty: the forward jump fails validation.
        let err = engine.jump_to(Step::Address.index()).unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));

        engine.set_field(Field::PhoneNumber, "08031234567").unwrap();
        assert_eq!(
            engine.jump_to(Step::Address.index()).unwrap(),
            JumpOutcome::NeedsCurrentStep
        );
        // Backward jump is always free.
        assert_eq!(engine.jump_to(1).unwrap(), JumpOutcome::Moved);
        assert_eq!(engine.current_step(), Step::Personal);
    }

    #[tokio::test]
    async fn reset_clears_memory_and_disk() {
        let dir = tempdir().unwrap();
        let mut engine = engine_with(FakeBackend::happy(), dir.path());
        fill_identity(&mut engine);
        engine.handle_next().await.unwrap();

        engine.reset().unwrap();
        assert_eq!(engine.current_step(), Step::Personal);
        assert!(engine.state().fields.first_name.is_empty());
        assert!(WizardStore::new(dir.path()).load().unwrap().is_none());
    }
}
