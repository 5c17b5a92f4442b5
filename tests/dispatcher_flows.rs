// End-to-end dispatcher flows against a mock lending backend.
//
// The in-process engine tests use a fake backend; these exercise the real
// HTTP client (envelope unwrapping, multipart upload, fallbacks) through
// the wizard where it matters.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use onboarding_wizard::api::{ApiClient, ApiError};
use onboarding_wizard::config::ApiSettings;
use onboarding_wizard::models::fields::Field;
use onboarding_wizard::persistence::WizardStore;
use onboarding_wizard::wizard::{quote, Step, StepOutcome, WizardEngine};

const LOAN_BOUNDS: (f64, f64) = (10_000.0, 5_000_000.0);

fn client_for(server: &ServerGuard) -> ApiClient {
    let settings = ApiSettings {
        base_url: server.url(),
        timeout_secs: 5,
    };
    ApiClient::new(&settings).unwrap()
}

fn engine_for(server: &ServerGuard, dir: &TempDir) -> WizardEngine<ApiClient> {
    let store = WizardStore::new(dir.path().to_path_buf());
    WizardEngine::new(client_for(server), store, LOAN_BOUNDS).unwrap()
}

fn envelope(data: serde_json::Value) -> String {
    json!({ "success": true, "data": data }).to_string()
}

fn set_all(engine: &mut WizardEngine<ApiClient>, values: &[(Field, &str)]) {
    for (field, value) in values {
        engine.set_field(*field, value).unwrap();
    }
}

#[tokio::test]
async fn customer_is_created_on_first_address_pass_and_updated_on_the_next() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let phone_dup = server
        .mock("GET", "/customers/duplicate/phone/08031234567")
        .with_body(envelope(json!({ "exists": false })))
        .create_async()
        .await;
    let email_dup = server
        .mock("GET", "/customers/duplicate/email/ada@example.com")
        .with_body(envelope(json!({ "exists": false })))
        .create_async()
        .await;
    let otp_generate = server
        .mock("POST", "/otp/generate")
        .with_body(envelope(json!({ "code": "123456" })))
        .expect(2)
        .create_async()
        .await;
    let otp_sms = server
        .mock("POST", "/otp/send-sms")
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;
    let otp_email = server
        .mock("POST", "/otp/send-email")
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;
    let create = server
        .mock("POST", "/customers")
        .match_body(Matcher::PartialJson(json!({
            "firstName": "Ada",
            "lastName": "Obi",
            "phoneNumber": "08031234567",
            "email": "ada@example.com",
            "city": "Lagos",
        })))
        .with_body(envelope(json!({ "id": "cust-1" })))
        .expect(1)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/customers/cust-1")
        .match_body(Matcher::PartialJson(json!({ "city": "Ibadan" })))
        .with_body(envelope(json!({ "id": "cust-1" })))
        .expect(1)
        .create_async()
        .await;

    let mut engine = engine_for(&server, &dir);
    set_all(
        &mut engine,
        &[
            (Field::FirstName, "Ada"),
            (Field::LastName, "Obi"),
            (Field::Gender, "Female"),
            (Field::DateOfBirth, "1990-04-12"),
            (Field::MaritalStatus, "Single"),
            (Field::PhoneNumber, "08031234567"),
            (Field::Email, "ada@example.com"),
            (Field::Nin, "12345678901"),
            (Field::StreetAddress, "1 Marina Road"),
            (Field::City, "Lagos"),
            (Field::State, "Lagos"),
        ],
    );

    // Personal details: no side effect.
    assert!(matches!(
        engine.handle_next().await.unwrap(),
        StepOutcome::Advanced
    ));

    // Phone and email each run the OTP round trip.
    for _ in 0..2 {
        assert!(matches!(
            engine.handle_next().await.unwrap(),
            StepOutcome::AwaitingOtp(_)
        ));
        assert!(matches!(
            engine.submit_otp("123456").unwrap(),
            StepOutcome::Advanced
        ));
    }

    // Identity, then address: the address pass creates the customer.
    assert!(matches!(
        engine.handle_next().await.unwrap(),
        StepOutcome::Advanced
    ));
    assert!(matches!(
        engine.handle_next().await.unwrap(),
        StepOutcome::Advanced
    ));
    assert_eq!(engine.current_step(), Step::Bvn);
    assert_eq!(
        engine.state().server_linkage.customer_id.as_deref(),
        Some("cust-1")
    );

    // Edit the address and re-run the step: same customer, now updated.
    engine.handle_back().unwrap();
    engine.set_field(Field::City, "Ibadan").unwrap();
    assert!(matches!(
        engine.handle_next().await.unwrap(),
        StepOutcome::Advanced
    ));

    phone_dup.assert_async().await;
    email_dup.assert_async().await;
    otp_generate.assert_async().await;
    otp_sms.assert_async().await;
    otp_email.assert_async().await;
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn rejected_envelope_surfaces_the_backend_reason() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/customers/duplicate/phone/08031234567")
        .with_body(json!({ "success": false, "error": "rate limited" }).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.phone_exists("08031234567").await.unwrap_err();
    match err {
        ApiError::Rejected(reason) => assert_eq!(reason, "rate limited"),
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn selfie_upload_is_multipart_and_tolerates_a_bare_ack() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/customers/cust-1/picture")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .upload_profile_picture("cust-1", vec![0xFF, 0xD8, 0xFF], "image/jpeg")
        .await
        .unwrap();
    upload.assert_async().await;
}

#[tokio::test]
async fn bvn_lookup_not_found_maps_to_none() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/verification/bvn")
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server);
    let record = client.lookup_bvn("12345678901").await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn parameter_outage_falls_back_to_default_economics() {
    let mut server = Server::new_async().await;
    let _rate = server
        .mock("GET", "/parameters/loanInterestRate")
        .with_status(500)
        .create_async()
        .await;
    let _tenures = server
        .mock("GET", "/parameters/loanTenureOptions")
        .with_body(envelope(json!({
            "name": "loanTenureOptions",
            "value": "3, 6, 12"
        })))
        .create_async()
        .await;

    let client = client_for(&server);
    assert_eq!(
        onboarding_wizard::api::loans::daily_interest_rate(&client).await,
        0.5
    );
    assert_eq!(
        onboarding_wizard::api::loans::tenure_options(&client).await,
        vec!["3", "6", "12"]
    );
}

#[tokio::test]
async fn loan_submission_carries_the_computed_economics() {
    let mut server = Server::new_async().await;
    let submit = server
        .mock("POST", "/loans")
        .match_body(Matcher::PartialJson(json!({
            "customerId": "cust-1",
            "amount": 100000.0,
            "currency": "NGN",
            "interestRate": 0.5,
            "installmentAmount": 31666.67,
            "durationMonths": 6,
        })))
        .with_body(envelope(json!({ "id": "loan-1", "status": "PENDING" })))
        .create_async()
        .await;

    let client = client_for(&server);
    let q = quote::compute(100_000.0, 0.5, 6);
    let req = onboarding_wizard::models::requests::LoanApplicationRequest {
        customer_id: "cust-1".to_string(),
        amount: q.principal,
        currency: "NGN".to_string(),
        interest_rate: 0.5,
        installment_amount: q.installment,
        duration_months: q.duration_months,
        comment: "6-month loan requested via onboarding".to_string(),
    };
    let response = client.submit_loan_application(&req).await.unwrap();
    assert_eq!(response.id.as_deref(), Some("loan-1"));
    submit.assert_async().await;
}
