pub mod client;
pub mod customers;
pub mod loans;
pub mod verification;

pub use client::{ApiClient, ApiError};

use async_trait::async_trait;

use crate::models::requests::{
    CustomerUpsertRequest, EmploymentDataRequest, FinancialDataRequest, LoanApplicationRequest,
};
use crate::models::responses::{BvnRecord, CustomerResponse, LoanApplicationResponse};

/// Seam between the wizard engine and the lending backend.
///
/// The engine only ever talks to this trait, so engine-level tests can run
/// against an in-memory fake while integration tests exercise the real
/// `ApiClient` over HTTP.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_customer(
        &self,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError>;

    async fn update_customer(
        &self,
        customer_id: &str,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError>;

    async fn save_financial_data(
        &self,
        customer_id: &str,
        req: &FinancialDataRequest,
    ) -> Result<(), ApiError>;

    async fn save_employment_data(
        &self,
        customer_id: &str,
        req: &EmploymentDataRequest,
    ) -> Result<(), ApiError>;

    async fn upload_profile_picture(
        &self,
        customer_id: &str,
        image: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), ApiError>;

    async fn lookup_bvn(&self, bvn: &str) -> Result<Option<BvnRecord>, ApiError>;

    async fn generate_otp(&self) -> Result<String, ApiError>;

    async fn send_otp_sms(&self, phone_number: &str, code: &str) -> Result<(), ApiError>;

    async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), ApiError>;

    async fn phone_exists(&self, phone_number: &str) -> Result<bool, ApiError>;

    async fn email_exists(&self, email: &str) -> Result<bool, ApiError>;

    async fn get_system_parameter(&self, name: &str) -> Result<Option<String>, ApiError>;

    async fn submit_loan_application(
        &self,
        req: &LoanApplicationRequest,
    ) -> Result<LoanApplicationResponse, ApiError>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn create_customer(
        &self,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError> {
        ApiClient::create_customer(self, req).await
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError> {
        ApiClient::update_customer(self, customer_id, req).await
    }

    async fn save_financial_data(
        &self,
        customer_id: &str,
        req: &FinancialDataRequest,
    ) -> Result<(), ApiError> {
        ApiClient::save_financial_data(self, customer_id, req).await
    }

    async fn save_employment_data(
        &self,
        customer_id: &str,
        req: &EmploymentDataRequest,
    ) -> Result<(), ApiError> {
        ApiClient::save_employment_data(self, customer_id, req).await
    }

    async fn upload_profile_picture(
        &self,
        customer_id: &str,
        image: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), ApiError> {
        ApiClient::upload_profile_picture(self, customer_id, image, mime_type).await
    }

    async fn lookup_bvn(&self, bvn: &str) -> Result<Option<BvnRecord>, ApiError> {
        ApiClient::lookup_bvn(self, bvn).await
    }

    async fn generate_otp(&self) -> Result<String, ApiError> {
        ApiClient::generate_otp(self).await
    }

    async fn send_otp_sms(&self, phone_number: &str, code: &str) -> Result<(), ApiError> {
        ApiClient::send_otp_sms(self, phone_number, code).await
    }

    async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), ApiError> {
        ApiClient::send_otp_email(self, email, code).await
    }

    async fn phone_exists(&self, phone_number: &str) -> Result<bool, ApiError> {
        ApiClient::phone_exists(self, phone_number).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        ApiClient::email_exists(self, email).await
    }

    async fn get_system_parameter(&self, name: &str) -> Result<Option<String>, ApiError> {
        ApiClient::get_system_parameter(self, name).await
    }

    async fn submit_loan_application(
        &self,
        req: &LoanApplicationRequest,
    ) -> Result<LoanApplicationResponse, ApiError> {
        ApiClient::submit_loan_application(self, req).await
    }
}
