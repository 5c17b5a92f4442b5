// Customer record and sub-resource endpoints.

use log::info;

use super::client::{ApiClient, ApiError};
use crate::models::requests::{CustomerUpsertRequest, EmploymentDataRequest, FinancialDataRequest};
use crate::models::responses::CustomerResponse;
use crate::utils::logging::{mask_email, mask_phone};

impl ApiClient {
    pub async fn create_customer(
        &self,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError> {
        info!(
            "[PHASE: api] [STEP: customer_create] Creating customer (cid={}, phone={}, email={})",
            self.correlation_id(),
            mask_phone(&req.phone_number),
            mask_email(&req.email)
        );
        let response = self
            .http
            .post(self.endpoint("customers"))
            .json(req)
            .send()
            .await?;
        self.read_envelope(response).await
    }

    pub async fn update_customer(
        &self,
        customer_id: &str,
        req: &CustomerUpsertRequest,
    ) -> Result<CustomerResponse, ApiError> {
        info!(
            "[PHASE: api] [STEP: customer_update] Updating customer (cid={}, customer_id={})",
            self.correlation_id(),
            customer_id
        );
        let response = self
            .http
            .put(self.endpoint(&format!("customers/{}", customer_id)))
            .json(req)
            .send()
            .await?;
        self.read_envelope(response).await
    }

    pub async fn get_customer(&self, customer_id: &str) -> Result<CustomerResponse, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&format!("customers/{}", customer_id)))
            .send()
            .await?;
        self.read_envelope(response).await
    }

    pub async fn save_financial_data(
        &self,
        customer_id: &str,
        req: &FinancialDataRequest,
    ) -> Result<(), ApiError> {
        info!(
            "[PHASE: api] [STEP: financial_data] Saving financial data (cid={}, customer_id={})",
            self.correlation_id(),
            customer_id
        );
        let response = self
            .http
            .post(self.endpoint(&format!("customers/{}/financial-data", customer_id)))
            .json(req)
            .send()
            .await?;
        self.read_ack(response).await
    }

    pub async fn save_employment_data(
        &self,
        customer_id: &str,
        req: &EmploymentDataRequest,
    ) -> Result<(), ApiError> {
        info!(
            "[PHASE: api] [STEP: employment_data] Saving employment data (cid={}, customer_id={})",
            self.correlation_id(),
            customer_id
        );
        let response = self
            .http
            .post(self.endpoint(&format!("customers/{}/employment-data", customer_id)))
            .json(req)
            .send()
            .await?;
        self.read_ack(response).await
    }

    /// Upload the captured selfie as multipart form data.
    pub async fn upload_profile_picture(
        &self,
        customer_id: &str,
        image: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), ApiError> {
        info!(
            "[PHASE: api] [STEP: picture_upload] Uploading profile picture (cid={}, customer_id={}, bytes={})",
            self.correlation_id(),
            customer_id,
            image.len()
        );
        let file_name = match mime_type {
            "image/png" => "selfie.png",
            _ => "selfie.jpg",
        };
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(file_name)
            .mime_str(mime_type)
            .map_err(|e| ApiError::Protocol(format!("invalid selfie mime type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint(&format!("customers/{}/picture", customer_id)))
            .multipart(form)
            .send()
            .await?;
        self.read_ack(response).await
    }
}
