// Verification endpoints: BVN lookup, OTP generation/delivery, duplicate
// contact checks.

use log::info;

use super::client::{ApiClient, ApiError};
use crate::models::requests::{BvnLookupRequest, OtpEmailRequest, OtpGenerateRequest, OtpSmsRequest};
use crate::models::responses::{BvnRecord, DuplicateCheckResponse, OtpGenerateResponse};
use crate::utils::logging::{mask_email, mask_identity_number, mask_phone};

impl ApiClient {
    /// Internal-only BVN lookup. `None` means no record was found.
    pub async fn lookup_bvn(&self, bvn: &str) -> Result<Option<BvnRecord>, ApiError> {
        info!(
            "[PHASE: api] [STEP: bvn_lookup] BVN lookup requested (cid={}, bvn={})",
            self.correlation_id(),
            mask_identity_number(bvn)
        );
        let req = BvnLookupRequest {
            bvn: bvn.to_string(),
            internal_only: true,
        };
        let response = self
            .http
            .post(self.endpoint("verification/bvn"))
            .json(&req)
            .send()
            .await?;
        self.read_optional_envelope(response).await
    }

    /// Ask the backend for a fresh 6-digit OTP. The code is returned to the
    /// client and held in memory only; delivery happens separately.
    pub async fn generate_otp(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint("otp/generate"))
            .json(&OtpGenerateRequest::default())
            .send()
            .await?;
        let data: OtpGenerateResponse = self.read_envelope(response).await?;
        if data.code.len() != 6 || !data.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::Protocol(format!(
                "OTP endpoint returned a non-6-digit code ({} chars)",
                data.code.len()
            )));
        }
        Ok(data.code)
    }

    pub async fn send_otp_sms(&self, phone_number: &str, code: &str) -> Result<(), ApiError> {
        info!(
            "[PHASE: api] [STEP: otp_sms] Dispatching OTP by SMS (cid={}, phone={})",
            self.correlation_id(),
            mask_phone(phone_number)
        );
        let req = OtpSmsRequest {
            phone_number: phone_number.to_string(),
            code: code.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("otp/send-sms"))
            .json(&req)
            .send()
            .await?;
        self.read_ack(response).await
    }

    pub async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), ApiError> {
        info!(
            "[PHASE: api] [STEP: otp_email] Dispatching OTP by email (cid={}, email={})",
            self.correlation_id(),
            mask_email(email)
        );
        let req = OtpEmailRequest {
            email: email.to_string(),
            code: code.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("otp/send-email"))
            .json(&req)
            .send()
            .await?;
        self.read_ack(response).await
    }

    pub async fn phone_exists(&self, phone_number: &str) -> Result<bool, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&format!("customers/duplicate/phone/{}", phone_number)))
            .send()
            .await?;
        let data: DuplicateCheckResponse = self.read_envelope(response).await?;
        Ok(data.exists)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&format!("customers/duplicate/email/{}", email)))
            .send()
            .await?;
        let data: DuplicateCheckResponse = self.read_envelope(response).await?;
        Ok(data.exists)
    }
}
