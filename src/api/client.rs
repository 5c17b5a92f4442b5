// HTTP client for the lending backend.
//
// Every endpoint returns the backend's `ApiResponse<T>` envelope; helpers
// here unwrap it into typed results so callers never look at raw bodies.

use log::warn;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::ApiSettings;
use crate::models::responses::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx HTTP status.
    #[error("server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx with `success=false` in the envelope.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// 2xx but the body did not match the contract (missing data, bad JSON).
    #[error("unexpected response: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    /// Session-scoped correlation id carried on every API log line so a
    /// support case can be tied to the backend's request logs.
    correlation_id: String,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Protocol(format!("invalid base url: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            correlation_id: Uuid::new_v4().simple().to_string(),
        })
    }

    pub(crate) fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Unwrap an `ApiResponse<T>` envelope, mapping HTTP and envelope-level
    /// failures into `ApiError`.
    pub(crate) async fn read_envelope<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = body_snippet(response).await;
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Protocol(format!("malformed response body: {}", e)))?;

        if !envelope.success {
            let reason = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "no reason given".to_string());
            return Err(ApiError::Rejected(reason));
        }

        envelope
            .data
            .ok_or_else(|| ApiError::Protocol("successful response carried no data".to_string()))
    }

    /// Like `read_envelope`, but a 404 (or an envelope-level rejection) maps
    /// to `None` instead of an error. Used for existence-style lookups.
    pub(crate) async fn read_optional_envelope<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<Option<T>, ApiError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        match self.read_envelope::<T>(response).await {
            Ok(data) => Ok(Some(data)),
            Err(ApiError::Rejected(reason)) => {
                warn!(
                    "[PHASE: api] [STEP: lookup] Lookup rejected by backend (cid={}): {}",
                    self.correlation_id, reason
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Unwrap an envelope whose payload we do not care about.
    pub(crate) async fn read_ack(&self, response: Response) -> Result<(), ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = body_snippet(response).await;
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        // Some ack endpoints return a bare 2xx with no envelope; tolerate that.
        let text = response.text().await.unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<ApiResponse<serde_json::Value>>(&text) {
            Ok(envelope) if !envelope.success => Err(ApiError::Rejected(
                envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "no reason given".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

async fn body_snippet(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    truncate_snippet(text.trim())
}

/// Truncate a body to at most 200 bytes without splitting a character.
fn truncate_snippet(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.len() <= LIMIT {
        return text.to_string();
    }
    let mut end = LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
