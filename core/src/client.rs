//! Stateless request builder and response parser for the AccountView data
//! endpoint.
//!
//! # Design
//! `AccountViewClient` holds only its configuration and carries no mutable
//! state between calls. `build_data_post` turns a `CompositePayload` into an
//! `HttpRequest`; `parse_data_post` interprets the `HttpResponse` the caller
//! got back, including the error envelope the remote side embeds in both
//! failed and nominally successful responses.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CompositePayload, ErrorEnvelope};

/// Path of the data endpoint, relative to the base URL.
pub const DATA_PATH: &str = "/accountviewdata";

const MEDIA_TYPE: &str = "application/json";
const CHARSET: &str = "utf-8";
const ENVELOPE_KEYS: [&str; 3] = ["ErrorType", "ErrorNumbers", "ErrorMessage"];

/// Synchronous, stateless client for the AccountView data endpoint.
#[derive(Debug, Clone)]
pub struct AccountViewClient {
    config: ClientConfig,
}

impl AccountViewClient {
    pub fn new(mut config: ClientConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request posting `payload`. The payload is validated first so an
    /// inconsistent body never reaches the wire.
    pub fn build_data_post(&self, payload: &CompositePayload) -> Result<HttpRequest, ApiError> {
        payload.validate()?;
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{DATA_PATH}", self.config.base_url),
            headers: self.headers(),
            body: Some(body),
        })
    }

    /// Decode the response to a data post.
    ///
    /// An empty 2xx body yields `Value::Null`. A populated error envelope is
    /// an error whatever the status code.
    pub fn parse_data_post(&self, response: HttpResponse) -> Result<Value, ApiError> {
        self.check_response(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value =
            serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        if let Ok(envelope) = ErrorEnvelope::deserialize(&value) {
            if envelope.is_error() {
                warn!(status = response.status, %envelope, "remote error in successful response");
                return Err(ApiError::Remote(envelope));
            }
        }
        Ok(value)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), format!("{MEDIA_TYPE}; charset={CHARSET}")),
            ("accept".to_string(), MEDIA_TYPE.to_string()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
            ("x-company".to_string(), self.config.company_id.clone()),
        ]
    }

    /// Map non-2xx responses to the appropriate `ApiError` variant.
    fn check_response(&self, response: &HttpResponse) -> Result<(), ApiError> {
        if (200..=299).contains(&response.status) {
            return Ok(());
        }

        let content_type = response
            .header("content-type")
            .unwrap_or_default()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if content_type != MEDIA_TYPE {
            return Err(ApiError::UnexpectedContentType {
                expected: MEDIA_TYPE.to_string(),
                actual: content_type.to_string(),
            });
        }
        if response.body.trim().is_empty() {
            return Err(ApiError::EmptyBody);
        }

        let envelope = self.decode_envelope(&response.body)?;
        if envelope.is_error() {
            warn!(status = response.status, %envelope, "remote error");
            return Err(ApiError::Remote(envelope));
        }
        Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        })
    }

    fn decode_envelope(&self, body: &str) -> Result<ErrorEnvelope, ApiError> {
        let value: Value = serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        if self.config.disallow_unknown_fields {
            if let Some(unknown) = value
                .as_object()
                .and_then(|o| o.keys().find(|k| !ENVELOPE_KEYS.contains(&k.as_str())))
            {
                return Err(ApiError::DeserializationError(format!("unknown field `{unknown}`")));
            }
        }
        ErrorEnvelope::deserialize(&value).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}
