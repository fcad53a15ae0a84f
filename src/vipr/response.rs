//! Response normalization
//!
//! Turns a raw HTTP response into either an [`ApiResponse`] or one of the
//! appliance error kinds. The transport reads bodies in full, so a
//! truncated response never reaches this point.

use log::debug;
use reqwest::{Method, StatusCode};

use crate::error::{ApiFailure, Result, ViprError};
use crate::vipr::models::{ApiResponse, ServiceErrorBody};
use crate::vipr::transport::HttpResponse;

/// Whether a status means the session was not accepted
pub fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Classify a complete response
pub fn normalize(method: &Method, path: &str, response: HttpResponse) -> Result<ApiResponse> {
    let HttpResponse {
        status,
        headers,
        body: text,
    } = response;
    debug!("{} {} -> HTTP {} ({} bytes)", method, path, status.as_u16(), text.len());

    if status.is_success() {
        return Ok(ApiResponse {
            status: status.as_u16(),
            headers,
            body: decode_body(status, &text)?,
        });
    }

    Err(classify_failure(method, path, status, &text))
}

/// Decode a success body; empty bodies become `Null`
pub(crate) fn decode_body(status: StatusCode, text: &str) -> Result<serde_json::Value> {
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(text).map_err(|e| {
        ViprError::Protocol(format!(
            "HTTP {} response is not valid JSON: {}",
            status.as_u16(),
            e
        ))
    })
}

/// Map a non-success status onto the error taxonomy
pub(crate) fn classify_failure(method: &Method, path: &str, status: StatusCode, text: &str) -> ViprError {
    let failure = api_failure(method, path, status, text);
    if status.is_client_error() {
        ViprError::Client(failure)
    } else if status.is_server_error() {
        ViprError::Server(failure)
    } else {
        ViprError::Protocol(format!(
            "unexpected HTTP {} from {} {}",
            status.as_u16(),
            method,
            path
        ))
    }
}

/// Build the failure record, preferring the appliance's own error body
pub(crate) fn api_failure(method: &Method, path: &str, status: StatusCode, text: &str) -> ApiFailure {
    let body = serde_json::from_str::<ServiceErrorBody>(text).unwrap_or_default();

    let message = body
        .description
        .filter(|d| !d.is_empty())
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty() && body.code.is_none()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("no description")
                .to_string()
        });

    ApiFailure {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        code: body.code,
        message,
        details: body.details.filter(|d| !d.is_empty()),
    }
}
