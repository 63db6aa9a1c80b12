//! Response envelope and API error mapping.
//!
//! Every body, success or failure, is `{code, message, data}`: `1000` for
//! success, `1001` for any failure, with the HTTP status carrying the
//! failure class (404 unknown tenant, 403 disabled, 400 malformed, 500
//! dependency failure).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use monitor_core::{Error, CODE_SUCCESS};
use serde::{Deserialize, Serialize};

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u32,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: "success".to_string(),
            data,
        }
    }
}

/// API-layer error wrapper around the engine error.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Envelope {
            code: self.0.envelope_code(),
            message: self.0.to_string(),
            data: serde_json::Value::Null,
        };
        (status, Json(body)).into_response()
    }
}
