//! Unified error types for the monitoring engine.
//!
//! Every caller-visible failure maps to the API envelope code `1001` plus a
//! meaningful HTTP status; `1000` denotes success. Ingestion errors are
//! fail-closed and propagate; query-path errors are swallowed into zero
//! shapes at the engine boundary and never reach here.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope code for a successful response.
pub const CODE_SUCCESS: u32 = 1000;

/// Envelope code for any caller-visible failure.
pub const CODE_FAILURE: u32 = 1001;

/// Unified error type for the monitoring engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The declared appId does not reference a known tenant.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// The tenant exists but ingestion is disabled for it.
    #[error("tenant disabled: {0}")]
    TenantDisabled(String),

    /// Malformed input: non-array payload, empty batch, missing fields.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The event store rejected or failed a write. Retryable by the caller.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The tenant directory collaborator could not be reached.
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn directory_unavailable(msg: impl Into<String>) -> Self {
        Self::DirectoryUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Envelope code carried in the `{code, message, data}` response body.
    pub fn envelope_code(&self) -> u32 {
        CODE_FAILURE
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::TenantNotFound(_) => 404,
            Self::TenantDisabled(_) => 403,
            Self::BadRequest(_) | Self::Serialization(_) => 400,
            Self::StoreUnavailable(_) => 500,
            Self::DirectoryUnavailable(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Whether the caller should retry the request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::DirectoryUnavailable(_)
        )
    }
}
