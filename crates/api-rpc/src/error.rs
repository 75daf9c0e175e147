//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes. The error kind string
//! travels in `data` so clients can branch without parsing messages.

use jsonrpsee::types::ErrorObjectOwned;
use tracing::error;
use walkin_core::error::{AppError, ErrorKind};

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let kind = err.kind();
    match kind {
        ErrorKind::Validation => owned(code::VALIDATION_ERROR, err.to_string(), "validation"),
        ErrorKind::NotFound => owned(code::NOT_FOUND, err.to_string(), "not_found"),
        ErrorKind::Conflict => owned(code::CONFLICT, err.to_string(), "conflict"),
        ErrorKind::Internal => {
            // Details stay in the daemon log
            error!(error = %err, "Internal error while serving RPC");
            owned(code::INTERNAL_ERROR, "Internal error".to_string(), "internal")
        }
    }
}

/// Malformed or missing request parameters
pub fn invalid_params(err: ErrorObjectOwned) -> ErrorObjectOwned {
    owned(code::VALIDATION_ERROR, err.message().to_string(), "validation")
}

pub fn throttled() -> ErrorObjectOwned {
    owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.".to_string(),
        "throttled",
    )
}

fn owned(code: i32, message: String, kind: &'static str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, message, Some(kind))
}
