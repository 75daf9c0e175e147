//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// Error codes returned by the daemon
pub mod code {
    pub const VALIDATION: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL: i32 = 5000;
}

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error object returned by the daemon. `kind` is the machine-readable
    /// category (`validation`, `not_found`, `conflict`, ...).
    #[error("RPC error ({code}): {message}")]
    Rpc {
        code: i32,
        message: String,
        kind: Option<String>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SdkError {
    /// RPC error code, if the daemon answered with one
    pub fn code(&self) -> Option<i32> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(code::NOT_FOUND)
    }

    pub fn is_validation(&self) -> bool {
        self.code() == Some(code::VALIDATION)
    }

    pub fn is_conflict(&self) -> bool {
        self.code() == Some(code::CONFLICT)
    }

    pub fn is_throttled(&self) -> bool {
        self.code() == Some(code::THROTTLED)
    }
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(call_err) => SdkError::Rpc {
                code: call_err.code(),
                message: call_err.message().to_string(),
                kind: call_err
                    .data()
                    .and_then(|raw| serde_json::from_str::<String>(raw.get()).ok()),
            },
            jsonrpsee::core::ClientError::Transport(e) => {
                SdkError::Transport(format!("Transport error: {}", e))
            }
            jsonrpsee::core::ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            jsonrpsee::core::ClientError::ParseError(e) => SdkError::Serialization(e),
            _ => SdkError::Other(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::types::ErrorObjectOwned;

    #[test]
    fn test_call_error_keeps_code_and_kind() {
        let call = ErrorObjectOwned::owned(4001, "Not found: ticket t-1", Some("not_found"));
        let err = SdkError::from(jsonrpsee::core::ClientError::Call(call));

        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        match err {
            SdkError::Rpc { message, kind, .. } => {
                assert_eq!(message, "Not found: ticket t-1");
                assert_eq!(kind.as_deref(), Some("not_found"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_rpc_errors_have_no_code() {
        assert_eq!(SdkError::Connection("down".into()).code(), None);
    }
}
