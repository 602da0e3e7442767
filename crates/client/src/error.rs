use std::sync::Arc;

use api_types::{ApiFailure, ErrorCode};
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure of a backend call.
///
/// Cloneable so a single coalesced request can hand the same outcome to
/// every waiter.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The envelope said `success=false`.
    #[error("{message}")]
    Api { code: Option<i32>, message: String },
    #[error("server returned no data")]
    MissingData,
    #[error("update requires a transaction id")]
    MissingTransactionId,
    #[error("unexpected response status {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Decode(Arc<serde_json::Error>),
    #[error("server unreachable: {0}")]
    Transport(Arc<reqwest::Error>),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Known business code behind an envelope failure, if any.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api {
                code: Some(code), ..
            } => ErrorCode::from_code(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<ApiFailure> for ClientError {
    fn from(value: ApiFailure) -> Self {
        Self::Api {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(Arc::new(value))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_failure_displays_server_message() {
        let err = ClientError::from(ApiFailure {
            code: Some(-101),
            message: "not found".to_string(),
        });
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.error_code(), Some(ErrorCode::TransactionNotFound));
        assert!(!err.is_transport());
    }

    #[test]
    fn unknown_codes_have_no_label() {
        let err = ClientError::Api {
            code: Some(418),
            message: "teapot".to_string(),
        };
        assert_eq!(err.error_code(), None);
    }
}
