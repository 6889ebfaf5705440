//! The uniform result of every client call.

use serde::{Deserialize, Serialize};

/// Either the decoded payload or a human-readable error message.
///
/// Serializes externally tagged, i.e. `{"data": ...}` or `{"error": "..."}`,
/// which is the shape UI layers already branch on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Data(T),
    Error(String),
}

impl<T> ApiResponse<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, ApiResponse::Data(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResponse::Data(data) => Some(data),
            ApiResponse::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResponse::Data(_) => None,
            ApiResponse::Error(message) => Some(message),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiResponse::Data(data) => Ok(data),
            ApiResponse::Error(message) => Err(message),
        }
    }
}
