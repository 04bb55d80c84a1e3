use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error half of the response envelope. `code` carries machine-readable
/// sentinels (e.g. the not-found code for `single=true` lookups) and is
/// omitted from the JSON when absent.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ResponseError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The envelope every endpoint responds with: `{"data": ..., "error": ...}`.
/// Exactly one of the two is typically populated, but both are always
/// present as JSON keys (`null` when unset) so clients can destructure
/// unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<ResponseError>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ResponseError {
                message: message.into(),
                code: None,
            }),
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ResponseError {
                message: message.into(),
                code: Some(code.into()),
            }),
        }
    }
}
