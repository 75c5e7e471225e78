use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope for every API response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Error response that still carries a payload (e.g. an AI fallback body).
    pub fn error_with_data(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_omits_message() {
        let json = serde_json::to_string(&ApiResponse::success(5)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":5}"#);
    }

    #[test]
    fn error_omits_data() {
        let json = serde_json::to_string(&ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"nope"}"#);
    }
}
