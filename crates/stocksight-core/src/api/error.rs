use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Unauthorized - session expired or revoked")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull the human-readable message out of an error body.
    ///
    /// The API reports errors as `{"detail": "..."}`, or for request
    /// validation failures as `{"detail": [{"msg": "..."}, ...]}`. Anything
    /// else falls back to the (truncated) raw body.
    pub fn detail(body: &str) -> String {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned());

        match detail {
            Some(Value::String(s)) => s,
            Some(Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    Self::truncate_body(body)
                } else {
                    messages.join("; ")
                }
            }
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::detail(body);
        match status.as_u16() {
            400 | 409 | 422 => ApiError::Validation(detail),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// Whether this is the gateway's "session is gone" signal.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, r#"{"detail":"Admin access required"}"#),
            ApiError::AccessDenied(ref m) if m == "Admin access required"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::ServerError(ref m) if m == "upstream down"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "short"),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_validation_detail_is_displayable() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Username or email already registered"}"#,
        );
        assert_eq!(err.to_string(), "Username or email already registered");
    }

    #[test]
    fn test_detail_joins_validation_messages() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#;
        assert_eq!(
            ApiError::detail(body),
            "value is not a valid email address; field required"
        );
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        let detail = ApiError::detail(&body);
        assert!(detail.contains("truncated, 800 total bytes"));
        assert!(detail.len() < body.len());
    }
}
