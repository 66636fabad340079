//! Error types for the Noko API client.
//!
//! # Design
//! Every failure is attributable to exactly one stage of a call: local
//! parameter validation (nothing was sent), the HTTP exchange (the server
//! answered with a non-2xx status, or the transport itself failed), or
//! encoding/decoding of JSON payloads. Nothing is retried or recovered here.

/// A parameter failed local validation. Raised before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {constraint}")]
pub struct ValidationError {
    /// The API parameter (or group of parameters) that was rejected.
    pub field: &'static str,
    /// The constraint that was violated.
    pub constraint: String,
}

impl ValidationError {
    pub fn new(field: &'static str, constraint: impl Into<String>) -> Self {
        Self {
            field,
            constraint: constraint.into(),
        }
    }
}

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A parameter was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server returned a non-2xx status. Carries the raw body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be parsed as the expected JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request never produced an HTTP response (DNS, TLS, connection reset).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The base URL and resource path did not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Status code of an [`ApiError::Http`] error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported that the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field_and_constraint() {
        let err = ValidationError::new("billing_increment", "must be one of 1, 5, 6");
        assert_eq!(
            err.to_string(),
            "invalid `billing_increment`: must be one of 1, 5, 6"
        );
    }

    #[test]
    fn validation_error_is_transparent_inside_api_error() {
        let err = ApiError::from(ValidationError::new("from", "is not a YYYY-MM-DD date"));
        assert_eq!(err.to_string(), "invalid `from`: is not a YYYY-MM-DD date");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn http_error_exposes_status_and_body() {
        let err = ApiError::Http {
            status: 404,
            body: r#"{"message":"Not found"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), r#"HTTP 404: {"message":"Not found"}"#);
    }
}
