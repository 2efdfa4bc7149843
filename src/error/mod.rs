//! Token Flow Error Types
//!
//! A single reportable error kind for every token flow failure.

use std::time::Duration;
use thiserror::Error;

use crate::types::GrantType;

/// Root error type for token flows.
#[derive(Error, Debug)]
pub enum TokenFlowError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Error retrieving JWT token. Received status code {status}. Call to XSUAA was not successful (grant_type: {grant_type}). Client credentials invalid.")]
    Authentication { status: u16, grant_type: GrantType },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Error decoding JWT token: {0}")]
    Decode(#[from] DecodeError),
}

impl TokenFlowError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "TOKEN_FLOW_ARGUMENT",
            Self::Validation { .. } => "TOKEN_FLOW_VALIDATION",
            Self::Authentication { .. } => "TOKEN_FLOW_AUTHENTICATION",
            Self::Transport(_) => "TOKEN_FLOW_TRANSPORT",
            Self::Decode(_) => "TOKEN_FLOW_DECODE",
        }
    }

    /// Whether a caller-side retry could succeed.
    ///
    /// Flows never retry on their own; this is a hint for callers that
    /// implement their own retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Error retrieving JWT token. Received status code {status}. Call to XSUAA was not successful (grant_type: {grant_type}).")]
    UnexpectedStatus {
        status: u16,
        grant_type: GrantType,
        description: Option<String>,
    },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl TransportError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::UnexpectedRedirect { .. }
            | Self::ResponseTooLarge { .. }
            | Self::InvalidResponse { .. } => false,
        }
    }

    /// HTTP status returned by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Response body or token decoding error.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid JSON in token response: {message}")]
    InvalidJson { message: String },

    #[error("Token response does not contain an access_token")]
    MissingAccessToken,

    #[error("Malformed token: {message}")]
    MalformedToken { message: String },
}

/// Result type for token flow operations.
pub type TokenFlowResult<T> = Result<T, TokenFlowError>;

/// OAuth2 error response from the provider.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a non-success HTTP response.
pub fn create_error_from_response(status: u16, body: &str, grant_type: GrantType) -> TokenFlowError {
    if status == 401 {
        return TokenFlowError::Authentication { status, grant_type };
    }

    let description = parse_error_response(body).map(|response| {
        response
            .error_description
            .unwrap_or(response.error)
    });

    TokenFlowError::Transport(TransportError::UnexpectedStatus {
        status,
        grant_type,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let error = create_error_from_response(401, "", GrantType::ClientCredentials);
        assert!(matches!(
            error,
            TokenFlowError::Authentication { status: 401, .. }
        ));
        assert!(error.to_string().contains("Client credentials invalid"));
        assert!(error.to_string().contains("client_credentials"));
    }

    #[test]
    fn test_other_status_maps_to_transport_with_code() {
        let body = r#"{"error":"invalid_grant","error_description":"The token is expired"}"#;
        let error = create_error_from_response(400, body, GrantType::RefreshToken);

        assert!(error.to_string().contains("400"));
        assert!(error.to_string().contains("refresh_token"));
        match error {
            TokenFlowError::Transport(TransportError::UnexpectedStatus {
                status,
                description,
                ..
            }) => {
                assert_eq!(status, 400);
                assert_eq!(description.as_deref(), Some("The token is expired"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_error_body_has_no_description() {
        let error = create_error_from_response(503, "<html>down</html>", GrantType::UserToken);
        match error {
            TokenFlowError::Transport(TransportError::UnexpectedStatus { description, .. }) => {
                assert!(description.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_is_retryable() {
        let server_error = create_error_from_response(502, "", GrantType::ClientCredentials);
        assert!(server_error.is_retryable());

        let bad_request = create_error_from_response(400, "", GrantType::ClientCredentials);
        assert!(!bad_request.is_retryable());

        assert!(TokenFlowError::Transport(TransportError::Timeout {
            timeout: Duration::from_secs(30)
        })
        .is_retryable());
        assert!(!TokenFlowError::validation("missing").is_retryable());
        assert!(!TokenFlowError::Decode(DecodeError::MissingAccessToken).is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TokenFlowError::validation("x").error_code(),
            "TOKEN_FLOW_VALIDATION"
        );
        assert_eq!(
            TokenFlowError::Decode(DecodeError::MissingAccessToken).error_code(),
            "TOKEN_FLOW_DECODE"
        );
    }
}
