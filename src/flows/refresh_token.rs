//! Refresh Token Flow
//!
//! Exchanges a refresh token for a new access token.

use secrecy::SecretString;

use super::{execute_flow, FlowContext};
use crate::core::{HttpTransport, TokenDecoder};
use crate::error::TokenFlowResult;
use crate::types::{ClientAuthMethod, Endpoints, GrantRequest, Jwt, TokenFlowRequest};

/// Refresh token flow builder.
pub struct RefreshTokenFlow<T: HttpTransport, D: TokenDecoder> {
    context: FlowContext<T, D>,
    request: TokenFlowRequest,
}

impl<T: HttpTransport, D: TokenDecoder> RefreshTokenFlow<T, D> {
    pub(crate) fn new(context: FlowContext<T, D>, endpoints: Endpoints) -> Self {
        Self {
            context,
            request: TokenFlowRequest::new(
                endpoints,
                GrantRequest::RefreshToken {
                    refresh_token: None,
                },
            ),
        }
    }

    /// Set the ID of the OAuth client requesting the token.
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.request.set_client_id(client_id.into());
        self
    }

    /// Set the client secret. Not needed with [`ClientAuthMethod::None`].
    pub fn secret(mut self, client_secret: impl Into<String>) -> Self {
        self.request.set_client_secret(client_secret.into());
        self
    }

    /// Set the refresh token to exchange.
    pub fn refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        if let GrantRequest::RefreshToken {
            refresh_token: slot,
        } = self.request.grant_mut()
        {
            *slot = Some(SecretString::new(refresh_token.into()));
        }
        self
    }

    /// Choose how the client authenticates. Public clients use
    /// [`ClientAuthMethod::None`] and send only their client ID.
    pub fn auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.request.set_auth_method(auth_method);
        self
    }

    /// The request accumulated so far.
    pub fn request(&self) -> &TokenFlowRequest {
        &self.request
    }

    /// Execute the flow and return the decoded JWT from XSUAA.
    pub async fn execute(self) -> TokenFlowResult<Jwt> {
        execute_flow(&self.context, self.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TokenFlowError, TransportError};
    use crate::flows::test_support::{harness, query_pairs};
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::parse("https://tenant.authentication.example.com").unwrap()
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_before_network() {
        let h = harness();
        let error = RefreshTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(error, TokenFlowError::Validation { .. }));
        assert!(error
            .to_string()
            .starts_with("Refresh token flow request is not valid"));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_confidential_client_request_shape() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));

        RefreshTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .refresh_token("rt-1234")
            .execute()
            .await
            .unwrap();

        let request = h.transport.get_last_request().unwrap();
        let query = query_pairs(&request.url);
        assert_eq!(query.len(), 2);
        assert_eq!(query.get("grant_type").map(String::as_str), Some("refresh_token"));
        assert_eq!(query.get("refresh_token").map(String::as_str), Some("rt-1234"));
        assert!(request
            .headers
            .get("authorization")
            .unwrap()
            .starts_with("Basic "));
    }

    #[tokio::test]
    async fn test_public_client_sends_client_id_without_basic_auth() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));

        RefreshTokenFlow::new(h.context, endpoints())
            .client("public-client")
            .refresh_token("rt-1234")
            .auth_method(ClientAuthMethod::None)
            .execute()
            .await
            .unwrap();

        let request = h.transport.get_last_request().unwrap();
        assert!(!request.headers.contains_key("authorization"));
        let query = query_pairs(&request.url);
        assert_eq!(query.get("client_id").map(String::as_str), Some("public-client"));
        assert!(!query.contains_key("client_secret"));
    }

    #[tokio::test]
    async fn test_secret_required_unless_public_client() {
        let h = harness();
        let result = RefreshTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .refresh_token("rt-1234")
            .execute()
            .await;

        assert!(matches!(result, Err(TokenFlowError::Validation { .. })));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_error_message_names_refresh_grant() {
        let h = harness();
        h.transport.queue_json_response(
            400,
            &json!({"error": "invalid_token", "error_description": "Invalid refresh token"}),
        );

        let error = RefreshTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .refresh_token("expired")
            .execute()
            .await
            .unwrap_err();

        assert!(error.to_string().contains("grant_type: refresh_token"));
        match error {
            TokenFlowError::Transport(TransportError::UnexpectedStatus {
                status,
                description,
                ..
            }) => {
                assert_eq!(status, 400);
                assert_eq!(description.as_deref(), Some("Invalid refresh token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let h = harness();
        h.transport.queue_json_response(401, &json!({}));

        let result = RefreshTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .refresh_token("rt-1234")
            .execute()
            .await;

        assert!(matches!(
            result,
            Err(TokenFlowError::Authentication { .. })
        ));
    }
}
