//! Client Credentials Flow
//!
//! Retrieves a technical user token for the OAuth client itself.

use std::collections::HashMap;

use super::{execute_flow, FlowContext};
use crate::core::{HttpTransport, TokenDecoder};
use crate::error::TokenFlowResult;
use crate::types::{ClientAuthMethod, Endpoints, GrantRequest, Jwt, TokenFlowRequest};

/// Client credentials flow builder.
///
/// Obtained from [`XsuaaTokenFlows`](crate::XsuaaTokenFlows); setters consume
/// and return the builder, `execute` consumes it for good.
pub struct ClientCredentialsTokenFlow<T: HttpTransport, D: TokenDecoder> {
    context: FlowContext<T, D>,
    request: TokenFlowRequest,
}

impl<T: HttpTransport, D: TokenDecoder> ClientCredentialsTokenFlow<T, D> {
    pub(crate) fn new(context: FlowContext<T, D>, endpoints: Endpoints) -> Self {
        Self {
            context,
            request: TokenFlowRequest::new(endpoints, GrantRequest::ClientCredentials),
        }
    }

    /// Set the ID of the OAuth client requesting the token.
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.request.set_client_id(client_id.into());
        self
    }

    /// Set the secret of the OAuth client requesting the token.
    pub fn secret(mut self, client_secret: impl Into<String>) -> Self {
        self.request.set_client_secret(client_secret.into());
        self
    }

    /// Request additional attributes in the `az_attr` claim of the token.
    pub fn attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.request.set_attributes(attributes);
        self
    }

    /// Choose how the client credentials are sent. Defaults to a Basic header.
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
    use crate::core::HttpResponse;
    use crate::error::{DecodeError, TokenFlowError, TransportError};
    use crate::flows::test_support::{harness, query_pairs};
    use crate::telemetry::LogLevel;
    use base64::Engine;
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::parse("https://tenant.authentication.example.com").unwrap()
    }

    fn attributes() -> HashMap<String, String> {
        [
            ("cost-center".to_string(), "0815".to_string()),
            ("country".to_string(), "DE".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_builder_chaining_keeps_all_values() {
        let h = harness();
        let flow = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("x")
            .secret("y")
            .attributes(HashMap::new());

        assert_eq!(flow.request().client_id(), Some("x"));
        assert_eq!(flow.request().client_secret(), Some("y"));
        assert!(flow.request().attributes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_fails_before_network() {
        let h = harness();
        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .execute()
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, TokenFlowError::Validation { .. }));
        assert!(error
            .to_string()
            .starts_with("Client credentials flow request is not valid"));
        assert_eq!(h.transport.request_count(), 0);
        assert!(h.decoder.get_calls().is_empty());
        assert_eq!(h.logger.get_entries_by_level(LogLevel::Warn).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_client_id_fails_before_network() {
        let h = harness();
        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .secret("secret")
            .execute()
            .await;

        assert!(matches!(result, Err(TokenFlowError::Validation { .. })));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_request_shape_without_attributes() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));

        ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await
            .unwrap();

        let request = h.transport.get_last_request().unwrap();
        assert_eq!(request.method.as_str(), "POST");
        assert!(request.body.is_none());
        assert!(request
            .url
            .starts_with("https://tenant.authentication.example.com/oauth/token?"));

        let query = query_pairs(&request.url);
        assert_eq!(query.len(), 1);
        assert_eq!(query.get("grant_type").map(String::as_str), Some("client_credentials"));

        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        let authorization = request.headers.get("authorization").unwrap();
        let payload = authorization.strip_prefix("Basic ").unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        assert_eq!(decoded, b"sb-client:secret");
    }

    #[tokio::test]
    async fn test_attributes_sent_as_encoded_json_authorities() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));

        ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .attributes(attributes())
            .execute()
            .await
            .unwrap();

        let request = h.transport.get_last_request().unwrap();
        assert!(!request.url.contains('{'));
        assert!(!request.url.contains('"'));

        let query = query_pairs(&request.url);
        assert_eq!(query.len(), 2);
        let authorities: HashMap<String, String> =
            serde_json::from_str(query.get("authorities").unwrap()).unwrap();
        assert_eq!(authorities, attributes());
    }

    #[tokio::test]
    async fn test_client_secret_post_moves_credentials_to_query() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));

        ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .auth_method(ClientAuthMethod::ClientSecretPost)
            .execute()
            .await
            .unwrap();

        let request = h.transport.get_last_request().unwrap();
        assert!(!request.headers.contains_key("authorization"));
        let query = query_pairs(&request.url);
        assert_eq!(query.get("client_id").map(String::as_str), Some("sb-client"));
        assert_eq!(query.get("client_secret").map(String::as_str), Some("secret"));
    }

    #[tokio::test]
    async fn test_success_returns_decoder_output_unchanged() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi", "expires_in": 43199}));
        let claims = json!({"cid": "sb-client"}).as_object().cloned().unwrap();
        let expected = Jwt::new("decoded", None, None, serde_json::Map::new(), claims);
        h.decoder.set_next_token(expected.clone());

        let jwt = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await
            .unwrap();

        assert_eq!(jwt, expected);
        assert_eq!(
            h.decoder.get_calls(),
            vec![("abc.def.ghi".to_string(), endpoints().key_set)]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_error() {
        let h = harness();
        h.transport.queue_json_response(401, &json!({"error": "unauthorized"}));

        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("wrong")
            .execute()
            .await;

        assert!(matches!(
            result,
            Err(TokenFlowError::Authentication { status: 401, .. })
        ));
        assert!(h.decoder.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_other_status_is_transport_error_with_code() {
        let h = harness();
        h.transport.queue_json_response(500, &json!({}));

        let error = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await
            .unwrap_err();

        assert!(error.to_string().contains("500"));
        assert!(matches!(
            error,
            TokenFlowError::Transport(TransportError::UnexpectedStatus { status: 500, .. })
        ));
        assert_eq!(h.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_access_token_is_decode_error() {
        let h = harness();
        h.transport.queue_json_response(200, &json!({"token_type": "bearer"}));

        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await;

        assert!(matches!(
            result,
            Err(TokenFlowError::Decode(DecodeError::MissingAccessToken))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_decode_error() {
        let h = harness();
        h.transport.queue_response(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: "not json".to_string(),
        });

        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await;

        assert!(matches!(
            result,
            Err(TokenFlowError::Decode(DecodeError::InvalidJson { .. }))
        ));
    }

    #[tokio::test]
    async fn test_decoder_failure_is_wrapped() {
        let h = harness();
        h.transport
            .queue_json_response(200, &json!({"access_token": "abc.def.ghi"}));
        h.decoder.set_next_error(DecodeError::MalformedToken {
            message: "unknown algorithm".to_string(),
        });

        let error = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            TokenFlowError::Decode(DecodeError::MalformedToken { .. })
        ));
        assert!(error.to_string().contains("unknown algorithm"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let h = harness();

        let result = ClientCredentialsTokenFlow::new(h.context, endpoints())
            .client("sb-client")
            .secret("secret")
            .execute()
            .await;

        assert!(matches!(
            result,
            Err(TokenFlowError::Transport(TransportError::ConnectionFailed { .. }))
        ));
        assert_eq!(h.logger.get_entries_by_level(LogLevel::Error).len(), 1);
    }
}
