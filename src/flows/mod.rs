//! Token Flows
//!
//! XSUAA token flow builders and the execution routine they share.
//!
//! - **Client Credentials Flow**: technical user tokens for the client itself
//! - **Refresh Token Flow**: a new access token for an existing refresh token
//! - **User Token Flow**: exchanges a user's token for one issued to this client
//!
//! Every flow executes the same steps: validate the request, build the
//! token endpoint URI and headers, issue one POST, interpret the status,
//! and decode the returned access token.

pub mod client_credentials;
pub mod refresh_token;
pub mod user_token;

pub use client_credentials::ClientCredentialsTokenFlow;
pub use refresh_token::RefreshTokenFlow;
pub use user_token::UserTokenFlow;

use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{
    accept_header, basic_auth_header, build_authorities, HttpMethod, HttpRequest, HttpTransport,
    TokenDecoder, AUTHORIZATION_HEADER,
};
use crate::error::{create_error_from_response, DecodeError, TokenFlowResult};
use crate::telemetry::{Logger, TokenFlowLogContext};
use crate::types::{ClientAuthMethod, GrantRequest, Jwt, TokenFlowRequest, TokenResponse};

const GRANT_TYPE: &str = "grant_type";
const AUTHORITIES: &str = "authorities";
const CLIENT_ID: &str = "client_id";
const CLIENT_SECRET: &str = "client_secret";
const REFRESH_TOKEN: &str = "refresh_token";
const RESPONSE_TYPE: &str = "response_type";
const ASSERTION: &str = "assertion";
const SCOPE: &str = "scope";
const DISABLE_CACHE: &str = "disable_cache";

/// Collaborators shared by every flow a factory creates.
pub(crate) struct FlowContext<T: HttpTransport, D: TokenDecoder> {
    pub(crate) transport: Arc<T>,
    pub(crate) decoder: Arc<D>,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) timeout: Duration,
}

impl<T: HttpTransport, D: TokenDecoder> Clone for FlowContext<T, D> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            decoder: self.decoder.clone(),
            logger: self.logger.clone(),
            timeout: self.timeout,
        }
    }
}

/// Run a token flow for a finished request.
pub(crate) async fn execute_flow<T: HttpTransport, D: TokenDecoder>(
    context: &FlowContext<T, D>,
    request: TokenFlowRequest,
) -> TokenFlowResult<Jwt> {
    let grant_type = request.grant_type();
    let mut log_context = TokenFlowLogContext::new()
        .grant_type(grant_type)
        .endpoint(request.endpoints().token.as_str());
    if let Some(client_id) = request.client_id() {
        log_context = log_context.client_id(client_id);
    }

    if let Err(error) = request.validate() {
        context.logger.warn(&error.to_string(), &log_context);
        return Err(error);
    }

    let http_request = build_http_request(&request, context.timeout)?;
    context.logger.debug("Requesting token from XSUAA", &log_context);

    let response = match context.transport.send(http_request).await {
        Ok(response) => response,
        Err(error) => {
            context.logger.error(&error.to_string(), &log_context);
            return Err(error);
        }
    };

    if response.status != 200 {
        let error = create_error_from_response(response.status, &response.body, grant_type);
        context.logger.warn(
            &error.to_string(),
            &log_context.extra("status", response.status.to_string()),
        );
        return Err(error);
    }

    let access_token = extract_access_token(&response.body)?;

    // Decode only. Verification belongs to the service receiving the token.
    let jwt = context
        .decoder
        .decode(&access_token, &request.endpoints().key_set)?;

    context.logger.info("Token retrieved from XSUAA", &log_context);
    Ok(jwt)
}

/// Build the POST request for a validated flow request.
pub(crate) fn build_http_request(
    request: &TokenFlowRequest,
    timeout: Duration,
) -> TokenFlowResult<HttpRequest> {
    let mut url = request.token_endpoint()?;
    let mut headers: HashMap<String, String> = HashMap::from([accept_header()]);
    let authorities = build_authorities(request.attributes())?;
    let client_id = request.client_id().unwrap_or_default();

    {
        let mut query = url.query_pairs_mut();
        query.append_pair(GRANT_TYPE, request.grant_type().as_str());

        let mut client_id_in_query = false;
        match request.grant() {
            GrantRequest::ClientCredentials => {}
            GrantRequest::RefreshToken { refresh_token } => {
                if let Some(token) = refresh_token {
                    query.append_pair(REFRESH_TOKEN, token.expose_secret());
                }
            }
            GrantRequest::UserToken {
                token,
                scopes,
                disable_cache,
                ..
            } => {
                query.append_pair(RESPONSE_TYPE, "token");
                query.append_pair(CLIENT_ID, client_id);
                client_id_in_query = true;
                if let Some(token) = token {
                    query.append_pair(ASSERTION, token.expose_secret());
                }
                if !scopes.is_empty() {
                    query.append_pair(SCOPE, &scopes.join(" "));
                }
                if *disable_cache {
                    query.append_pair(DISABLE_CACHE, "true");
                }
            }
        }

        match request.auth_method() {
            ClientAuthMethod::ClientSecretBasic => {
                let secret = request.client_secret().unwrap_or_default();
                headers.insert(
                    AUTHORIZATION_HEADER.to_string(),
                    basic_auth_header(client_id, secret)?,
                );
            }
            ClientAuthMethod::ClientSecretPost => {
                if !client_id_in_query {
                    query.append_pair(CLIENT_ID, client_id);
                }
                query.append_pair(CLIENT_SECRET, request.client_secret().unwrap_or_default());
            }
            ClientAuthMethod::None => {
                if !client_id_in_query {
                    query.append_pair(CLIENT_ID, client_id);
                }
            }
        }

        if let Some(authorities) = &authorities {
            query.append_pair(AUTHORITIES, authorities);
        }
    }

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: url.to_string(),
        headers,
        body: None,
        timeout: Some(timeout),
    })
}

/// Pull the `access_token` out of a successful token response body.
pub(crate) fn extract_access_token(body: &str) -> Result<String, DecodeError> {
    let response: TokenResponse =
        serde_json::from_str(body).map_err(|e| DecodeError::InvalidJson {
            message: e.to_string(),
        })?;

    response
        .access_token()
        .map(str::to_string)
        .ok_or(DecodeError::MissingAccessToken)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_access_token() {
        assert_eq!(
            extract_access_token(r#"{"access_token":"abc.def.ghi","expires_in":43199}"#).unwrap(),
            "abc.def.ghi"
        );
    }

    #[test]
    fn test_extract_access_token_missing() {
        assert!(matches!(
            extract_access_token(r#"{"token_type":"bearer"}"#),
            Err(DecodeError::MissingAccessToken)
        ));
        assert!(matches!(
            extract_access_token(r#"{"access_token":""}"#),
            Err(DecodeError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_extract_access_token_ignores_other_field_types() {
        let bodies = [
            r#"{"access_token":"abc.def.ghi","expires_in":"43199"}"#,
            r#"{"access_token":"abc.def.ghi","scope":["uaa.resource"]}"#,
            r#"{"access_token":"abc.def.ghi","expires_in":-1}"#,
            r#"{"access_token":"abc.def.ghi","refresh_token":null,"token_type":42}"#,
        ];

        for body in bodies {
            assert_eq!(extract_access_token(body).unwrap(), "abc.def.ghi", "{}", body);
        }
    }

    #[test]
    fn test_extract_access_token_not_a_string() {
        assert!(matches!(
            extract_access_token(r#"{"access_token":42}"#),
            Err(DecodeError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_extract_access_token_invalid_json() {
        assert!(matches!(
            extract_access_token("<html>maintenance</html>"),
            Err(DecodeError::InvalidJson { .. })
        ));
    }
}
