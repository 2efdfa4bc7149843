//! User Token Flow
//!
//! Exchanges an existing user token for a token issued to this client,
//! optionally for another tenant subdomain.

use secrecy::SecretString;
use std::collections::HashMap;

use super::{execute_flow, FlowContext};
use crate::core::{HttpTransport, TokenDecoder};
use crate::error::TokenFlowResult;
use crate::types::{ClientAuthMethod, Endpoints, GrantRequest, Jwt, TokenFlowRequest};

/// User token flow builder.
pub struct UserTokenFlow<T: HttpTransport, D: TokenDecoder> {
    context: FlowContext<T, D>,
    request: TokenFlowRequest,
}

impl<T: HttpTransport, D: TokenDecoder> UserTokenFlow<T, D> {
    pub(crate) fn new(context: FlowContext<T, D>, endpoints: Endpoints) -> Self {
        Self {
            context,
            request: TokenFlowRequest::new(
                endpoints,
                GrantRequest::UserToken {
                    token: None,
                    subdomain: None,
                    scopes: Vec::new(),
                    disable_cache: false,
                },
            ),
        }
    }

    /// Set the user token to exchange.
    pub fn token(mut self, user_token: impl Into<String>) -> Self {
        if let GrantRequest::UserToken { token, .. } = self.request.grant_mut() {
            *token = Some(SecretString::new(user_token.into()));
        }
        self
    }

    /// Request the token from another tenant, addressed by its subdomain.
    pub fn subdomain(mut self, value: impl Into<String>) -> Self {
        if let GrantRequest::UserToken { subdomain, .. } = self.request.grant_mut() {
            *subdomain = Some(value.into());
        }
        self
    }

    /// Narrow the scopes of the issued token.
    pub fn scopes<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let GrantRequest::UserToken { scopes, .. } = self.request.grant_mut() {
            *scopes = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Ask XSUAA to bypass its token cache.
    pub fn disable_cache(mut self, disable: bool) -> Self {
        if let GrantRequest::UserToken { disable_cache, .. } = self.request.grant_mut() {
            *disable_cache = disable;
        }
        self
    }

    /// Set the ID of the OAuth client the token is issued to.
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.request.set_client_id(client_id.into());
        self
    }

    /// Set the client secret. Not needed with [`ClientAuthMethod::None`].
    pub fn secret(mut self, client_secret: impl Into<String>) -> Self {
        self.request.set_client_secret(client_secret.into());
        self
    }

    /// Request additional attributes in the `az_attr` claim of the token.
    pub fn attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.request.set_attributes(attributes);
        self
    }

    /// Choose how the client credentials are sent. With
    /// [`ClientAuthMethod::None`] only the client ID is sent.
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
