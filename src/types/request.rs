//! Flow Request
//!
//! Accumulated parameters of a single token flow invocation.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use url::{Host, Url};

use crate::error::{TokenFlowError, TokenFlowResult};
use crate::types::{ClientAuthMethod, Endpoints, GrantType};

/// Grant specific part of a flow request.
#[derive(Clone)]
pub enum GrantRequest {
    /// Client credentials grant, no extra fields.
    ClientCredentials,
    /// Refresh token grant.
    RefreshToken { refresh_token: Option<SecretString> },
    /// User token grant, exchanging an existing user token.
    UserToken {
        token: Option<SecretString>,
        subdomain: Option<String>,
        scopes: Vec<String>,
        disable_cache: bool,
    },
}

impl GrantRequest {
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::ClientCredentials => GrantType::ClientCredentials,
            Self::RefreshToken { .. } => GrantType::RefreshToken,
            Self::UserToken { .. } => GrantType::UserToken,
        }
    }
}

/// Parameters accumulated by a flow builder.
///
/// Only the owning builder mutates a request; it is consumed by the
/// builder's `execute` and never reused.
#[derive(Clone)]
pub struct TokenFlowRequest {
    endpoints: Endpoints,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    auth_method: ClientAuthMethod,
    attributes: HashMap<String, String>,
    grant: GrantRequest,
}

impl TokenFlowRequest {
    /// Create an empty request bound to the given endpoints.
    pub fn new(endpoints: Endpoints, grant: GrantRequest) -> Self {
        Self {
            endpoints,
            client_id: None,
            client_secret: None,
            auth_method: ClientAuthMethod::default(),
            attributes: HashMap::new(),
            grant,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn grant(&self) -> &GrantRequest {
        &self.grant
    }

    pub fn grant_type(&self) -> GrantType {
        self.grant.grant_type()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn auth_method(&self) -> ClientAuthMethod {
        self.auth_method
    }

    /// Additional authorization attributes.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub(crate) fn set_client_id(&mut self, client_id: String) {
        self.client_id = Some(client_id);
    }

    pub(crate) fn set_client_secret(&mut self, client_secret: String) {
        self.client_secret = Some(SecretString::new(client_secret));
    }

    pub(crate) fn set_auth_method(&mut self, auth_method: ClientAuthMethod) {
        self.auth_method = auth_method;
    }

    pub(crate) fn set_attributes(&mut self, attributes: HashMap<String, String>) {
        self.attributes = attributes;
    }

    pub(crate) fn grant_mut(&mut self) -> &mut GrantRequest {
        &mut self.grant
    }

    /// Whether the client secret is mandatory for this request.
    pub fn requires_client_secret(&self) -> bool {
        match self.grant {
            GrantRequest::ClientCredentials => true,
            _ => self.auth_method != ClientAuthMethod::None,
        }
    }

    /// Check all grant mandatory fields are set.
    pub fn validate(&self) -> TokenFlowResult<()> {
        let grant_type = self.grant_type();

        if is_blank(self.client_id.as_deref()) {
            return Err(missing_field(grant_type, "client ID"));
        }

        if grant_type == GrantType::ClientCredentials
            && self.auth_method == ClientAuthMethod::None
        {
            return Err(TokenFlowError::validation(format!(
                "{} flow request is not valid. The grant requires an authenticated client.",
                grant_type.flow_name()
            )));
        }

        if self.requires_client_secret() && is_blank(self.client_secret()) {
            return Err(missing_field(grant_type, "client secret"));
        }

        match &self.grant {
            GrantRequest::ClientCredentials => {}
            GrantRequest::RefreshToken { refresh_token } => {
                if is_blank(refresh_token.as_ref().map(|t| t.expose_secret().as_str())) {
                    return Err(missing_field(grant_type, "refresh token"));
                }
            }
            GrantRequest::UserToken {
                token, subdomain, ..
            } => {
                if is_blank(token.as_ref().map(|t| t.expose_secret().as_str())) {
                    return Err(missing_field(grant_type, "user token"));
                }
                if let Some(subdomain) = subdomain {
                    if subdomain.trim().is_empty() {
                        return Err(missing_field(grant_type, "subdomain"));
                    }
                    replace_subdomain(&self.endpoints.token, subdomain)?;
                }
            }
        }

        Ok(())
    }

    /// Token endpoint this request is sent to.
    ///
    /// For user token requests with a subdomain the first label of the
    /// endpoint host is replaced by that subdomain.
    pub fn token_endpoint(&self) -> TokenFlowResult<Url> {
        match &self.grant {
            GrantRequest::UserToken {
                subdomain: Some(subdomain),
                ..
            } => replace_subdomain(&self.endpoints.token, subdomain),
            _ => Ok(self.endpoints.token.clone()),
        }
    }
}

impl std::fmt::Debug for TokenFlowRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFlowRequest")
            .field("grant_type", &self.grant_type())
            .field("endpoints", &self.endpoints)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_method", &self.auth_method)
            .field("attributes", &self.attributes)
            .finish()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn missing_field(grant_type: GrantType, field: &str) -> TokenFlowError {
    TokenFlowError::validation(format!(
        "{} flow request is not valid. Make sure all mandatory fields are set (missing {}).",
        grant_type.flow_name(),
        field
    ))
}

fn replace_subdomain(endpoint: &Url, subdomain: &str) -> TokenFlowResult<Url> {
    let rest = match endpoint.host() {
        Some(Host::Domain(domain)) => domain.split_once('.').map(|(_, rest)| rest.to_string()),
        _ => None,
    };

    let rest = rest.ok_or_else(|| {
        TokenFlowError::validation(format!(
            "Token endpoint '{}' has no subdomain that could be replaced by '{}'.",
            endpoint, subdomain
        ))
    })?;

    let mut url = endpoint.clone();
    url.set_host(Some(format!("{}.{}", subdomain, rest).as_str()))
        .map_err(|e| {
            TokenFlowError::validation(format!("Subdomain '{}' is not valid: {}", subdomain, e))
        })?;
    Ok(url)
}
