//! Configuration Types
//!
//! Endpoint, grant and client configuration for XSUAA token flows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{TokenFlowError, TokenFlowResult};

/// Path of the token endpoint below the XSUAA base URI.
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth/token";
/// Path of the authorize endpoint below the XSUAA base URI.
pub const AUTHORIZE_ENDPOINT_PATH: &str = "/oauth/authorize";
/// Path of the key set endpoint below the XSUAA base URI.
pub const KEY_SET_ENDPOINT_PATH: &str = "/token_keys";

/// Default configuration values.
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1048576;

/// Token flow configuration shared by all flows of a factory.
#[derive(Clone, Debug)]
pub struct TokenFlowsConfig {
    /// HTTP timeout applied to each token request.
    pub timeout: Duration,
    /// Largest response body accepted by the reqwest transport.
    pub max_response_size: usize,
}

impl Default for TokenFlowsConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl TokenFlowsConfig {
    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum response size.
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

/// The three XSUAA endpoints a flow is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Token endpoint URL.
    pub token: Url,
    /// Authorize endpoint URL.
    pub authorize: Url,
    /// Key set (JWKS) endpoint URL.
    pub key_set: Url,
}

impl Endpoints {
    /// Use explicit endpoint URLs verbatim.
    pub fn new(token: Url, authorize: Url, key_set: Url) -> Self {
        Self {
            token,
            authorize,
            key_set,
        }
    }

    /// Derive all endpoints from the XSUAA base URI.
    ///
    /// Scheme, host, port and any existing path prefix of `base` are kept;
    /// query and fragment are dropped.
    pub fn from_base_uri(base: &Url) -> TokenFlowResult<Self> {
        Ok(Self {
            token: join_path(base, TOKEN_ENDPOINT_PATH)?,
            authorize: join_path(base, AUTHORIZE_ENDPOINT_PATH)?,
            key_set: join_path(base, KEY_SET_ENDPOINT_PATH)?,
        })
    }

    /// Parse the base URI and derive all endpoints from it.
    pub fn parse(base: &str) -> TokenFlowResult<Self> {
        let base = Url::parse(base).map_err(|e| {
            TokenFlowError::invalid_argument(format!("XSUAA base URI '{}' is invalid: {}", base, e))
        })?;
        Self::from_base_uri(&base)
    }
}

fn join_path(base: &Url, path: &str) -> TokenFlowResult<Url> {
    if base.cannot_be_a_base() {
        return Err(TokenFlowError::invalid_argument(format!(
            "XSUAA base URI '{}' cannot carry a path",
            base
        )));
    }

    let mut url = base.clone();
    let joined = format!("{}{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Client authentication method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// HTTP Basic Authentication header.
    #[default]
    ClientSecretBasic,
    /// client_id and client_secret as query parameters.
    ClientSecretPost,
    /// No client secret (public client), client_id as query parameter.
    None,
}

/// Grant type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    #[serde(rename = "client_credentials")]
    ClientCredentials,
    #[serde(rename = "refresh_token")]
    RefreshToken,
    #[serde(rename = "user_token")]
    UserToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
            Self::UserToken => "user_token",
        }
    }

    /// Human readable flow name used in validation messages.
    pub fn flow_name(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "Client credentials",
            Self::RefreshToken => "Refresh token",
            Self::UserToken => "User token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
