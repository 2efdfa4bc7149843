//! Token Types
//!
//! Token endpoint response body and the decoded JWT handed to callers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Token response from XSUAA.
///
/// Only `access_token` is interpreted. The remaining fields are kept as
/// raw JSON, so an unusual type in one of them never rejects the body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenResponse {
    /// Access token (compact JWT).
    #[serde(default)]
    pub access_token: Option<Value>,
    /// Token type (usually "bearer").
    #[serde(default)]
    pub token_type: Option<Value>,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<Value>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<Value>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<Value>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TokenResponse {
    /// The access token, if present as a non-empty string.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }
}

/// Decoded, unverified JWT.
///
/// Produced by a [`TokenDecoder`](crate::core::TokenDecoder); flows return it
/// exactly as the decoder built it.
#[derive(Clone, Debug, PartialEq)]
pub struct Jwt {
    token_value: String,
    headers: Map<String, Value>,
    claims: Map<String, Value>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl Jwt {
    /// Create a decoded token.
    pub fn new(
        token_value: impl Into<String>,
        issued_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
        headers: Map<String, Value>,
        claims: Map<String, Value>,
    ) -> Self {
        Self {
            token_value: token_value.into(),
            headers,
            claims,
            issued_at,
            expires_at,
        }
    }

    /// The compact token string as returned by XSUAA.
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Get a claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Get a string claim by name.
    pub fn string_claim(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }

    /// Scopes from the `scope` claim, which XSUAA issues as an array.
    /// A space separated string is accepted too.
    pub fn scopes(&self) -> Vec<String> {
        match self.claim("scope") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
            _ => Vec::new(),
        }
    }

    /// The `client_id` claim (falling back to `cid`).
    pub fn client_id(&self) -> Option<&str> {
        self.string_claim("client_id")
            .or_else(|| self.string_claim("cid"))
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| exp <= Utc::now())
            .unwrap_or(false)
    }
}
