//! Wire Helpers
//!
//! Header values and query parameter encodings sent to XSUAA.

use base64::Engine;
use std::collections::HashMap;

use crate::error::{TokenFlowError, TokenFlowResult};

pub const ACCEPT_HEADER: &str = "accept";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// `accept: application/json` header pair.
pub fn accept_header() -> (String, String) {
    (ACCEPT_HEADER.to_string(), APPLICATION_JSON.to_string())
}

/// `Basic base64(client_id:client_secret)` header value.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> TokenFlowResult<String> {
    if client_id.is_empty() {
        return Err(TokenFlowError::invalid_argument("client ID must not be empty"));
    }
    if client_secret.is_empty() {
        return Err(TokenFlowError::invalid_argument(
            "client secret must not be empty",
        ));
    }

    let credentials = format!("{}:{}", client_id, client_secret);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    Ok(format!("Basic {}", encoded))
}

/// JSON object sent as the `authorities` query parameter.
///
/// Returns `None` for an empty attribute map. The JSON text is embedded in
/// the URI query as-is; percent-encoding happens when the query is built.
pub fn build_authorities(attributes: &HashMap<String, String>) -> TokenFlowResult<Option<String>> {
    if attributes.is_empty() {
        return Ok(None);
    }

    serde_json::to_string(attributes)
        .map(Some)
        .map_err(|e| {
            TokenFlowError::invalid_argument(format!(
                "additional authorization attributes cannot be serialized: {}",
                e
            ))
        })
}
