//! Token Decoding
//!
//! Structural JWT decoding. Signatures are not verified here: that is the
//! job of whoever receives the token, using the key set endpoint.

use std::sync::{Mutex, PoisonError};
use url::Url;

use crate::error::DecodeError;
use crate::types::Jwt;

/// Token decoder interface (for dependency injection).
///
/// Implementations are shared between concurrently executing flows.
pub trait TokenDecoder: Send + Sync {
    /// Decode a compact token string.
    ///
    /// `key_set_uri` is the location of the keys the token was signed with.
    fn decode(&self, token: &str, key_set_uri: &Url) -> Result<Jwt, DecodeError>;
}

#[cfg(feature = "jwt")]
pub use jwt::JwtTokenDecoder;

#[cfg(feature = "jwt")]
mod jwt {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{DateTime, TimeZone, Utc};
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::{Map, Value};
    use url::Url;

    use super::TokenDecoder;
    use crate::error::DecodeError;
    use crate::types::Jwt;

    /// jsonwebtoken based decoder that parses header and claims without
    /// checking the signature or any time based claim.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct JwtTokenDecoder;

    impl JwtTokenDecoder {
        pub fn new() -> Self {
            Self
        }

        fn validation() -> Validation {
            let mut validation = Validation::default();
            validation.insecure_disable_signature_validation();
            validation.validate_exp = false;
            validation.validate_nbf = false;
            validation.validate_aud = false;
            validation.required_spec_claims.clear();
            validation
        }
    }

    impl TokenDecoder for JwtTokenDecoder {
        fn decode(&self, token: &str, _key_set_uri: &Url) -> Result<Jwt, DecodeError> {
            let data = jsonwebtoken::decode::<Map<String, Value>>(
                token,
                &DecodingKey::from_secret(&[]),
                &Self::validation(),
            )
            .map_err(|e| DecodeError::MalformedToken {
                message: e.to_string(),
            })?;

            let headers = decode_header_segment(token)?;
            let claims = data.claims;

            Ok(Jwt::new(
                token,
                timestamp_claim(&claims, "iat"),
                timestamp_claim(&claims, "exp"),
                headers,
                claims,
            ))
        }
    }

    fn decode_header_segment(token: &str) -> Result<Map<String, Value>, DecodeError> {
        let segment = token.split('.').next().unwrap_or_default();
        let bytes = URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .map_err(|e| DecodeError::MalformedToken {
                message: format!("header is not base64url: {}", e),
            })?;

        serde_json::from_slice(&bytes).map_err(|e| DecodeError::MalformedToken {
            message: format!("header is not a JSON object: {}", e),
        })
    }

    fn timestamp_claim(claims: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
        let value = claims.get(name)?;
        let secs = value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// Mock token decoder for testing.
///
/// Records every `(token, key_set_uri)` pair it is asked to decode.
#[derive(Default)]
pub struct MockTokenDecoder {
    calls: Mutex<Vec<(String, Url)>>,
    next_token: Mutex<Option<Jwt>>,
    next_error: Mutex<Option<DecodeError>>,
}

impl MockTokenDecoder {
    /// Create new mock decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this token from the next decode call.
    pub fn set_next_token(&self, token: Jwt) -> &Self {
        *self.next_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self
    }

    /// Fail the next decode call.
    pub fn set_next_error(&self, error: DecodeError) -> &Self {
        *self.next_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    /// Get decode call history.
    pub fn get_calls(&self) -> Vec<(String, Url)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenDecoder for MockTokenDecoder {
    fn decode(&self, token: &str, key_set_uri: &Url) -> Result<Jwt, DecodeError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((token.to_string(), key_set_uri.clone()));

        if let Some(error) = self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }

        if let Some(jwt) = self
            .next_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Ok(jwt);
        }

        Ok(Jwt::new(
            token,
            None,
            None,
            serde_json::Map::new(),
            serde_json::Map::new(),
        ))
    }
}
