//! XSUAA Token Flows
//!
//! Client side token acquisition against the XSUAA OAuth2 server.
//!
//! # Features
//!
//! - Client Credentials Flow (technical user tokens)
//! - Refresh Token Flow (confidential and public clients)
//! - User Token Flow (token exchange, optionally for another tenant subdomain)
//!
//! Each flow performs exactly one HTTP round trip and returns the decoded,
//! unverified JWT. Tokens are not cached, refreshed or retried here.
//!
//! # Example
//!
//! ```rust,ignore
//! use xsuaa_token_flows::{TokenFlowsConfig, XsuaaTokenFlows};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flows = XsuaaTokenFlows::with_defaults(TokenFlowsConfig::default())?;
//!     let base = Url::parse("https://tenant.authentication.eu10.hana.ondemand.com")?;
//!
//!     let jwt = flows
//!         .client_credentials_flow(&base)?
//!         .client("sb-my-app!t123")
//!         .secret("my-client-secret")
//!         .execute()
//!         .await?;
//!
//!     println!("scopes: {:?}", jwt.scopes());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: endpoints, grant types, flow requests and token types
//! - `error`: the `TokenFlowError` taxonomy
//! - `core`: HTTP transport, token decoder and wire helpers
//! - `flows`: flow builders and the shared execution routine
//! - `telemetry`: structured logging
//! - `client`: the `XsuaaTokenFlows` factory

pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod telemetry;
pub mod types;

pub use client::XsuaaTokenFlows;

pub use error::{
    create_error_from_response, parse_error_response, DecodeError, OAuth2ErrorResponse,
    TokenFlowError, TokenFlowResult, TransportError,
};

pub use types::{
    ClientAuthMethod, Endpoints, GrantRequest, GrantType, Jwt, TokenFlowRequest,
    TokenFlowsConfig, TokenResponse,
};

pub use crate::core::{
    accept_header, basic_auth_header, build_authorities, HttpMethod, HttpRequest, HttpResponse,
    HttpTransport, MockHttpTransport, MockTokenDecoder, ReqwestHttpTransport, TokenDecoder,
};

#[cfg(feature = "jwt")]
pub use crate::core::JwtTokenDecoder;

pub use flows::{ClientCredentialsTokenFlow, RefreshTokenFlow, UserTokenFlow};

pub use telemetry::{
    InMemoryLogger, LogEntry, LogLevel, Logger, NoOpLogger, TokenFlowLogContext, TracingLogger,
};
