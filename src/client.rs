//! Token Flows Factory
//!
//! Entry point handing out flow builders bound to a shared transport,
//! decoder and logger.

use std::sync::Arc;
use url::Url;

use crate::core::{HttpTransport, TokenDecoder};
use crate::error::TokenFlowResult;
use crate::flows::{ClientCredentialsTokenFlow, FlowContext, RefreshTokenFlow, UserTokenFlow};
use crate::telemetry::{Logger, TracingLogger};
use crate::types::{Endpoints, TokenFlowsConfig};

/// Factory for XSUAA token flows.
///
/// The transport and decoder are injected once and shared by every flow
/// created here; flows may run concurrently.
pub struct XsuaaTokenFlows<T: HttpTransport, D: TokenDecoder> {
    transport: Arc<T>,
    decoder: Arc<D>,
    logger: Arc<dyn Logger>,
    config: TokenFlowsConfig,
}

#[cfg(feature = "jwt")]
impl XsuaaTokenFlows<crate::core::ReqwestHttpTransport, crate::core::JwtTokenDecoder> {
    /// Create a factory with the reqwest transport and the jsonwebtoken decoder.
    pub fn with_defaults(config: TokenFlowsConfig) -> TokenFlowResult<Self> {
        let transport = crate::core::ReqwestHttpTransport::from_config(&config)?;
        Ok(Self::new(transport, crate::core::JwtTokenDecoder::new()).with_config(config))
    }
}

impl<T: HttpTransport, D: TokenDecoder> XsuaaTokenFlows<T, D> {
    /// Create a factory from a transport and a token decoder.
    pub fn new(transport: T, decoder: D) -> Self {
        Self::from_shared(Arc::new(transport), Arc::new(decoder))
    }

    /// Create a factory from collaborators that are already shared.
    pub fn from_shared(transport: Arc<T>, decoder: Arc<D>) -> Self {
        Self {
            transport,
            decoder,
            logger: Arc::new(TracingLogger::new()),
            config: TokenFlowsConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TokenFlowsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &TokenFlowsConfig {
        &self.config
    }

    fn context(&self) -> FlowContext<T, D> {
        FlowContext {
            transport: self.transport.clone(),
            decoder: self.decoder.clone(),
            logger: self.logger.clone(),
            timeout: self.config.timeout,
        }
    }

    /// Start a client credentials flow against the XSUAA at `base_uri`.
    pub fn client_credentials_flow(
        &self,
        base_uri: &Url,
    ) -> TokenFlowResult<ClientCredentialsTokenFlow<T, D>> {
        let endpoints = Endpoints::from_base_uri(base_uri)?;
        Ok(ClientCredentialsTokenFlow::new(self.context(), endpoints))
    }

    /// Start a client credentials flow with explicit endpoints.
    pub fn client_credentials_flow_with_endpoints(
        &self,
        token_endpoint: Url,
        authorize_endpoint: Url,
        key_set_endpoint: Url,
    ) -> ClientCredentialsTokenFlow<T, D> {
        let endpoints = Endpoints::new(token_endpoint, authorize_endpoint, key_set_endpoint);
        ClientCredentialsTokenFlow::new(self.context(), endpoints)
    }

    /// Start a refresh token flow against the XSUAA at `base_uri`.
    pub fn refresh_token_flow(&self, base_uri: &Url) -> TokenFlowResult<RefreshTokenFlow<T, D>> {
        let endpoints = Endpoints::from_base_uri(base_uri)?;
        Ok(RefreshTokenFlow::new(self.context(), endpoints))
    }

    /// Start a refresh token flow with explicit endpoints.
    pub fn refresh_token_flow_with_endpoints(
        &self,
        token_endpoint: Url,
        authorize_endpoint: Url,
        key_set_endpoint: Url,
    ) -> RefreshTokenFlow<T, D> {
        let endpoints = Endpoints::new(token_endpoint, authorize_endpoint, key_set_endpoint);
        RefreshTokenFlow::new(self.context(), endpoints)
    }

    /// Start a user token flow against the XSUAA at `base_uri`.
    pub fn user_token_flow(&self, base_uri: &Url) -> TokenFlowResult<UserTokenFlow<T, D>> {
        let endpoints = Endpoints::from_base_uri(base_uri)?;
        Ok(UserTokenFlow::new(self.context(), endpoints))
    }

    /// Start a user token flow with explicit endpoints.
    pub fn user_token_flow_with_endpoints(
        &self,
        token_endpoint: Url,
        authorize_endpoint: Url,
        key_set_endpoint: Url,
    ) -> UserTokenFlow<T, D> {
        let endpoints = Endpoints::new(token_endpoint, authorize_endpoint, key_set_endpoint);
        UserTokenFlow::new(self.context(), endpoints)
    }
}
