//! Entry point that hands out `RestRequest` builders.
//!
//! # Design
//! `RestClient` holds only configuration and a shared transport; it carries
//! no per-request state, so it is cheap to clone and can be shared between
//! threads. Each call to `request` returns an independent builder
//! pre-filled with the configured default credentials and `Accept` type.
//! Relative targets are resolved against the optional base URL.

use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::request::RestRequest;
use crate::transport::{Transport, UreqTransport};

#[derive(Clone)]
pub struct RestClient {
    base_url: Option<Url>,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl RestClient {
    /// Client backed by a blocking ureq transport built from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout_duration(), config.user_agent.clone());
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: None,
            config,
            transport,
        }
    }

    /// Resolves relative targets against `base_url`. An unparseable base is
    /// ignored and targets are then used verbatim.
    pub fn base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.base_url = Url::parse(&format!("{base}/")).ok();
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A new builder for `target` with client defaults applied.
    pub fn request(&self, target: &str) -> RestRequest {
        let mut request = RestRequest::new(&self.resolve(target), Arc::clone(&self.transport));
        if let Some(credentials) = &self.config.credentials {
            request = request.credentials(credentials.clone());
        }
        if let Some(accept) = &self.config.accept {
            request = request.accept(accept);
        }
        request
    }

    fn resolve(&self, target: &str) -> String {
        if Url::parse(target).is_ok() {
            return target.to_string();
        }
        match &self.base_url {
            Some(base) => base
                .join(target.trim_start_matches('/'))
                .map(String::from)
                .unwrap_or_else(|_| target.to_string()),
            None => target.to_string(),
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
