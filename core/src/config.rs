//! Client-wide defaults applied to every request a `RestClient` creates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Credentials;

pub const DEFAULT_USER_AGENT: &str = concat!("rest-core/", env!("CARGO_PKG_VERSION"));

/// Settings for a `RestClient`.
///
/// Deserializable so an embedding application can load it from its own
/// configuration file; missing fields fall back to `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Overall timeout for one HTTP call in milliseconds, passed to the
    /// transport. `None` means no timeout.
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    /// Credentials pre-filled on every new request.
    pub credentials: Option<Credentials>,
    /// `Accept` value pre-filled on every new request.
    pub accept: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            credentials: None,
            accept: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn accept(mut self, media_type: &str) -> Self {
        self.accept = Some(media_type.to_string());
        self
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
