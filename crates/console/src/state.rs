//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::ConsoleConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    backend: BackendClient,
}

impl AppState {
    /// Create the state from loaded configuration and an unauthenticated
    /// backend client. Handlers derive per-user clients from it.
    #[must_use]
    pub fn new(config: ConsoleConfig, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, backend }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    /// Backend client without a bearer token.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }
}
