//! Session middleware configuration for the console.
//!
//! Sessions hold what a browser build would keep in `localStorage`: the
//! backend bearer token and the serialized user. They live in memory and
//! expire after `CRM_SESSION_HOURS` of inactivity.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ConsoleConfig;

/// Session cookie name for the console.
pub const SESSION_COOKIE_NAME: &str = "shopcrm_session";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &ConsoleConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::hours(config.session_hours),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
