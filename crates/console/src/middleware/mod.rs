//! HTTP middleware stack for the console.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. Route guard (login and OTP redirects)

pub mod auth;
pub mod guard;
pub mod request_id;
pub mod session;

pub use auth::{
    AuthRejection, Authenticated, RequireAuth, RequireSuperAdmin, clear_session, load_session,
    start_session, update_user,
};
pub use guard::{GuardDecision, GuardState, route_guard};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
