//! Auth/OTP route guard.
//!
//! Every request outside the public paths is checked against the session:
//!
//! | Session                               | Result                           |
//! |---------------------------------------|----------------------------------|
//! | no token                              | redirect to `/login`             |
//! | stored user does not parse            | session flushed, to `/login`     |
//! | customer with `otp_verify == false`   | redirect to `/verify-otp`        |
//! | anything else                         | pass                             |
//!
//! Page paths get a `303 See Other`. Paths under `/api/` get a JSON body
//! carrying the redirect target (401 for login, 403 for OTP) so a client
//! can navigate itself.

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// OTP verification page path.
pub const VERIFY_OTP_PATH: &str = "/verify-otp";

/// Paths reachable without a session.
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    LOGIN_PATH,
    "/api/auth/login",
    "/api/auth/logout",
];

/// Paths a customer may visit before verifying their phone.
const OTP_EXEMPT_PATHS: &[&str] = &[LOGIN_PATH, VERIFY_OTP_PATH, "/api/auth/logout"];

/// Prefix of the OTP endpoints, also exempt.
const OTP_API_PREFIX: &str = "/api/auth/otp/";

/// What the guard knows about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GuardState {
    /// Session not read yet.
    #[default]
    Checking,
    /// Token present and the stored user parsed.
    Authenticated(CurrentUser),
    /// No token or no user.
    Unauthenticated,
}

/// Raw session values the guard resolves from.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<Value>,
}

/// The stored user exists but cannot be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptSession;

impl GuardState {
    /// Resolve `Checking` from the session contents.
    ///
    /// # Errors
    ///
    /// Returns `CorruptSession` when a token is present but the stored user
    /// does not deserialize; the caller clears the session.
    pub fn resolve(snapshot: SessionSnapshot) -> Result<Self, CorruptSession> {
        if snapshot.token.is_none_or(|t| t.is_empty()) {
            return Ok(Self::Unauthenticated);
        }

        match snapshot.user {
            None => Ok(Self::Unauthenticated),
            Some(value) => serde_json::from_value::<CurrentUser>(value)
                .map(Self::Authenticated)
                .map_err(|_| CorruptSession),
        }
    }
}

/// Outcome of guarding one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToLogin,
    RedirectToVerifyOtp,
}

/// Whether `path` needs no session at all.
#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

fn is_otp_exempt(path: &str) -> bool {
    OTP_EXEMPT_PATHS.contains(&path) || path.starts_with(OTP_API_PREFIX)
}

/// Decide what happens to a request for `path` in `state`.
#[must_use]
pub fn decide(path: &str, state: &GuardState) -> GuardDecision {
    if is_public(path) {
        return GuardDecision::Pass;
    }

    match state {
        GuardState::Checking | GuardState::Unauthenticated => GuardDecision::RedirectToLogin,
        GuardState::Authenticated(user) if user.needs_otp() && !is_otp_exempt(path) => {
            GuardDecision::RedirectToVerifyOtp
        }
        GuardState::Authenticated(_) => GuardDecision::Pass,
    }
}

fn redirect_response(path: &str, decision: GuardDecision) -> Response {
    let is_api = path.starts_with("/api/");
    match (decision, is_api) {
        (GuardDecision::RedirectToLogin, false) => Redirect::to(LOGIN_PATH).into_response(),
        (GuardDecision::RedirectToVerifyOtp, false) => {
            Redirect::to(VERIFY_OTP_PATH).into_response()
        }
        (GuardDecision::RedirectToLogin, true) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Please log in", "redirect": LOGIN_PATH })),
        )
            .into_response(),
        (GuardDecision::RedirectToVerifyOtp, true) => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Phone verification required",
                "redirect": VERIFY_OTP_PATH,
            })),
        )
            .into_response(),
        (GuardDecision::Pass, _) => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn snapshot(session: &Session) -> Result<SessionSnapshot, tower_sessions::session::Error> {
    Ok(SessionSnapshot {
        token: session.get::<String>(session_keys::AUTH_TOKEN).await?,
        user: session.get::<Value>(session_keys::USER).await?,
    })
}

/// Middleware applying [`decide`] to every request.
pub async fn route_guard(session: Session, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_public(&path) {
        return next.run(request).await;
    }

    let snapshot = match snapshot(&session).await {
        Ok(snapshot) => snapshot,
        Err(err) => return AppError::Session(err).into_response(),
    };

    let state = match GuardState::resolve(snapshot) {
        Ok(state) => state,
        Err(CorruptSession) => {
            warn!(%path, "stored user could not be parsed, clearing session");
            if let Err(err) = session.flush().await {
                warn!(error = %err, "failed to flush corrupt session");
            }
            return redirect_response(&path, GuardDecision::RedirectToLogin);
        }
    };

    if let GuardState::Authenticated(user) = &state {
        set_sentry_user(user.id.as_str(), user.role.as_str());
    }

    match decide(&path, &state) {
        GuardDecision::Pass => next.run(request).await,
        decision => {
            debug!(%path, ?decision, "route guard redirect");
            redirect_response(&path, decision)
        }
    }
}

#[cfg(test)]
mod tests {
    use shopcrm_core::{Role, ShopId, UserId};

    use super::*;

    fn user(role: Role, otp_verify: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Test".to_string(),
            role,
            shop_id: Some(ShopId::new("s1")),
            branch_id: None,
            phone: Some("0812345678".to_string()),
            otp_verify,
        }
    }

    fn authed(role: Role, otp_verify: bool) -> GuardState {
        GuardState::Authenticated(user(role, otp_verify))
    }

    #[test]
    fn test_unverified_customer_sent_to_verify_otp() {
        let state = authed(Role::Customer, false);
        for path in ["/", "/dashboard", "/api/customers", "/api/navigation", "/api/session"] {
            assert_eq!(decide(path, &state), GuardDecision::RedirectToVerifyOtp, "{path}");
        }
    }

    #[test]
    fn test_unverified_customer_may_reach_login_and_verify() {
        let state = authed(Role::Customer, false);
        assert_eq!(decide("/verify-otp", &state), GuardDecision::Pass);
        assert_eq!(decide("/login", &state), GuardDecision::Pass);
        assert_eq!(decide("/api/auth/otp/verify", &state), GuardDecision::Pass);
    }

    #[test]
    fn test_verified_and_staff_pass() {
        assert_eq!(decide("/api/customers", &authed(Role::Customer, true)), GuardDecision::Pass);
        assert_eq!(decide("/api/customers", &authed(Role::Employee, false)), GuardDecision::Pass);
        assert_eq!(decide("/api/shops", &authed(Role::SuperAdmin, false)), GuardDecision::Pass);
    }

    #[test]
    fn test_unauthenticated_sent_to_login() {
        assert_eq!(
            decide("/verify-otp", &GuardState::Unauthenticated),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(decide("/api/customers", &GuardState::Checking), GuardDecision::RedirectToLogin);
        assert_eq!(decide("/login", &GuardState::Unauthenticated), GuardDecision::Pass);
        assert_eq!(decide("/health", &GuardState::Unauthenticated), GuardDecision::Pass);
    }

    #[test]
    fn test_resolve_without_token() {
        let state = GuardState::resolve(SessionSnapshot {
            token: None,
            user: Some(json!({"id": "u1", "name": "A", "role": "admin"})),
        });
        assert_eq!(state, Ok(GuardState::Unauthenticated));
    }

    #[test]
    fn test_resolve_parses_user() {
        let state = GuardState::resolve(SessionSnapshot {
            token: Some("tok".to_string()),
            user: Some(json!({"id": "u1", "name": "A", "role": "Customer"})),
        })
        .unwrap();
        match state {
            GuardState::Authenticated(user) => assert!(user.needs_otp()),
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_flags_corrupt_user() {
        let state = GuardState::resolve(SessionSnapshot {
            token: Some("tok".to_string()),
            user: Some(json!("not a user")),
        });
        assert_eq!(state, Err(CorruptSession));
    }

    #[test]
    fn test_api_redirects_are_json() {
        let response = redirect_response("/api/customers", GuardDecision::RedirectToVerifyOtp);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = redirect_response("/dashboard", GuardDecision::RedirectToLogin);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }
}
