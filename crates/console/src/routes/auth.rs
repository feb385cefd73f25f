//! Login, logout, OTP and session endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use shopcrm_core::{BranchId, Phone, ShopId};

use crate::backend::{LoginRequest, OtpRequest, OtpTicket, OtpVerifyRequest};
use crate::error::{AppError, clear_sentry_user};
use crate::middleware::guard::{LOGIN_PATH, VERIFY_OTP_PATH};
use crate::middleware::{RequireAuth, clear_session, load_session, start_session, update_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page))
        .route(VERIFY_OTP_PATH, get(verify_otp_page))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/otp/request", post(request_otp))
        .route("/api/auth/otp/verify", post(verify_otp))
        .route("/api/session", get(current_session))
}

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// LINE access token when signing in through LINE.
    #[serde(default)]
    pub line_token: Option<String>,
}

/// Where the client should go after a successful auth step.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: CurrentUser,
    pub redirect: &'static str,
}

/// Path a freshly authenticated user lands on.
fn landing_path(user: &CurrentUser) -> &'static str {
    if user.needs_otp() {
        VERIFY_OTP_PATH
    } else {
        "/"
    }
}

/// Login page state.
async fn login_page(session: Session) -> Result<Json<Value>, AppError> {
    let authenticated = load_session(&session).await?.is_some();
    Ok(Json(json!({ "page": "login", "authenticated": authenticated })))
}

/// OTP page state: the masked phone the code goes to.
async fn verify_otp_page(RequireAuth(auth): RequireAuth) -> Json<Value> {
    let phone = auth
        .user
        .phone
        .as_deref()
        .and_then(|p| Phone::parse(p).ok())
        .map(|p| p.masked());
    Json(json!({
        "page": "verify-otp",
        "phone": phone,
        "verified": auth.user.otp_verify,
    }))
}

/// Exchange credentials for a session.
///
/// # Errors
///
/// Returns 422 for blank fields, or the backend's 401 for bad credentials.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut errors = FieldErrors::new();
    errors.require("username", &form.username);
    errors.require("password", &form.password);
    errors.finish()?;

    let response = state
        .backend()
        .login(&LoginRequest {
            username: form.username.trim().to_string(),
            password: form.password,
        })
        .await?;

    let line_token = form.line_token.as_deref().filter(|t| !t.is_empty());
    let user = start_session(&session, &response, line_token).await?;
    info!(user_id = %user.id, role = user.role.as_str(), "user logged in");

    Ok(Json(AuthResponse {
        redirect: landing_path(&user),
        user,
    }))
}

/// Clear the session.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_session(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct OtpRequestForm {
    /// Defaults to the session user's phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Send an OTP to the user's phone.
///
/// # Errors
///
/// Returns 422 for an invalid phone, or any backend error.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn request_otp(
    RequireAuth(auth): RequireAuth,
    Json(form): Json<OtpRequestForm>,
) -> Result<Json<OtpTicket>, AppError> {
    let raw = form.phone.or_else(|| auth.user.phone.clone()).unwrap_or_default();
    let phone = Phone::parse(&raw).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.add("phone", e.to_string());
        AppError::Validation(errors)
    })?;

    let ticket = auth
        .api
        .request_otp(&OtpRequest {
            phone: phone.as_str().to_string(),
        })
        .await?;
    info!(phone = %phone.masked(), "otp requested");

    Ok(Json(ticket))
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyForm {
    pub otp: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ref_code: Option<String>,
}

/// Verify an OTP and mark the session user as verified.
///
/// # Errors
///
/// Returns 400 when the code is wrong, or any backend error.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn verify_otp(
    RequireAuth(auth): RequireAuth,
    session: Session,
    Json(form): Json<OtpVerifyForm>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut errors = FieldErrors::new();
    errors.require("otp", &form.otp);
    errors.finish()?;

    let phone = form
        .phone
        .or_else(|| auth.user.phone.clone())
        .ok_or_else(|| AppError::BadRequest("No phone number to verify".to_string()))?;

    let result = auth
        .api
        .verify_otp(&OtpVerifyRequest {
            phone,
            otp: form.otp.trim().to_string(),
            ref_code: form.ref_code,
        })
        .await?;

    if !result.verified {
        return Err(AppError::BadRequest("Invalid OTP".to_string()));
    }

    let user = CurrentUser {
        otp_verify: true,
        ..auth.user
    };
    update_user(&session, &user).await?;
    info!("otp verified");

    Ok(Json(AuthResponse {
        redirect: landing_path(&user),
        user,
    }))
}

/// What the page layer needs from the session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: CurrentUser,
    pub shop_id: Option<ShopId>,
    pub branch_id: Option<BranchId>,
    pub has_line_token: bool,
}

/// Current session contents (token excluded).
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn current_session(
    RequireAuth(auth): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(SessionView {
        shop_id: session.get(session_keys::SHOP_ID).await?,
        branch_id: session.get(session_keys::BRANCH_ID).await?,
        has_line_token: session
            .get::<String>(session_keys::LINE_TOKEN)
            .await?
            .is_some(),
        user: auth.user,
    }))
}

#[cfg(test)]
mod tests {
    use shopcrm_core::{Role, UserId};

    use super::*;

    fn user(role: Role, otp_verify: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Test".to_string(),
            role,
            shop_id: None,
            branch_id: None,
            phone: None,
            otp_verify,
        }
    }

    #[test]
    fn test_landing_path() {
        assert_eq!(landing_path(&user(Role::Customer, false)), VERIFY_OTP_PATH);
        assert_eq!(landing_path(&user(Role::Customer, true)), "/");
        assert_eq!(landing_path(&user(Role::Admin, false)), "/");
    }
}
