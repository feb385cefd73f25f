//! Authentication extractors and session helpers.
//!
//! The route guard decides whether a request may proceed at all; these
//! extractors hand the handler the session user together with a backend
//! client carrying that user's bearer token, and enforce role and shop
//! scoping.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::json;
use tower_sessions::Session;

use shopcrm_core::{Role, ShopId};

use crate::backend::{BackendClient, LoginResponse};
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Session user plus a backend client authenticated as them.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: CurrentUser,
    pub api: BackendClient,
}

impl Authenticated {
    /// Reject unless the user has one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` otherwise.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.user.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "The {} role cannot access this resource",
                self.user.role
            )))
        }
    }

    /// Reject unless the user is staff (superadmin, admin or employee).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for customers.
    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_any(&[Role::SuperAdmin, Role::Admin, Role::Employee])
    }

    /// Resolve the shop a request operates on.
    ///
    /// Superadmins must name the shop. Everyone else is pinned to the
    /// session's shop; naming a different one is forbidden.
    ///
    /// # Errors
    ///
    /// `BadRequest` when a superadmin omits the shop, `Forbidden` on a
    /// mismatch or when a shop user has no shop in the session.
    pub fn scope_shop(&self, requested: Option<&ShopId>) -> Result<ShopId, AppError> {
        scope_shop(&self.user, requested)
    }
}

/// Shop scoping rule shared by the extractor and services.
///
/// # Errors
///
/// See [`Authenticated::scope_shop`].
pub fn scope_shop(user: &CurrentUser, requested: Option<&ShopId>) -> Result<ShopId, AppError> {
    if !user.role.is_shop_scoped() {
        return requested
            .cloned()
            .ok_or_else(|| AppError::BadRequest("shop_id is required".to_string()));
    }

    let own = user
        .shop_id
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("No shop is attached to this account".to_string()))?;

    match requested {
        Some(shop_id) if shop_id != own => Err(AppError::Forbidden(
            "You do not have access to this shop".to_string(),
        )),
        _ => Ok(own.clone()),
    }
}

/// Extractor that requires an authenticated session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(auth): RequireAuth) -> Result<Json<Customer>, AppError> {
///     Ok(Json(auth.api.get_customer(&id).await?))
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

/// Extractor that requires a superadmin session.
pub struct RequireSuperAdmin(pub Authenticated);

/// Error returned when an extractor's requirements are not met.
#[derive(Debug)]
pub enum AuthRejection {
    /// No usable session.
    Unauthorized,
    /// Session exists but the role is not allowed.
    Forbidden,
    /// The session store failed.
    Session(tower_sessions::session::Error),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please log in", "redirect": "/login" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Only super admins can access this resource" })),
            )
                .into_response(),
            Self::Session(err) => AppError::Session(err).into_response(),
        }
    }
}

/// Read the bearer token and user from the session.
///
/// Returns `Ok(None)` when either is missing or the user does not parse.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_session(
    session: &Session,
) -> Result<Option<(SecretString, CurrentUser)>, tower_sessions::session::Error> {
    let Some(token) = session.get::<String>(session_keys::AUTH_TOKEN).await? else {
        return Ok(None);
    };
    let user = session
        .get::<serde_json::Value>(session_keys::USER)
        .await?
        .and_then(|value| serde_json::from_value::<CurrentUser>(value).ok());

    Ok(user.map(|user| (SecretString::from(token), user)))
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let (token, user) = load_session(session)
            .await
            .map_err(AuthRejection::Session)?
            .ok_or(AuthRejection::Unauthorized)?;

        Ok(Self(Authenticated {
            user,
            api: state.backend().with_token(token),
        }))
    }
}

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(auth) = RequireAuth::from_request_parts(parts, state).await?;

        if auth.user.role != Role::SuperAdmin {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(auth))
    }
}

/// Store a successful login in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn start_session(
    session: &Session,
    login: &LoginResponse,
    line_token: Option<&str>,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    // New identity, new session ID
    session.cycle_id().await?;

    let user = CurrentUser::from(login.user.clone());
    session.insert(session_keys::AUTH_TOKEN, &login.token).await?;
    session.insert(session_keys::USER, &user).await?;
    if let Some(line_token) = line_token {
        session.insert(session_keys::LINE_TOKEN, line_token).await?;
    }
    if let Some(shop_id) = &user.shop_id {
        session.insert(session_keys::SHOP_ID, shop_id).await?;
    }
    if let Some(branch_id) = &user.branch_id {
        session.insert(session_keys::BRANCH_ID, branch_id).await?;
    }

    Ok(user)
}

/// Replace the stored user (e.g. after OTP verification).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER, user).await
}

/// Clear every session key (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted from the store.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use shopcrm_core::UserId;

    use super::*;

    fn user(role: Role, shop: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Test".to_string(),
            role,
            shop_id: shop.map(ShopId::new),
            branch_id: None,
            phone: None,
            otp_verify: true,
        }
    }

    #[test]
    fn test_superadmin_must_name_shop() {
        let admin = user(Role::SuperAdmin, None);
        assert!(matches!(
            scope_shop(&admin, None),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            scope_shop(&admin, Some(&ShopId::new("s9"))).unwrap(),
            ShopId::new("s9")
        );
    }

    #[test]
    fn test_shop_user_pinned_to_session_shop() {
        let employee = user(Role::Employee, Some("s1"));
        assert_eq!(scope_shop(&employee, None).unwrap(), ShopId::new("s1"));
        assert_eq!(
            scope_shop(&employee, Some(&ShopId::new("s1"))).unwrap(),
            ShopId::new("s1")
        );
        assert!(matches!(
            scope_shop(&employee, Some(&ShopId::new("s2"))),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_shop_user_without_shop_is_forbidden() {
        let admin = user(Role::Admin, None);
        assert!(matches!(scope_shop(&admin, None), Err(AppError::Forbidden(_))));
    }
}
