//! Navigation menu for the session user.

use axum::{Json, Router, routing::get};
use tracing::instrument;

use crate::backend::{BackendClient, BackendError};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::navigation::{NavItem, default_menu, filter_by_role, restrict_to_package};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/navigation", get(navigation))
}

/// Menu keys unlocked by the user's shop package.
///
/// `None` when the user has no shop, the shop has no package, or either
/// record is missing.
async fn package_menus(
    api: &BackendClient,
    user: &CurrentUser,
) -> Result<Option<Vec<String>>, BackendError> {
    let Some(shop_id) = &user.shop_id else {
        return Ok(None);
    };

    let shop = match api.get_shop(shop_id).await {
        Ok(shop) => shop,
        Err(err) if err.is_missing_record() => return Ok(None),
        Err(err) => return Err(err),
    };
    let Some(package_id) = shop.package_id else {
        return Ok(None);
    };

    match api.get_package(&package_id).await {
        Ok(package) => Ok(Some(package.menus)),
        Err(err) if err.is_missing_record() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Role-filtered, package-restricted menu.
///
/// # Errors
///
/// Returns a backend error if the shop or package lookup fails.
#[instrument(skip_all, fields(user_id = %auth.user.id, role = auth.user.role.as_str()))]
pub async fn navigation(RequireAuth(auth): RequireAuth) -> Result<Json<Vec<NavItem>>, AppError> {
    let role = auth.user.role;
    let visible = filter_by_role(&default_menu(), Some(role));

    if !role.is_shop_scoped() {
        return Ok(Json(visible));
    }

    let menus = package_menus(&auth.api, &auth.user).await?;
    Ok(Json(restrict_to_package(visible, role, menus.as_deref())))
}
