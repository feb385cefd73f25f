//! Subscription packages.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};

use shopcrm_core::{PackageId, Price};

use crate::backend::{NewPackage, Package, PackageUpdate};
use crate::error::AppError;
use crate::middleware::{RequireAuth, RequireSuperAdmin};
use crate::navigation::default_menu;
use crate::state::AppState;
use crate::validation::FieldErrors;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/packages", get(list_packages).post(create_package))
        .route(
            "/api/packages/{id}",
            get(get_package).patch(update_package).delete(delete_package),
        )
}

fn validate_package(
    errors: &mut FieldErrors,
    name: Option<&str>,
    duration_days: Option<i64>,
    price: Option<Price>,
    menus: Option<&[String]>,
) {
    if let Some(name) = name {
        errors.require("name", name);
    }
    if let Some(days) = duration_days {
        errors.positive("duration_days", days);
    }
    if price.is_some_and(|p| p.is_negative()) {
        errors.add("price", "price cannot be negative");
    }
    if let Some(menus) = menus {
        let known = default_menu();
        if let Some(unknown) = menus
            .iter()
            .find(|m| !known.iter().any(|item| &item.key == *m))
        {
            errors.add("menus", format!("unknown menu key: {unknown}"));
        }
    }
}

/// Packages are listed to every signed-in user so shop admins can pick one
/// to renew on.
async fn list_packages(RequireAuth(auth): RequireAuth) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(auth.api.list_packages().await?))
}

async fn get_package(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PackageId>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(auth.api.get_package(&id).await?))
}

async fn create_package(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Json(package): Json<NewPackage>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    let mut errors = FieldErrors::new();
    validate_package(
        &mut errors,
        Some(&package.name),
        Some(package.duration_days),
        Some(package.price),
        Some(&package.menus),
    );
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_package(&package).await?),
    ))
}

async fn update_package(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<PackageId>,
    Json(update): Json<PackageUpdate>,
) -> Result<Json<Package>, AppError> {
    let mut errors = FieldErrors::new();
    validate_package(
        &mut errors,
        update.name.as_deref(),
        update.duration_days,
        update.price,
        update.menus.as_deref(),
    );
    errors.finish()?;

    Ok(Json(auth.api.update_package(&id, &update).await?))
}

async fn delete_package(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<PackageId>,
) -> Result<StatusCode, AppError> {
    auth.api.delete_package(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
