//! Shops, branches, employees and package renewals.

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use shopcrm_core::{BranchId, PackageId, Role, ShopId, UserId};

use crate::backend::{
    Branch, BranchUpdate, Employee, NewBranch, NewEmployee, NewShop, PackageRenewal, Shop,
    ShopUpdate,
};
use crate::error::AppError;
use crate::middleware::{RequireAuth, RequireSuperAdmin};
use crate::routes::ShopQuery;
use crate::services::{RenewalOutcome, renew_package};
use crate::state::AppState;
use crate::validation::FieldErrors;

const SHOP_MANAGERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shops", get(list_shops).post(create_shop))
        .route(
            "/api/shops/{id}",
            get(get_shop).patch(update_shop).delete(delete_shop),
        )
        .route("/api/shops/{id}/renew", post(renew))
        .route("/api/package-renewals", get(list_renewals))
        .route("/api/branches", get(list_branches).post(create_branch))
        .route(
            "/api/branches/{id}",
            get(get_branch).patch(update_branch).delete(delete_branch),
        )
        .route("/api/employees", get(list_employees).post(create_employee))
        .route("/api/employees/{id}", get(get_employee).delete(delete_employee))
}

fn validate_contact(errors: &mut FieldErrors, name: Option<&str>, phone: Option<&str>) {
    if let Some(name) = name {
        errors.require("name", name);
        errors.max_len("name", name, 200);
    }
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        errors.phone("phone", phone);
    }
}

// =============================================================================
// Shops
// =============================================================================

async fn list_shops(RequireSuperAdmin(auth): RequireSuperAdmin) -> Result<Json<Vec<Shop>>, AppError> {
    Ok(Json(auth.api.list_shops().await?))
}

async fn create_shop(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Json(shop): Json<NewShop>,
) -> Result<(StatusCode, Json<Shop>), AppError> {
    let mut errors = FieldErrors::new();
    validate_contact(&mut errors, Some(&shop.name), shop.phone.as_deref());
    errors.finish()?;

    Ok((StatusCode::CREATED, Json(auth.api.create_shop(&shop).await?)))
}

async fn get_shop(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ShopId>,
) -> Result<Json<Shop>, AppError> {
    let shop_id = auth.scope_shop(Some(&id))?;
    Ok(Json(auth.api.get_shop(&shop_id).await?))
}

async fn update_shop(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<ShopId>,
    Json(update): Json<ShopUpdate>,
) -> Result<Json<Shop>, AppError> {
    let mut errors = FieldErrors::new();
    validate_contact(&mut errors, update.name.as_deref(), update.phone.as_deref());
    if let (Some(start), Some(end)) = (update.start_date, update.end_date) {
        if end < start {
            errors.add("end_date", "end_date must not be before start_date");
        }
    }
    errors.finish()?;

    Ok(Json(auth.api.update_shop(&id, &update).await?))
}

async fn delete_shop(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<ShopId>,
) -> Result<StatusCode, AppError> {
    auth.api.delete_shop(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RenewForm {
    pub package_id: PackageId,
}

/// Renew a shop on a package. Succeeds with a `warning` when the renewal
/// was recorded but the shop could not be updated.
async fn renew(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ShopId>,
    Json(form): Json<RenewForm>,
) -> Result<(StatusCode, Json<RenewalOutcome>), AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let shop_id = auth.scope_shop(Some(&id))?;

    let outcome = renew_package(&auth.api, &shop_id, &form.package_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn list_renewals(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<PackageRenewal>>, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let shop_id = if auth.user.role == Role::SuperAdmin {
        query.shop_id
    } else {
        Some(auth.scope_shop(query.shop_id.as_ref())?)
    };

    Ok(Json(auth.api.list_package_renewals(shop_id.as_ref()).await?))
}

// =============================================================================
// Branches
// =============================================================================

async fn list_branches(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<Branch>>, AppError> {
    auth.require_staff()?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    Ok(Json(auth.api.list_branches(&shop_id).await?))
}

async fn create_branch(
    RequireAuth(auth): RequireAuth,
    Json(branch): Json<NewBranch>,
) -> Result<(StatusCode, Json<Branch>), AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    auth.scope_shop(Some(&branch.shop_id))?;

    let mut errors = FieldErrors::new();
    validate_contact(&mut errors, Some(&branch.name), branch.phone.as_deref());
    errors.finish()?;

    Ok((StatusCode::CREATED, Json(auth.api.create_branch(&branch).await?)))
}

async fn get_branch(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<BranchId>,
) -> Result<Json<Branch>, AppError> {
    auth.require_staff()?;
    let branch = auth.api.get_branch(&id).await?;
    auth.scope_shop(Some(&branch.shop_id))?;
    Ok(Json(branch))
}

async fn update_branch(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<BranchId>,
    Json(update): Json<BranchUpdate>,
) -> Result<Json<Branch>, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let branch = auth.api.get_branch(&id).await?;
    auth.scope_shop(Some(&branch.shop_id))?;

    let mut errors = FieldErrors::new();
    validate_contact(&mut errors, update.name.as_deref(), update.phone.as_deref());
    errors.finish()?;

    Ok(Json(auth.api.update_branch(&id, &update).await?))
}

async fn delete_branch(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<BranchId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let branch = auth.api.get_branch(&id).await?;
    auth.scope_shop(Some(&branch.shop_id))?;

    auth.api.delete_branch(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Employees
// =============================================================================

async fn list_employees(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<Employee>>, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    Ok(Json(auth.api.list_employees(&shop_id).await?))
}

/// Roles `creator` may give a new account.
fn may_create(creator: Role, role: Role) -> bool {
    match creator {
        Role::SuperAdmin => matches!(role, Role::Admin | Role::Employee),
        Role::Admin => role == Role::Employee,
        Role::Employee | Role::Customer => false,
    }
}

async fn create_employee(
    RequireAuth(auth): RequireAuth,
    Json(employee): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    auth.scope_shop(Some(&employee.shop_id))?;
    if !may_create(auth.user.role, employee.role) {
        return Err(AppError::Forbidden(format!(
            "You cannot create {} accounts",
            employee.role
        )));
    }

    let mut errors = FieldErrors::new();
    validate_contact(&mut errors, Some(&employee.name), employee.phone.as_deref());
    errors.require("username", &employee.username);
    errors.require("password", &employee.password);
    if employee.password.chars().count() < 8 {
        errors.add("password", "password must be at least 8 characters");
    }
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_employee(&employee).await?),
    ))
}

async fn get_employee(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<Employee>, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    let employee = auth.api.get_employee(&id).await?;
    auth.scope_shop(employee.shop_id.as_ref())?;
    Ok(Json(employee))
}

async fn delete_employee(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(SHOP_MANAGERS)?;
    if id == auth.user.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }
    let employee = auth.api.get_employee(&id).await?;
    auth.scope_shop(employee.shop_id.as_ref())?;

    auth.api.delete_employee(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_creation_rights() {
        assert!(may_create(Role::SuperAdmin, Role::Admin));
        assert!(may_create(Role::SuperAdmin, Role::Employee));
        assert!(!may_create(Role::SuperAdmin, Role::SuperAdmin));
        assert!(may_create(Role::Admin, Role::Employee));
        assert!(!may_create(Role::Admin, Role::Admin));
        assert!(!may_create(Role::Employee, Role::Employee));
    }

    #[test]
    fn test_contact_validation() {
        let mut errors = FieldErrors::new();
        validate_contact(&mut errors, Some(""), Some("12"));
        assert!(errors.get("name").is_some());
        assert!(errors.get("phone").is_some());

        let mut errors = FieldErrors::new();
        validate_contact(&mut errors, None, Some(" "));
        assert!(errors.is_empty());
    }
}
