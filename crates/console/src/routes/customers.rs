//! Customers, custom fields and points.

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use shopcrm_core::{BranchId, CustomFieldId, CustomFieldType, CustomerId, Role, ShopId};

use crate::backend::{
    BackendClient, CustomField, Customer, CustomerQuery, CustomerUpdate, NewCustomField,
    NewCustomer, PointsHistory,
};
use crate::error::AppError;
use crate::middleware::{Authenticated, RequireAuth};
use crate::routes::ShopQuery;
use crate::services::points::{self, AddPoints};
use crate::state::AppState;
use crate::validation::FieldErrors;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(get_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
        .route("/api/customers/{id}/points", get(points_history))
        .route("/api/points", post(add_points))
        .route(
            "/api/custom-fields",
            get(list_custom_fields).post(create_custom_field),
        )
        .route("/api/custom-fields/{id}", delete(delete_custom_field))
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Check custom field values against the shop's definitions.
///
/// With `partial` set (updates) required fields may be absent.
fn validate_custom_fields(
    errors: &mut FieldErrors,
    definitions: &[CustomField],
    values: &Map<String, Value>,
    partial: bool,
) {
    for key in values.keys() {
        if !definitions.iter().any(|d| &d.key == key) {
            errors.add(&format!("custom_fields.{key}"), "unknown field");
        }
    }

    for definition in definitions {
        let field = format!("custom_fields.{}", definition.key);
        let value = values.get(&definition.key).filter(|v| !is_blank(v));

        let Some(value) = value else {
            if definition.required && !partial {
                errors.add(&field, format!("{} is required", definition.label));
            }
            continue;
        };

        let ok = match definition.field_type {
            CustomFieldType::Text => value.is_string(),
            CustomFieldType::Number => {
                value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            CustomFieldType::Date => value
                .as_str()
                .is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            CustomFieldType::Select => value
                .as_str()
                .is_some_and(|s| definition.options.iter().any(|o| o == s)),
        };
        if !ok {
            let message = match definition.field_type {
                CustomFieldType::Text => format!("{} must be text", definition.label),
                CustomFieldType::Number => format!("{} must be a number", definition.label),
                CustomFieldType::Date => format!("{} must be a date (YYYY-MM-DD)", definition.label),
                CustomFieldType::Select => {
                    format!("{} must be one of: {}", definition.label, definition.options.join(", "))
                }
            };
            errors.add(&field, message);
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Fetch a customer the caller may see.
async fn visible_customer(auth: &Authenticated, id: &CustomerId) -> Result<Customer, AppError> {
    if auth.user.role == Role::Customer && auth.user.id.as_str() != id.as_str() {
        return Err(AppError::Forbidden(
            "Customers can only view their own record".to_string(),
        ));
    }
    let customer = auth.api.get_customer(id).await?;
    auth.scope_shop(Some(&customer.shop_id))?;
    Ok(customer)
}

async fn custom_field_definitions(
    api: &BackendClient,
    shop_id: &ShopId,
) -> Result<Vec<CustomField>, AppError> {
    Ok(api.list_custom_fields(shop_id).await?)
}

async fn list_customers(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    auth.require_staff()?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;

    let customers = auth
        .api
        .list_customers(&CustomerQuery {
            shop_id: Some(&shop_id),
            branch_id: query.branch_id.as_ref(),
            search: query.search.as_deref().filter(|s| !s.trim().is_empty()),
        })
        .await?;
    Ok(Json(customers))
}

async fn create_customer(
    RequireAuth(auth): RequireAuth,
    Json(customer): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    auth.require_staff()?;
    auth.scope_shop(Some(&customer.shop_id))?;

    let definitions = custom_field_definitions(&auth.api, &customer.shop_id).await?;
    let mut errors = FieldErrors::new();
    errors.require("name", &customer.name);
    errors.max_len("name", &customer.name, 200);
    errors.phone("phone", &customer.phone);
    validate_custom_fields(&mut errors, &definitions, &customer.custom_fields, false);
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_customer(&customer).await?),
    ))
}

async fn get_customer(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(visible_customer(&auth, &id).await?))
}

async fn update_customer(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CustomerId>,
    Json(update): Json<CustomerUpdate>,
) -> Result<Json<Customer>, AppError> {
    auth.require_staff()?;
    let existing = visible_customer(&auth, &id).await?;

    let mut errors = FieldErrors::new();
    if let Some(name) = &update.name {
        errors.require("name", name);
    }
    if let Some(phone) = &update.phone {
        errors.phone("phone", phone);
    }
    if let Some(values) = &update.custom_fields {
        let definitions = custom_field_definitions(&auth.api, &existing.shop_id).await?;
        validate_custom_fields(&mut errors, &definitions, values, true);
    }
    errors.finish()?;

    Ok(Json(auth.api.update_customer(&id, &update).await?))
}

async fn delete_customer(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;
    visible_customer(&auth, &id).await?;

    auth.api.delete_customer(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Points
// =============================================================================

async fn add_points(
    RequireAuth(auth): RequireAuth,
    Json(input): Json<AddPoints>,
) -> Result<(StatusCode, Json<PointsHistory>), AppError> {
    let entry = points::add_points(&auth.api, &auth.user, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn points_history(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<PointsHistory>>, AppError> {
    Ok(Json(points::history(&auth.api, &auth.user, &id).await?))
}

// =============================================================================
// Custom fields
// =============================================================================

async fn list_custom_fields(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<CustomField>>, AppError> {
    auth.require_staff()?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    Ok(Json(custom_field_definitions(&auth.api, &shop_id).await?))
}

async fn create_custom_field(
    RequireAuth(auth): RequireAuth,
    Json(field): Json<NewCustomField>,
) -> Result<(StatusCode, Json<CustomField>), AppError> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;
    auth.scope_shop(Some(&field.shop_id))?;

    let mut errors = FieldErrors::new();
    errors.require("label", &field.label);
    errors.require("key", &field.key);
    if !field
        .key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        errors.add("key", "key may only contain a-z, 0-9 and _");
    }
    if field.field_type == CustomFieldType::Select && field.options.is_empty() {
        errors.add("options", "select fields need at least one option");
    }
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_custom_field(&field).await?),
    ))
}

async fn delete_custom_field(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<CustomFieldId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;

    // Admins may only remove their own shop's fields
    if let Some(shop_id) = &auth.user.shop_id {
        let owned = custom_field_definitions(&auth.api, shop_id)
            .await?
            .iter()
            .any(|field| field.id == id);
        if !owned {
            return Err(AppError::NotFound(format!("Custom field {id}")));
        }
    }

    auth.api.delete_custom_field(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition(key: &str, field_type: CustomFieldType, required: bool) -> CustomField {
        CustomField {
            id: CustomFieldId::new(format!("f-{key}")),
            shop_id: ShopId::new("s1"),
            key: key.to_string(),
            label: key.to_string(),
            field_type,
            options: vec!["S".to_string(), "M".to_string()],
            required,
        }
    }

    fn values(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_required_custom_field_missing() {
        let defs = [definition("birthday", CustomFieldType::Date, true)];
        let mut errors = FieldErrors::new();
        validate_custom_fields(&mut errors, &defs, &values(json!({})), false);
        assert_eq!(
            errors.get("custom_fields.birthday"),
            Some("birthday is required")
        );

        let mut errors = FieldErrors::new();
        validate_custom_fields(&mut errors, &defs, &values(json!({})), true);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_custom_field_types_checked() {
        let defs = [
            definition("birthday", CustomFieldType::Date, false),
            definition("size", CustomFieldType::Select, false),
            definition("age", CustomFieldType::Number, false),
        ];
        let mut errors = FieldErrors::new();
        validate_custom_fields(
            &mut errors,
            &defs,
            &values(json!({"birthday": "1990-02-31", "size": "XL", "age": "abc"})),
            false,
        );
        assert!(errors.get("custom_fields.birthday").is_some());
        assert_eq!(errors.get("custom_fields.size"), Some("size must be one of: S, M"));
        assert!(errors.get("custom_fields.age").is_some());

        let mut errors = FieldErrors::new();
        validate_custom_fields(
            &mut errors,
            &defs,
            &values(json!({"birthday": "1990-02-28", "size": "M", "age": 34})),
            false,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_custom_field_rejected() {
        let mut errors = FieldErrors::new();
        validate_custom_fields(&mut errors, &[], &values(json!({"nickname": "Bo"})), false);
        assert_eq!(errors.get("custom_fields.nickname"), Some("unknown field"));
    }
}
