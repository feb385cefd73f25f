//! Shop settings and the settings-center.
//!
//! Reads never fail just because nothing was saved yet: a missing row comes
//! back as the default record with `id: null`.

use axum::{
    Json, Router,
    extract::Query,
    routing::get,
};
use rust_decimal::Decimal;

use shopcrm_core::Role;

use crate::backend::{SettingsCenter, SettingsCenterInput, ShopSettings, ShopSettingsInput};
use crate::error::AppError;
use crate::middleware::{RequireAuth, RequireSuperAdmin};
use crate::routes::ShopQuery;
use crate::services::{settings_center_or_default, shop_settings_or_default};
use crate::state::AppState;
use crate::validation::FieldErrors;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(put_settings))
        .route(
            "/api/settings-center",
            get(get_settings_center).put(put_settings_center),
        )
}

fn validate_settings(input: &ShopSettingsInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if input.point_rate.is_some_and(|rate| rate < Decimal::ZERO) {
        errors.add("point_rate", "point_rate cannot be negative");
    }
    if let Some(points) = input.welcome_points {
        errors.non_negative("welcome_points", points);
    }
    if let Some(days) = input.point_expiry_days {
        errors.non_negative("point_expiry_days", days);
    }
    if let Some(sender) = &input.sms_sender {
        errors.max_len("sms_sender", sender, 11);
    }
    errors.finish()
}

fn validate_center(input: &SettingsCenterInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(points) = input.referral_point_value {
        errors.non_negative("referral_point_value", points);
    }
    if input
        .referral_cash_value
        .is_some_and(|cash| cash < Decimal::ZERO)
    {
        errors.add("referral_cash_value", "referral_cash_value cannot be negative");
    }
    errors.finish()
}

async fn get_settings(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<ShopSettings>, AppError> {
    auth.require_staff()?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    Ok(Json(shop_settings_or_default(&auth.api, &shop_id).await?))
}

async fn put_settings(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
    Json(input): Json<ShopSettingsInput>,
) -> Result<Json<ShopSettings>, AppError> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    validate_settings(&input)?;

    Ok(Json(auth.api.put_shop_settings(&shop_id, &input).await?))
}

async fn get_settings_center(
    RequireSuperAdmin(auth): RequireSuperAdmin,
) -> Result<Json<SettingsCenter>, AppError> {
    Ok(Json(settings_center_or_default(&auth.api).await?))
}

async fn put_settings_center(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Json(input): Json<SettingsCenterInput>,
) -> Result<Json<SettingsCenter>, AppError> {
    validate_center(&input)?;
    Ok(Json(auth.api.put_settings_center(&input).await?))
}
