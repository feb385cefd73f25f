//! Referrers and referral commissions (superadmin only).

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;

use shopcrm_core::{ReferralHistoryId, ReferralStatus, ReferrerId, UserId};

use crate::backend::{NewReferrer, ReferralHistory, Referrer, ReferrerUpdate};
use crate::error::AppError;
use crate::middleware::RequireSuperAdmin;
use crate::services::referrals;
use crate::state::AppState;
use crate::validation::FieldErrors;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/referrers", get(list_referrers).post(create_referrer))
        .route("/api/referrers/{id}", get(get_referrer).patch(update_referrer))
        .route(
            "/api/referral-histories",
            get(list_histories).post(create_history),
        )
        .route("/api/referral-histories/{id}", patch(update_history))
}

fn validate_bank(errors: &mut FieldErrors, bank_name: Option<&str>, bank_account: Option<&str>) {
    if let Some(account) = bank_account.filter(|a| !a.trim().is_empty()) {
        if !account.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ' ') {
            errors.add("bank_account", "bank_account may only contain digits");
        }
        if bank_name.is_none_or(|n| n.trim().is_empty()) {
            errors.add("bank_name", "bank_name is required with a bank account");
        }
    }
}

async fn list_referrers(
    RequireSuperAdmin(auth): RequireSuperAdmin,
) -> Result<Json<Vec<Referrer>>, AppError> {
    Ok(Json(auth.api.list_referrers().await?))
}

async fn create_referrer(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Json(referrer): Json<NewReferrer>,
) -> Result<(StatusCode, Json<Referrer>), AppError> {
    let mut errors = FieldErrors::new();
    errors.require("name", &referrer.name);
    errors.require("referral_code", &referrer.referral_code);
    errors.max_len("referral_code", &referrer.referral_code, 32);
    validate_bank(
        &mut errors,
        referrer.bank_name.as_deref(),
        referrer.bank_account.as_deref(),
    );
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_referrer(&referrer).await?),
    ))
}

async fn get_referrer(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<ReferrerId>,
) -> Result<Json<Referrer>, AppError> {
    Ok(Json(auth.api.get_referrer(&id).await?))
}

async fn update_referrer(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<ReferrerId>,
    Json(update): Json<ReferrerUpdate>,
) -> Result<Json<Referrer>, AppError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &update.name {
        errors.require("name", name);
    }
    validate_bank(
        &mut errors,
        update.bank_name.as_deref(),
        update.bank_account.as_deref(),
    );
    errors.finish()?;

    Ok(Json(auth.api.update_referrer(&id, &update).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub referrer_id: Option<ReferrerId>,
}

async fn list_histories(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ReferralHistory>>, AppError> {
    Ok(Json(
        auth.api
            .list_referral_histories(query.referrer_id.as_ref())
            .await?,
    ))
}

/// A referral to record. The reward is not accepted from the client.
#[derive(Debug, Deserialize)]
pub struct NewReferralForm {
    pub referrer_id: ReferrerId,
    pub referee_id: UserId,
}

async fn create_history(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Json(form): Json<NewReferralForm>,
) -> Result<(StatusCode, Json<ReferralHistory>), AppError> {
    let history = referrals::create_referral(&auth.api, &form.referrer_id, &form.referee_id).await?;
    Ok((StatusCode::CREATED, Json(history)))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: ReferralStatus,
}

async fn update_history(
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<ReferralHistoryId>,
    Json(form): Json<StatusForm>,
) -> Result<Json<ReferralHistory>, AppError> {
    Ok(Json(
        referrals::advance_status(&auth.api, &id, form.status).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_account_needs_bank_name() {
        let mut errors = FieldErrors::new();
        validate_bank(&mut errors, None, Some("123-456-7890"));
        assert!(errors.get("bank_name").is_some());
        assert!(errors.get("bank_account").is_none());
    }

    #[test]
    fn test_bank_account_digits_only() {
        let mut errors = FieldErrors::new();
        validate_bank(&mut errors, Some("KBank"), Some("12ab"));
        assert!(errors.get("bank_account").is_some());
    }

    #[test]
    fn test_reward_value_not_accepted_from_client() {
        let form: NewReferralForm = serde_json::from_str(
            r#"{"referrer_id":"r1","referee_id":"u9","reward_value":"99999"}"#,
        )
        .unwrap();
        assert_eq!(form.referrer_id, ReferrerId::new("r1"));
    }
}
