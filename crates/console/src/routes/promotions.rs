//! Promotions and promotion claims.

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use shopcrm_core::{CustomerId, PromotionHistoryId, PromotionId, PromotionStatus, Role, ShopId};

use crate::backend::{
    NewPromotion, Promotion, PromotionHistory, PromotionHistoryQuery, PromotionUpdate,
};
use crate::error::AppError;
use crate::middleware::{Authenticated, RequireAuth};
use crate::routes::ShopQuery;
use crate::services::promotions::{self, PromotionHistoryView};
use crate::state::AppState;
use crate::validation::FieldErrors;

const PROMOTION_MANAGERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/promotions", get(list_promotions).post(create_promotion))
        .route(
            "/api/promotions/{id}",
            get(get_promotion)
                .patch(update_promotion)
                .delete(delete_promotion),
        )
        .route("/api/promotions/{id}/claim", post(claim_promotion))
        .route("/api/promotion-histories", get(list_histories))
        .route("/api/promotion-histories/{id}/approve", post(approve))
        .route("/api/promotion-histories/{id}/reject", post(reject))
}

fn validate_promotion(
    errors: &mut FieldErrors,
    name: Option<&str>,
    point_cost: Option<i64>,
    window: (Option<chrono::DateTime<Utc>>, Option<chrono::DateTime<Utc>>),
) {
    if let Some(name) = name {
        errors.require("name", name);
        errors.max_len("name", name, 200);
    }
    if let Some(point_cost) = point_cost {
        errors.positive("point_cost", point_cost);
    }
    if let (Some(start), Some(end)) = window {
        if end < start {
            errors.add("ends_at", "ends_at must not be before starts_at");
        }
    }
}

async fn promotion_in_scope(auth: &Authenticated, id: &PromotionId) -> Result<Promotion, AppError> {
    let promotion = auth.api.get_promotion(id).await?;
    auth.scope_shop(Some(&promotion.shop_id))?;
    Ok(promotion)
}

async fn list_promotions(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Vec<Promotion>>, AppError> {
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;
    let promotions = auth.api.list_promotions(&shop_id).await?;

    // Customers only see what they can claim today
    if auth.user.role == Role::Customer {
        let now = Utc::now();
        return Ok(Json(
            promotions.into_iter().filter(|p| p.is_running(now)).collect(),
        ));
    }
    Ok(Json(promotions))
}

async fn create_promotion(
    RequireAuth(auth): RequireAuth,
    Json(promotion): Json<NewPromotion>,
) -> Result<(StatusCode, Json<Promotion>), AppError> {
    auth.require_any(PROMOTION_MANAGERS)?;
    auth.scope_shop(Some(&promotion.shop_id))?;

    let mut errors = FieldErrors::new();
    validate_promotion(
        &mut errors,
        Some(&promotion.name),
        Some(promotion.point_cost),
        (promotion.starts_at, promotion.ends_at),
    );
    errors.finish()?;

    Ok((
        StatusCode::CREATED,
        Json(auth.api.create_promotion(&promotion).await?),
    ))
}

async fn get_promotion(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionId>,
) -> Result<Json<Promotion>, AppError> {
    Ok(Json(promotion_in_scope(&auth, &id).await?))
}

async fn update_promotion(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionId>,
    Json(update): Json<PromotionUpdate>,
) -> Result<Json<Promotion>, AppError> {
    auth.require_any(PROMOTION_MANAGERS)?;
    let existing = promotion_in_scope(&auth, &id).await?;

    let mut errors = FieldErrors::new();
    validate_promotion(
        &mut errors,
        update.name.as_deref(),
        update.point_cost,
        (
            update.starts_at.or(existing.starts_at),
            update.ends_at.or(existing.ends_at),
        ),
    );
    errors.finish()?;

    Ok(Json(auth.api.update_promotion(&id, &update).await?))
}

async fn delete_promotion(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionId>,
) -> Result<StatusCode, AppError> {
    auth.require_any(PROMOTION_MANAGERS)?;
    promotion_in_scope(&auth, &id).await?;

    auth.api.delete_promotion(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimForm {
    /// Required for staff claiming on a customer's behalf.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

async fn claim_promotion(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionId>,
    Json(form): Json<ClaimForm>,
) -> Result<(StatusCode, Json<PromotionHistory>), AppError> {
    let history =
        promotions::claim(&auth.api, &auth.user, &id, form.customer_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(history)))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryListQuery {
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub status: Option<PromotionStatus>,
}

async fn list_histories(
    RequireAuth(auth): RequireAuth,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<Vec<PromotionHistoryView>>, AppError> {
    let shop_id = auth.scope_shop(query.shop_id.as_ref())?;

    let customer_id = if auth.user.role == Role::Customer {
        let own = CustomerId::new(auth.user.id.as_str());
        if query.customer_id.as_ref().is_some_and(|id| id != &own) {
            return Err(AppError::Forbidden(
                "Customers can only view their own claims".to_string(),
            ));
        }
        Some(own)
    } else {
        query.customer_id
    };

    let views = promotions::list_with_names(
        &auth.api,
        &PromotionHistoryQuery {
            shop_id: Some(&shop_id),
            customer_id: customer_id.as_ref(),
            status: query.status,
        },
    )
    .await?;
    Ok(Json(views))
}

async fn approve(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionHistoryId>,
) -> Result<Json<PromotionHistory>, AppError> {
    let history = promotions::decide(
        &auth.api,
        &auth.user,
        &id,
        PromotionStatus::Approved,
        Utc::now(),
    )
    .await?;
    Ok(Json(history))
}

async fn reject(
    RequireAuth(auth): RequireAuth,
    Path(id): Path<PromotionHistoryId>,
) -> Result<Json<PromotionHistory>, AppError> {
    let history = promotions::decide(
        &auth.api,
        &auth.user,
        &id,
        PromotionStatus::Rejected,
        Utc::now(),
    )
    .await?;
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_promotion_validation() {
        let now = Utc::now();
        let mut errors = FieldErrors::new();
        validate_promotion(
            &mut errors,
            Some(""),
            Some(0),
            (Some(now), Some(now - Duration::days(1))),
        );
        assert!(errors.get("name").is_some());
        assert!(errors.get("point_cost").is_some());
        assert!(errors.get("ends_at").is_some());

        let mut errors = FieldErrors::new();
        validate_promotion(&mut errors, None, Some(100), (None, Some(now)));
        assert!(errors.is_empty());
    }
}
