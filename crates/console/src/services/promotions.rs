//! Promotion claims and their approval.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use shopcrm_core::{CustomerId, PromotionHistoryId, PromotionId, PromotionStatus, Role};

use crate::backend::{
    BackendClient, NewPromotionHistory, PromotionDecision, PromotionHistory,
    PromotionHistoryQuery,
};
use crate::error::AppError;
use crate::middleware::auth::scope_shop;
use crate::models::CurrentUser;
use crate::services::lookup::resolve_names;
use crate::validation::FieldErrors;

/// A claim with the names a list view shows.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionHistoryView {
    #[serde(flatten)]
    pub history: PromotionHistory,
    pub customer_name: Option<String>,
    pub promotion_name: Option<String>,
}

/// Customer a claim is made for: customers claim for themselves, staff
/// name the customer.
fn claimant(user: &CurrentUser, customer_id: Option<CustomerId>) -> Result<CustomerId, AppError> {
    if user.role == Role::Customer {
        let own = CustomerId::new(user.id.as_str());
        return match customer_id {
            Some(other) if other != own => Err(AppError::Forbidden(
                "Customers can only claim for themselves".to_string(),
            )),
            _ => Ok(own),
        };
    }

    customer_id.ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.add("customer_id", "customer_id is required");
        AppError::Validation(errors)
    })
}

/// Claim a promotion with a customer's points.
///
/// The customer must hold at least the promotion's `point_cost` and the
/// promotion must be running. On success a `pending` claim is created;
/// nothing is written otherwise.
///
/// # Errors
///
/// `Validation` for insufficient points or a promotion outside its window,
/// `Forbidden` across shops, or any backend error.
#[instrument(skip(api, user), fields(user_id = %user.id, promotion_id = %promotion_id))]
pub async fn claim(
    api: &BackendClient,
    user: &CurrentUser,
    promotion_id: &PromotionId,
    customer_id: Option<CustomerId>,
    now: DateTime<Utc>,
) -> Result<PromotionHistory, AppError> {
    let customer_id = claimant(user, customer_id)?;

    let (customer, promotion) = futures::try_join!(
        api.get_customer(&customer_id),
        api.get_promotion(promotion_id)
    )?;

    scope_shop(user, Some(&customer.shop_id))?;
    if promotion.shop_id != customer.shop_id {
        return Err(AppError::Forbidden(
            "Promotion belongs to another shop".to_string(),
        ));
    }

    let mut errors = FieldErrors::new();
    if !promotion.is_running(now) {
        errors.add("promotion_id", "This promotion is not running");
    }
    if customer.points < promotion.point_cost {
        errors.add(
            "points",
            format!(
                "Not enough points: {} needed, {} available",
                promotion.point_cost, customer.points
            ),
        );
    }
    errors.finish()?;

    let history = api
        .create_promotion_history(&NewPromotionHistory {
            customer_id: customer.id,
            promotion_id: promotion.id,
            status: PromotionStatus::Pending,
        })
        .await?;
    info!(history_id = %history.id, "promotion claimed");

    Ok(history)
}

/// Approve or reject a pending claim.
///
/// # Errors
///
/// `Forbidden` for customers or claims of another shop, `Transition` when
/// the claim was already decided, or any backend error.
#[instrument(skip(api, user), fields(user_id = %user.id, history_id = %history_id))]
pub async fn decide(
    api: &BackendClient,
    user: &CurrentUser,
    history_id: &PromotionHistoryId,
    next: PromotionStatus,
    now: DateTime<Utc>,
) -> Result<PromotionHistory, AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff can decide promotion claims".to_string(),
        ));
    }

    let history = api.get_promotion_history(history_id).await?;
    let customer = api.get_customer(&history.customer_id).await?;
    scope_shop(user, Some(&customer.shop_id))?;

    let status = history.status.decide(next)?;

    let decided = api
        .decide_promotion_history(
            history_id,
            &PromotionDecision {
                status,
                approved_by: user.id.clone(),
                approved_at: now,
            },
        )
        .await?;
    info!(status = status.as_str(), "promotion claim decided");

    Ok(decided)
}

/// List claims with customer and promotion names resolved.
///
/// # Errors
///
/// Returns the listing's backend error. Failed name lookups only leave the
/// name empty.
#[instrument(skip(api, query))]
pub async fn list_with_names(
    api: &BackendClient,
    query: &PromotionHistoryQuery<'_>,
) -> Result<Vec<PromotionHistoryView>, AppError> {
    let histories = api.list_promotion_histories(query).await?;

    let customer_ids = histories.iter().map(|h| h.customer_id.clone());
    let promotion_ids = histories.iter().map(|h| h.promotion_id.clone());

    let (customers, promotions) = futures::join!(
        resolve_names(customer_ids, |id| async move {
            api.get_customer(&id).await.map(|c| c.name)
        }),
        resolve_names(promotion_ids, |id| async move {
            api.get_promotion(&id).await.map(|p| p.name)
        }),
    );

    Ok(histories
        .into_iter()
        .map(|history| PromotionHistoryView {
            customer_name: customers.get(&history.customer_id).cloned(),
            promotion_name: promotions.get(&history.promotion_id).cloned(),
            history,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use shopcrm_core::{ShopId, UserId};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Test".to_string(),
            role,
            shop_id: Some(ShopId::new("s1")),
            branch_id: None,
            phone: None,
            otp_verify: true,
        }
    }

    #[test]
    fn test_customer_claims_for_self() {
        let customer = user(Role::Customer);
        assert_eq!(claimant(&customer, None).unwrap(), CustomerId::new("u1"));
        assert!(matches!(
            claimant(&customer, Some(CustomerId::new("c2"))),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_staff_must_name_customer() {
        let employee = user(Role::Employee);
        assert!(matches!(claimant(&employee, None), Err(AppError::Validation(_))));
        assert_eq!(
            claimant(&employee, Some(CustomerId::new("c2"))).unwrap(),
            CustomerId::new("c2")
        );
    }
}
