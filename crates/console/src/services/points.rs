//! Loyalty points.
//!
//! The backend owns every balance. Adding points only creates a history
//! entry; the next customer fetch shows the new balance.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use shopcrm_core::{CustomerId, Role};

use crate::backend::{BackendClient, NewPointsEntry, PointsHistory};
use crate::error::AppError;
use crate::middleware::auth::scope_shop;
use crate::models::CurrentUser;
use crate::validation::FieldErrors;

const MAX_DETAIL_LEN: usize = 255;

/// A signed points adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPoints {
    pub customer_id: CustomerId,
    pub detail: String,
    pub points: i64,
}

impl AddPoints {
    /// Check the adjustment before it is sent.
    ///
    /// # Errors
    ///
    /// Returns every problem found.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("customer_id", self.customer_id.as_str());
        errors.require("detail", &self.detail);
        errors.max_len("detail", &self.detail, MAX_DETAIL_LEN);
        if self.points == 0 {
            errors.add("points", "points cannot be zero");
        }
        errors.finish()
    }
}

/// Record a points adjustment for a customer of the caller's shop.
///
/// # Errors
///
/// `Validation` for bad input, `Forbidden` for customers or other shops,
/// or any backend error.
#[instrument(skip(api, user, input), fields(user_id = %user.id, customer_id = %input.customer_id, points = input.points))]
pub async fn add_points(
    api: &BackendClient,
    user: &CurrentUser,
    input: AddPoints,
) -> Result<PointsHistory, AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff can adjust points".to_string(),
        ));
    }
    input.validate()?;

    let customer = api.get_customer(&input.customer_id).await?;
    scope_shop(user, Some(&customer.shop_id))?;

    let entry = api
        .create_points_entry(&NewPointsEntry {
            customer_id: input.customer_id,
            detail: input.detail.trim().to_string(),
            points: input.points,
            created_by: Some(user.id.clone()),
        })
        .await?;
    info!(entry_id = %entry.id, "points entry created");

    Ok(entry)
}

/// Points history of one customer.
///
/// Customers may only read their own history.
///
/// # Errors
///
/// `Forbidden` when reading someone else's history, or any backend error.
#[instrument(skip(api, user), fields(user_id = %user.id, customer_id = %customer_id))]
pub async fn history(
    api: &BackendClient,
    user: &CurrentUser,
    customer_id: &CustomerId,
) -> Result<Vec<PointsHistory>, AppError> {
    if user.role == Role::Customer {
        if user.id.as_str() != customer_id.as_str() {
            return Err(AppError::Forbidden(
                "Customers can only view their own points".to_string(),
            ));
        }
    } else {
        let customer = api.get_customer(customer_id).await?;
        scope_shop(user, Some(&customer.shop_id))?;
    }

    Ok(api.list_points_history(customer_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(detail: &str, points: i64) -> AddPoints {
        AddPoints {
            customer_id: CustomerId::new("c1"),
            detail: detail.to_string(),
            points,
        }
    }

    #[test]
    fn test_valid_adjustments() {
        assert!(input("bonus", 50).validate().is_ok());
        assert!(input("refund", -20).validate().is_ok());
    }

    #[test]
    fn test_zero_points_rejected() {
        let errors = input("bonus", 0).validate().unwrap_err();
        assert_eq!(errors.get("points"), Some("points cannot be zero"));
    }

    #[test]
    fn test_blank_detail_rejected() {
        let errors = input("   ", 10).validate().unwrap_err();
        assert_eq!(errors.get("detail"), Some("detail is required"));
        assert!(errors.get("points").is_none());
    }
}
