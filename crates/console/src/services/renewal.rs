//! Package renewal.
//!
//! Renewing writes two records in order: the renewal history row, then the
//! shop's new subscription window. The two writes are not atomic. When the
//! shop update fails the renewal stays recorded and the outcome carries a
//! warning for an operator to reconcile.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use shopcrm_core::{PackageId, ShopId, ShopStatus};

use crate::backend::{BackendClient, NewPackageRenewal, PackageRenewal, Shop, ShopUpdate};
use crate::error::AppError;

/// Result of a renewal.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalOutcome {
    pub renewal: PackageRenewal,
    /// The updated shop, when the second write succeeded.
    pub shop: Option<Shop>,
    /// Set when the renewal was recorded but the shop was not updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Subscription window starting at `now`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a negative or out-of-range duration.
pub fn renewal_window(
    now: DateTime<Utc>,
    duration_days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    if duration_days < 0 {
        return Err(AppError::BadRequest(
            "Package duration cannot be negative".to_string(),
        ));
    }

    TimeDelta::try_days(duration_days)
        .and_then(|delta| now.checked_add_signed(delta))
        .map(|end| (now, end))
        .ok_or_else(|| AppError::BadRequest("Package duration is out of range".to_string()))
}

/// Renew `shop_id` on `package_id`.
///
/// 1. Fetch the package for its duration and price
/// 2. Create the renewal history row
/// 3. Set the shop's `start_date`, `end_date` and `package_id`
///
/// # Errors
///
/// Fails if step 1 or 2 fails. A failure in step 3 is reported in
/// [`RenewalOutcome::warning`] instead.
#[instrument(skip(api), fields(shop_id = %shop_id, package_id = %package_id))]
pub async fn renew_package(
    api: &BackendClient,
    shop_id: &ShopId,
    package_id: &PackageId,
    now: DateTime<Utc>,
) -> Result<RenewalOutcome, AppError> {
    let package = api.get_package(package_id).await?;
    let (start, end) = renewal_window(now, package.duration_days)?;

    let renewal = api
        .create_package_renewal(&NewPackageRenewal {
            shop_id: shop_id.clone(),
            package_id: package.id.clone(),
            price: package.price,
        })
        .await?;
    info!(renewal_id = %renewal.id, "package renewal recorded");

    let update = ShopUpdate {
        package_id: Some(package.id),
        start_date: Some(start),
        end_date: Some(end),
        status: Some(ShopStatus::Active),
        ..ShopUpdate::default()
    };

    match api.update_shop(shop_id, &update).await {
        Ok(shop) => Ok(RenewalOutcome {
            renewal,
            shop: Some(shop),
            warning: None,
        }),
        Err(err) => {
            warn!(
                renewal_id = %renewal.id,
                error = %err,
                "renewal recorded but shop update failed"
            );
            Ok(RenewalOutcome {
                renewal,
                shop: None,
                warning: Some(format!(
                    "Renewal was recorded but the shop's subscription dates were not updated: {}",
                    err.user_message()
                )),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_window_spans_duration() {
        let now = Utc.with_ymd_and_hms(2026, 1, 30, 12, 0, 0).unwrap();
        let (start, end) = renewal_window(now, 30).unwrap();
        assert_eq!(start, now);
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_zero_duration_is_same_instant() {
        let now = Utc::now();
        assert_eq!(renewal_window(now, 0).unwrap(), (now, now));
    }

    #[test]
    fn test_bad_durations_rejected() {
        let now = Utc::now();
        assert!(matches!(renewal_window(now, -1), Err(AppError::BadRequest(_))));
        assert!(matches!(renewal_window(now, i64::MAX), Err(AppError::BadRequest(_))));
    }
}
