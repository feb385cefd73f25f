//! Referral commissions.

use tracing::{info, instrument};

use shopcrm_core::{ReferralHistoryId, ReferralStatus, ReferrerId, ReferrerStatus, UserId};

use crate::backend::{BackendClient, NewReferralHistory, ReferralHistory, ReferralStatusUpdate};
use crate::error::AppError;
use crate::services::settings::settings_center_or_default;

/// Record a referral for an admin signup.
///
/// The reward type comes from the referrer and the reward value from the
/// settings-center rate for that type. Closed referrers take no new
/// referrals.
///
/// # Errors
///
/// `BadRequest` for a closed referrer, or any backend error.
#[instrument(skip(api), fields(referrer_id = %referrer_id, referee_id = %referee_id))]
pub async fn create_referral(
    api: &BackendClient,
    referrer_id: &ReferrerId,
    referee_id: &UserId,
) -> Result<ReferralHistory, AppError> {
    let (referrer, center) =
        futures::try_join!(api.get_referrer(referrer_id), settings_center_or_default(api))?;

    if referrer.status == ReferrerStatus::Close {
        return Err(AppError::BadRequest(format!(
            "Referrer {} is closed to new referrals",
            referrer.referral_code
        )));
    }

    let reward_value = center.reward_value(referrer.reward_type);
    let history = api
        .create_referral_history(&NewReferralHistory {
            referrer_id: referrer.id,
            referee_id: referee_id.clone(),
            reward_type: referrer.reward_type,
            reward_value,
            status: ReferralStatus::Pending,
        })
        .await?;
    info!(history_id = %history.id, %reward_value, "referral recorded");

    Ok(history)
}

/// Move a referral to a later status.
///
/// # Errors
///
/// `Transition` when `next` is not after the current status, or any
/// backend error.
#[instrument(skip(api), fields(history_id = %history_id, next = next.as_str()))]
pub async fn advance_status(
    api: &BackendClient,
    history_id: &ReferralHistoryId,
    next: ReferralStatus,
) -> Result<ReferralHistory, AppError> {
    let history = api.get_referral_history(history_id).await?;
    let status = history.status.advance(next)?;

    Ok(api
        .update_referral_status(history_id, ReferralStatusUpdate { status })
        .await?)
}
