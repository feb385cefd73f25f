//! Status enums and their allowed transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status change that the lifecycle of the record does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot change {entity} status from {from} to {to}")]
pub struct TransitionError {
    /// Entity kind, for the message.
    pub entity: &'static str,
    /// Current status.
    pub from: &'static str,
    /// Requested status.
    pub to: &'static str,
}

/// Status of a customer's promotion claim.
///
/// Claims start `Pending` and are decided exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromotionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PromotionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Decide a pending claim.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the claim was already decided or the
    /// target is `Pending`.
    pub fn decide(self, next: Self) -> Result<Self, TransitionError> {
        match (self, next) {
            (Self::Pending, Self::Approved | Self::Rejected) => Ok(next),
            _ => Err(TransitionError {
                entity: "promotion history",
                from: self.as_str(),
                to: next.as_str(),
            }),
        }
    }
}

/// Status of a referral commission.
///
/// Progression is strictly forward: `Pending` -> `Approved` -> `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    #[default]
    Pending,
    Approved,
    Paid,
}

impl ReferralStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Move to a later status. Skipping `Approved` is allowed; going back or
    /// staying put is not.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` when `next` is not after the current status.
    pub fn advance(self, next: Self) -> Result<Self, TransitionError> {
        if next > self {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "referral",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

/// How a referrer is rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    #[default]
    Point,
    Cash,
}

/// Whether a referrer accepts new referrals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferrerStatus {
    #[default]
    Open,
    Close,
}

/// Subscription status of a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShopStatus {
    #[default]
    Active,
    Inactive,
    Expired,
}

/// Type of a shop-defined customer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    #[default]
    Text,
    Number,
    Date,
    Select,
}
