//! Records exchanged with the CRM backend.
//!
//! Field names follow the backend's snake_case JSON. Update payloads skip
//! `None` fields so they behave as partial updates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopcrm_core::{
    BranchId, CustomFieldId, CustomFieldType, CustomerId, PackageId, PackageRenewalId,
    PointsHistoryId, Price, PromotionHistoryId, PromotionId, PromotionStatus, ReferralHistoryId,
    ReferralStatus, ReferrerId, ReferrerStatus, RewardType, Role, SettingsId, ShopId, ShopStatus,
    SmsTemplateId, UserId,
};

// =============================================================================
// Auth
// =============================================================================

/// Credentials for `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}

/// The user record returned at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub otp_verify: bool,
}

/// Ask the backend to send an OTP to a phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRequest {
    pub phone: String,
}

/// Reference for an OTP that was sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpTicket {
    #[serde(default)]
    pub ref_code: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Submit an OTP for verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerifyRequest {
    pub phone: String,
    pub otp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_code: Option<String>,
}

/// OTP verification result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OtpVerifyResponse {
    pub verified: bool,
}

// =============================================================================
// Shops, branches, staff
// =============================================================================

/// A tenant storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub package_id: Option<PackageId>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ShopStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShop {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<PackageId>,
}

/// Partial shop update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<PackageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShopStatus>,
}

/// A physical location under a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBranch {
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A shop staff account (admin or employee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub shop_id: ShopId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Customers & points
// =============================================================================

/// A loyalty member of a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub shop_id: ShopId,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub shop_id: ShopId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

/// A shop-defined extra field on customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: CustomFieldId,
    pub shop_id: ShopId,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomField {
    pub shop_id: ShopId,
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub field_type: CustomFieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// One signed change to a customer's points balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsHistory {
    pub id: PointsHistoryId,
    pub customer_id: CustomerId,
    pub points: i64,
    pub detail: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPointsEntry {
    pub customer_id: CustomerId,
    pub detail: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

// =============================================================================
// Promotions
// =============================================================================

/// A reward customers can claim with points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub point_cost: i64,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Promotion {
    /// Whether the promotion can be claimed at `now`.
    #[must_use]
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| start <= now) && self.ends_at.is_none_or(|end| now <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPromotion {
    pub shop_id: ShopId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub point_cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromotionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_cost: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// A customer's claim of a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionHistory {
    pub id: PromotionHistoryId,
    pub customer_id: CustomerId,
    pub promotion_id: PromotionId,
    #[serde(default)]
    pub status: PromotionStatus,
    #[serde(default)]
    pub approved_by: Option<UserId>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPromotionHistory {
    pub customer_id: CustomerId,
    pub promotion_id: PromotionId,
    pub status: PromotionStatus,
}

/// Decision written back onto a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub status: PromotionStatus,
    pub approved_by: UserId,
    pub approved_at: DateTime<Utc>,
}

// =============================================================================
// Referrals
// =============================================================================

/// An affiliate who earns commission for referred shops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub id: ReferrerId,
    pub name: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub reward_type: RewardType,
    pub referral_code: String,
    #[serde(default)]
    pub status: ReferrerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReferrer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub reward_type: RewardType,
    pub referral_code: String,
    #[serde(default)]
    pub status: ReferrerStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferrerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<RewardType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReferrerStatus>,
}

/// A commission owed to a referrer for one referred admin signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralHistory {
    pub id: ReferralHistoryId,
    pub referrer_id: ReferrerId,
    pub referee_id: UserId,
    pub reward_type: RewardType,
    pub reward_value: Decimal,
    #[serde(default)]
    pub status: ReferralStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReferralHistory {
    pub referrer_id: ReferrerId,
    pub referee_id: UserId,
    pub reward_type: RewardType,
    pub reward_value: Decimal,
    pub status: ReferralStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReferralStatusUpdate {
    pub status: ReferralStatus,
}

// =============================================================================
// Packages
// =============================================================================

/// A subscription plan sold to shops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub duration_days: i64,
    pub price: Price,
    /// Navigation keys this package unlocks.
    #[serde(default)]
    pub menus: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPackage {
    pub name: String,
    pub duration_days: i64,
    pub price: Price,
    #[serde(default)]
    pub menus: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menus: Option<Vec<String>>,
}

/// A package purchase by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRenewal {
    pub id: PackageRenewalId,
    pub shop_id: ShopId,
    pub package_id: PackageId,
    pub price: Price,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPackageRenewal {
    pub shop_id: ShopId,
    pub package_id: PackageId,
    pub price: Price,
}

// =============================================================================
// SMS templates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplate {
    pub id: SmsTemplateId,
    pub shop_id: ShopId,
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSmsTemplate {
    pub shop_id: ShopId,
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsTemplateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

// =============================================================================
// Settings
// =============================================================================

/// Per-shop configuration row.
///
/// Rows are created lazily. [`ShopSettings::defaults_for`] is what a shop
/// without a row sees: `id` and every configurable field null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShopSettings {
    #[serde(default)]
    pub id: Option<SettingsId>,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    /// Points earned per currency unit spent.
    #[serde(default)]
    pub point_rate: Option<Decimal>,
    #[serde(default)]
    pub welcome_points: Option<i64>,
    #[serde(default)]
    pub point_expiry_days: Option<i64>,
    #[serde(default)]
    pub sms_sender: Option<String>,
    #[serde(default)]
    pub line_channel_token: Option<String>,
}

impl ShopSettings {
    #[must_use]
    pub fn defaults_for(shop_id: ShopId) -> Self {
        Self {
            shop_id: Some(shop_id),
            ..Self::default()
        }
    }
}

/// Editable fields of a shop's settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopSettingsInput {
    #[serde(default)]
    pub point_rate: Option<Decimal>,
    #[serde(default)]
    pub welcome_points: Option<i64>,
    #[serde(default)]
    pub point_expiry_days: Option<i64>,
    #[serde(default)]
    pub sms_sender: Option<String>,
    #[serde(default)]
    pub line_channel_token: Option<String>,
}

/// Global configuration (referral commission rates).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsCenter {
    #[serde(default)]
    pub id: Option<SettingsId>,
    #[serde(default)]
    pub referral_point_value: Option<i64>,
    #[serde(default)]
    pub referral_cash_value: Option<Decimal>,
}

impl SettingsCenter {
    /// Commission for a reward type; unset rates are zero.
    #[must_use]
    pub fn reward_value(&self, reward_type: RewardType) -> Decimal {
        match reward_type {
            RewardType::Point => self
                .referral_point_value
                .map_or(Decimal::ZERO, Decimal::from),
            RewardType::Cash => self.referral_cash_value.unwrap_or(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsCenterInput {
    #[serde(default)]
    pub referral_point_value: Option<i64>,
    #[serde(default)]
    pub referral_cash_value: Option<Decimal>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_settings_serialize_nulls() {
        let settings = ShopSettings::defaults_for(ShopId::new("s1"));
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            value,
            json!({
                "id": null,
                "shop_id": "s1",
                "point_rate": null,
                "welcome_points": null,
                "point_expiry_days": null,
                "sms_sender": null,
                "line_channel_token": null,
            })
        );
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ShopUpdate {
            package_id: Some(PackageId::new("p1")),
            ..ShopUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"package_id": "p1"})
        );
    }

    #[test]
    fn test_reward_value_from_center() {
        let center = SettingsCenter {
            id: None,
            referral_point_value: Some(300),
            referral_cash_value: Some(Decimal::new(4999, 2)),
        };
        assert_eq!(center.reward_value(RewardType::Point), Decimal::from(300));
        assert_eq!(center.reward_value(RewardType::Cash), Decimal::new(4999, 2));
        assert_eq!(
            SettingsCenter::default().reward_value(RewardType::Cash),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_promotion_running_window() {
        let now = Utc::now();
        let mut promo = Promotion {
            id: PromotionId::new("p"),
            shop_id: ShopId::new("s"),
            name: "Free coffee".to_string(),
            description: None,
            image: None,
            point_cost: 100,
            starts_at: None,
            ends_at: None,
        };
        assert!(promo.is_running(now));

        promo.ends_at = Some(now - Duration::days(1));
        assert!(!promo.is_running(now));

        promo.ends_at = None;
        promo.starts_at = Some(now + Duration::hours(1));
        assert!(!promo.is_running(now));
    }

    #[test]
    fn test_customer_tolerates_missing_optional_fields() {
        let customer: Customer = serde_json::from_value(json!({
            "id": "c1",
            "shop_id": "s1",
            "name": "Ann",
            "phone": "0812345678"
        }))
        .unwrap();
        assert_eq!(customer.points, 0);
        assert!(customer.custom_fields.is_empty());
    }
}
