//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//!
//! # Auth
//! GET  /login                               - Login page state
//! GET  /verify-otp                          - OTP page state
//! POST /api/auth/login                      - Exchange credentials for a session
//! POST /api/auth/logout                     - Clear the session
//! POST /api/auth/otp/request                - Send an OTP
//! POST /api/auth/otp/verify                 - Verify an OTP
//! GET  /api/session                         - Session contents
//! GET  /api/navigation                      - Menu for the session user
//!
//! # Shops (superadmin unless noted)
//! GET|POST         /api/shops
//! GET|PATCH|DELETE /api/shops/{id}          - GET also for the shop's own users
//! POST             /api/shops/{id}/renew    - Renew on a package
//! GET              /api/package-renewals    - Renewal history
//! GET|POST         /api/branches
//! GET|PATCH|DELETE /api/branches/{id}
//! GET|POST         /api/employees
//! GET|DELETE       /api/employees/{id}
//!
//! # Customers & points
//! GET|POST         /api/customers
//! GET|PATCH|DELETE /api/customers/{id}
//! GET              /api/customers/{id}/points
//! POST             /api/points
//! GET|POST         /api/custom-fields
//! DELETE           /api/custom-fields/{id}
//!
//! # Promotions
//! GET|POST         /api/promotions
//! GET|PATCH|DELETE /api/promotions/{id}
//! POST             /api/promotions/{id}/claim
//! GET              /api/promotion-histories
//! POST             /api/promotion-histories/{id}/approve
//! POST             /api/promotion-histories/{id}/reject
//!
//! # Referrals (superadmin)
//! GET|POST         /api/referrers
//! GET|PATCH        /api/referrers/{id}
//! GET|POST         /api/referral-histories
//! PATCH            /api/referral-histories/{id}
//!
//! # Packages
//! GET|POST         /api/packages
//! GET|PATCH|DELETE /api/packages/{id}
//!
//! # SMS templates
//! GET|POST         /api/sms-templates
//! GET|PATCH|DELETE /api/sms-templates/{id}
//! POST             /api/sms-templates/{id}/render
//!
//! # Settings
//! GET|PUT          /api/settings
//! GET|PUT          /api/settings-center
//! ```

use axum::{Json, Router, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};

use shopcrm_core::ShopId;

use crate::state::AppState;

pub mod auth;
pub mod customers;
pub mod navigation;
pub mod packages;
pub mod promotions;
pub mod referrals;
pub mod settings;
pub mod shops;
pub mod sms;

/// `?shop_id=` on list endpoints. Optional for shop users, whose shop
/// comes from the session.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

/// Build the full console router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(navigation::router())
        .merge(shops::router())
        .merge(customers::router())
        .merge(promotions::router())
        .merge(referrals::router())
        .merge(packages::router())
        .merge(sms::router())
        .merge(settings::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
