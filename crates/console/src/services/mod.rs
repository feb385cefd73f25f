//! Orchestration on top of the backend client.
//!
//! # Services
//!
//! - `lookup` - Concurrent display-name resolution for list views
//! - `points` - Points adjustments and history
//! - `promotions` - Promotion claims, approval and annotated listing
//! - `referrals` - Referral rewards and status progression
//! - `renewal` - Package renewal and the shop subscription window
//! - `settings` - Settings reads with the default-record fallback
//! - `sms` - SMS template rendering

pub mod lookup;
pub mod points;
pub mod promotions;
pub mod referrals;
pub mod renewal;
pub mod settings;
pub mod sms;

pub use renewal::{RenewalOutcome, renew_package};
pub use settings::{settings_center_or_default, shop_settings_or_default};
