//! Session-related types for console authentication.
//!
//! Types stored in the session for authentication state. The key names match
//! what the browser build kept in `localStorage`, so a page layer can read the
//! same names from `/api/session`.

use serde::{Deserialize, Serialize};

use shopcrm_core::{BranchId, Role, ShopId, UserId};

use crate::backend::AuthUser;

/// Session-stored identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role/permission level.
    pub role: Role,
    /// Shop the user belongs to (none for superadmins).
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    /// Branch the user works at, if any.
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    /// Phone used for OTP.
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the phone was verified by OTP.
    #[serde(default)]
    pub otp_verify: bool,
}

impl CurrentUser {
    /// A customer who has not completed OTP verification yet.
    #[must_use]
    pub fn needs_otp(&self) -> bool {
        self.role == Role::Customer && !self.otp_verify
    }
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            shop_id: user.shop_id,
            branch_id: user.branch_id,
            phone: user.phone,
            otp_verify: user.otp_verify,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Bearer token for the backend.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Serialized [`super::CurrentUser`].
    pub const USER: &str = "user";

    /// LINE login access token, when the user signed in through LINE.
    pub const LINE_TOKEN: &str = "line_token";

    /// Active shop ID.
    pub const SHOP_ID: &str = "shop_id";

    /// Active branch ID.
    pub const BRANCH_ID: &str = "branch_id";
}
