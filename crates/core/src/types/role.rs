//! User roles.

use serde::{Deserialize, Serialize};

/// Role of a console user.
///
/// The backend sends roles as lowercase strings, but stored session data and
/// navigation definitions are not always consistent about case, so parsing
/// is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform operator. Manages shops, packages, referrers and the
    /// settings-center.
    #[serde(alias = "SuperAdmin", alias = "SUPERADMIN", alias = "super_admin")]
    SuperAdmin,
    /// Shop owner. Manages branches, employees, customers and shop settings.
    #[serde(alias = "Admin", alias = "ADMIN")]
    Admin,
    /// Shop staff. Manages customers and points, approves promotion claims.
    #[serde(alias = "Employee", alias = "EMPLOYEE")]
    Employee,
    /// Loyalty member. Sees their own points and claims promotions.
    #[serde(alias = "Customer", alias = "CUSTOMER")]
    Customer,
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Self; 4] = [Self::SuperAdmin, Self::Admin, Self::Employee, Self::Customer];

    /// Canonical lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "superadmin",
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Customer => "customer",
        }
    }

    /// Whether this role works inside a single shop (everyone but superadmin).
    #[must_use]
    pub const fn is_shop_scoped(self) -> bool {
        !matches!(self, Self::SuperAdmin)
    }

    /// Whether this role may manage shop staff-facing data (customers, points).
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::Employee)
    }

    /// Case-insensitive comparison against a role name.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.matches(s))
            .ok_or_else(|| format!("invalid role: {s}"))
    }
}
