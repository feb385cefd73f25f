//! Role-based navigation menu.
//!
//! Two independent filters run over the flat menu:
//! 1. [`filter_by_role`] hides items whose `required_role` does not match
//! 2. [`restrict_to_package`] hides items the shop's package does not unlock
//!
//! Both preserve order.

use serde::{Deserialize, Serialize};

use shopcrm_core::Role;

/// Menu keys every shop gets regardless of package.
pub const ALWAYS_AVAILABLE: &[&str] = &["dashboard"];

/// Key of the item employees never see.
const PROMOTIONS_KEY: &str = "promotions";

/// A navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub key: String,
    pub title: String,
    pub href: String,
    /// Role name the item is limited to. Compared case-insensitively.
    #[serde(default)]
    pub required_role: Option<String>,
}

impl NavItem {
    fn new(key: &str, title: &str, href: &str, required_role: Option<Role>) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            href: href.to_string(),
            required_role: required_role.map(|role| role.as_str().to_string()),
        }
    }
}

/// The console's full menu, before filtering.
#[must_use]
pub fn default_menu() -> Vec<NavItem> {
    vec![
        NavItem::new("dashboard", "Dashboard", "/", None),
        NavItem::new("shops", "Shops", "/shops", Some(Role::SuperAdmin)),
        NavItem::new("packages", "Packages", "/packages", Some(Role::SuperAdmin)),
        NavItem::new("referrers", "Referrers", "/referrers", Some(Role::SuperAdmin)),
        NavItem::new(
            "settings-center",
            "Settings Center",
            "/settings-center",
            Some(Role::SuperAdmin),
        ),
        NavItem::new("branches", "Branches", "/branches", Some(Role::Admin)),
        NavItem::new("employees", "Employees", "/employees", Some(Role::Admin)),
        NavItem::new("customers", "Customers", "/customers", None),
        NavItem::new("points", "Points", "/points", None),
        NavItem::new(PROMOTIONS_KEY, "Promotions", "/promotions", None),
        NavItem::new(
            "promotion-histories",
            "Promotion Claims",
            "/promotion-histories",
            None,
        ),
        NavItem::new("sms-templates", "SMS Templates", "/sms-templates", Some(Role::Admin)),
        NavItem::new("custom-fields", "Custom Fields", "/custom-fields", Some(Role::Admin)),
        NavItem::new("settings", "Settings", "/settings", Some(Role::Admin)),
        NavItem::new("my-points", "My Points", "/my-points", Some(Role::Customer)),
    ]
}

/// Items visible to `role`.
///
/// An item passes when it has no required role or the required role names
/// the user's role (ignoring case). The promotions item is never shown to
/// employees. With no known role only unrestricted items pass.
#[must_use]
pub fn filter_by_role(items: &[NavItem], role: Option<Role>) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| {
            if role == Some(Role::Employee) && item.key == PROMOTIONS_KEY {
                return false;
            }
            match (&item.required_role, role) {
                (None, _) => true,
                (Some(required), Some(role)) => role.matches(required),
                (Some(_), None) => false,
            }
        })
        .cloned()
        .collect()
}

/// Items the shop's package unlocks.
///
/// Superadmins are not restricted. Shop users keep [`ALWAYS_AVAILABLE`]
/// items plus whatever `menus` lists; without a package only the former.
#[must_use]
pub fn restrict_to_package(items: Vec<NavItem>, role: Role, menus: Option<&[String]>) -> Vec<NavItem> {
    if !role.is_shop_scoped() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            ALWAYS_AVAILABLE.contains(&item.key.as_str())
                || menus.is_some_and(|menus| menus.iter().any(|m| m == &item.key))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, role: Option<&str>) -> NavItem {
        NavItem {
            key: key.to_string(),
            title: key.to_string(),
            href: format!("/{key}"),
            required_role: role.map(str::to_string),
        }
    }

    fn keys(items: &[NavItem]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn test_required_role_matches_case_insensitively() {
        let items = vec![
            item("a", Some("Admin")),
            item("b", Some("superadmin")),
            item("c", None),
            item("d", Some("ADMIN")),
        ];
        assert_eq!(keys(&filter_by_role(&items, Some(Role::Admin))), ["a", "c", "d"]);
        assert_eq!(keys(&filter_by_role(&items, Some(Role::SuperAdmin))), ["b", "c"]);
    }

    #[test]
    fn test_promotions_hidden_for_employee_only() {
        let items = vec![item("dashboard", None), item("promotions", None)];
        assert_eq!(keys(&filter_by_role(&items, Some(Role::Employee))), ["dashboard"]);
        assert_eq!(
            keys(&filter_by_role(&items, Some(Role::Customer))),
            ["dashboard", "promotions"]
        );
        assert_eq!(
            keys(&filter_by_role(&items, Some(Role::Admin))),
            ["dashboard", "promotions"]
        );
    }

    #[test]
    fn test_unknown_role_sees_only_unrestricted() {
        let items = vec![item("a", Some("admin")), item("b", None)];
        assert_eq!(keys(&filter_by_role(&items, None)), ["b"]);
    }

    #[test]
    fn test_default_menu_for_employee() {
        let visible = filter_by_role(&default_menu(), Some(Role::Employee));
        let keys = keys(&visible);
        assert!(keys.contains(&"customers"));
        assert!(!keys.contains(&"promotions"));
        assert!(!keys.contains(&"employees"));
        assert!(!keys.contains(&"shops"));
    }

    #[test]
    fn test_package_restriction() {
        let items = vec![item("dashboard", None), item("customers", None), item("sms-templates", None)];
        let menus = vec!["customers".to_string()];

        let restricted = restrict_to_package(items.clone(), Role::Admin, Some(&menus));
        assert_eq!(keys(&restricted), ["dashboard", "customers"]);

        let no_package = restrict_to_package(items.clone(), Role::Employee, None);
        assert_eq!(keys(&no_package), ["dashboard"]);

        let superadmin = restrict_to_package(items, Role::SuperAdmin, None);
        assert_eq!(superadmin.len(), 3);
    }
}
