//! Settings reads with a default-record fallback.
//!
//! Settings rows are created lazily, so "not there yet" is normal. A 400 or
//! 404 from the backend yields the default record (`id: null`, every field
//! null) instead of an error. Any other failure is returned as-is.

use tracing::{debug, instrument};

use shopcrm_core::ShopId;

use crate::backend::{BackendClient, BackendError, SettingsCenter, ShopSettings};

/// Replace a missing-record error with `default()`.
pub(crate) fn or_default<T>(
    result: Result<T, BackendError>,
    default: impl FnOnce() -> T,
) -> Result<T, BackendError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_missing_record() => {
            debug!(error = %err, "no record yet, using defaults");
            Ok(default())
        }
        Err(err) => Err(err),
    }
}

/// A shop's settings, or the defaults when none were saved.
///
/// # Errors
///
/// Returns any backend error other than 400/404.
#[instrument(skip(api), fields(shop_id = %shop_id))]
pub async fn shop_settings_or_default(
    api: &BackendClient,
    shop_id: &ShopId,
) -> Result<ShopSettings, BackendError> {
    or_default(api.get_shop_settings(shop_id).await, || {
        ShopSettings::defaults_for(shop_id.clone())
    })
}

/// The settings-center, or the defaults when none was saved.
///
/// # Errors
///
/// Returns any backend error other than 400/404.
#[instrument(skip(api))]
pub async fn settings_center_or_default(
    api: &BackendClient,
) -> Result<SettingsCenter, BackendError> {
    or_default(api.get_settings_center().await, SettingsCenter::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ShopSettings {
        ShopSettings::defaults_for(ShopId::new("s1"))
    }

    #[test]
    fn test_not_found_yields_default() {
        let settings = or_default(Err(BackendError::NotFound("x".into())), defaults).unwrap();
        assert_eq!(settings.id, None);
        assert_eq!(settings.point_rate, None);
        assert_eq!(settings.shop_id, Some(ShopId::new("s1")));
    }

    #[test]
    fn test_bad_request_yields_default() {
        let settings = or_default(Err(BackendError::BadRequest("x".into())), defaults).unwrap();
        assert_eq!(settings, defaults());
    }

    #[test]
    fn test_other_errors_propagate() {
        let result = or_default(Err(BackendError::Unauthorized("x".into())), defaults);
        assert!(matches!(result, Err(BackendError::Unauthorized(_))));

        let result = or_default(
            Err(BackendError::Api {
                status: 500,
                message: "boom".into(),
            }),
            defaults,
        );
        assert!(matches!(result, Err(BackendError::Api { status: 500, .. })));
    }

    #[test]
    fn test_success_passes_through() {
        let saved = ShopSettings {
            welcome_points: Some(20),
            ..defaults()
        };
        assert_eq!(or_default(Ok(saved.clone()), defaults).unwrap(), saved);
    }
}
