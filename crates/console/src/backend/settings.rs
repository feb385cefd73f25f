//! Per-shop settings and the global settings-center.
//!
//! These calls return the backend's answer as-is, including the 400/404 it
//! gives for rows that were never created. Default substitution lives in
//! `services::settings`.

use tracing::instrument;

use shopcrm_core::ShopId;

use super::{
    BackendClient, BackendError, SettingsCenter, SettingsCenterInput, ShopSettings,
    ShopSettingsInput,
};

impl BackendClient {
    /// # Errors
    ///
    /// Returns `BackendError::NotFound`/`BadRequest` when the shop has no row.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn get_shop_settings(&self, shop_id: &ShopId) -> Result<ShopSettings, BackendError> {
        let url = self.endpoint(&["settings", shop_id.as_str()])?;
        self.get(url).await
    }

    /// Create or replace the shop's settings row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, input), fields(shop_id = %shop_id))]
    pub async fn put_shop_settings(
        &self,
        shop_id: &ShopId,
        input: &ShopSettingsInput,
    ) -> Result<ShopSettings, BackendError> {
        let url = self.endpoint(&["settings", shop_id.as_str()])?;
        self.put(url, input).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound`/`BadRequest` when no row exists yet.
    #[instrument(skip(self))]
    pub async fn get_settings_center(&self) -> Result<SettingsCenter, BackendError> {
        let url = self.endpoint(&["settings-center"])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, input))]
    pub async fn put_settings_center(
        &self,
        input: &SettingsCenterInput,
    ) -> Result<SettingsCenter, BackendError> {
        let url = self.endpoint(&["settings-center"])?;
        self.put(url, input).await
    }
}
