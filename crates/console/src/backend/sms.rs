//! SMS templates.

use tracing::instrument;

use shopcrm_core::{ShopId, SmsTemplateId};

use super::{BackendClient, BackendError, NewSmsTemplate, SmsTemplate, SmsTemplateUpdate};

impl BackendClient {
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_sms_templates(&self, shop_id: &ShopId) -> Result<Vec<SmsTemplate>, BackendError> {
        let url =
            self.endpoint_with_query(&["sms-templates"], &[("shop_id", Some(shop_id.as_str()))])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the template does not exist.
    #[instrument(skip(self), fields(template_id = %id))]
    pub async fn get_sms_template(&self, id: &SmsTemplateId) -> Result<SmsTemplate, BackendError> {
        let url = self.endpoint(&["sms-templates", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, template), fields(shop_id = %template.shop_id))]
    pub async fn create_sms_template(
        &self,
        template: &NewSmsTemplate,
    ) -> Result<SmsTemplate, BackendError> {
        let url = self.endpoint(&["sms-templates"])?;
        self.post(url, template).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(template_id = %id))]
    pub async fn update_sms_template(
        &self,
        id: &SmsTemplateId,
        update: &SmsTemplateUpdate,
    ) -> Result<SmsTemplate, BackendError> {
        let url = self.endpoint(&["sms-templates", id.as_str()])?;
        self.patch(url, update).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(template_id = %id))]
    pub async fn delete_sms_template(&self, id: &SmsTemplateId) -> Result<(), BackendError> {
        let url = self.endpoint(&["sms-templates", id.as_str()])?;
        self.delete(url).await
    }
}
