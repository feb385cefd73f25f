//! Referrers and referral commissions.

use tracing::instrument;

use shopcrm_core::{ReferralHistoryId, ReferrerId};

use super::{
    BackendClient, BackendError, NewReferralHistory, NewReferrer, ReferralHistory,
    ReferralStatusUpdate, Referrer, ReferrerUpdate,
};

impl BackendClient {
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_referrers(&self) -> Result<Vec<Referrer>, BackendError> {
        let url = self.endpoint(&["referrers"])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the referrer does not exist.
    #[instrument(skip(self), fields(referrer_id = %id))]
    pub async fn get_referrer(&self, id: &ReferrerId) -> Result<Referrer, BackendError> {
        let url = self.endpoint(&["referrers", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, referrer), fields(code = %referrer.referral_code))]
    pub async fn create_referrer(&self, referrer: &NewReferrer) -> Result<Referrer, BackendError> {
        let url = self.endpoint(&["referrers"])?;
        self.post(url, referrer).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(referrer_id = %id))]
    pub async fn update_referrer(
        &self,
        id: &ReferrerId,
        update: &ReferrerUpdate,
    ) -> Result<Referrer, BackendError> {
        let url = self.endpoint(&["referrers", id.as_str()])?;
        self.patch(url, update).await
    }

    /// Referral commissions, optionally for one referrer.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_referral_histories(
        &self,
        referrer_id: Option<&ReferrerId>,
    ) -> Result<Vec<ReferralHistory>, BackendError> {
        let url = self.endpoint_with_query(
            &["referral-histories"],
            &[("referrer_id", referrer_id.map(ReferrerId::as_str))],
        )?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the row does not exist.
    #[instrument(skip(self), fields(history_id = %id))]
    pub async fn get_referral_history(
        &self,
        id: &ReferralHistoryId,
    ) -> Result<ReferralHistory, BackendError> {
        let url = self.endpoint(&["referral-histories", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, history), fields(referrer_id = %history.referrer_id))]
    pub async fn create_referral_history(
        &self,
        history: &NewReferralHistory,
    ) -> Result<ReferralHistory, BackendError> {
        let url = self.endpoint(&["referral-histories"])?;
        self.post(url, history).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(history_id = %id, status = update.status.as_str()))]
    pub async fn update_referral_status(
        &self,
        id: &ReferralHistoryId,
        update: ReferralStatusUpdate,
    ) -> Result<ReferralHistory, BackendError> {
        let url = self.endpoint(&["referral-histories", id.as_str()])?;
        self.patch(url, &update).await
    }
}
