//! Promotions and promotion claims.

use tracing::instrument;

use shopcrm_core::{CustomerId, PromotionHistoryId, PromotionId, PromotionStatus, ShopId};

use super::{
    BackendClient, BackendError, NewPromotion, NewPromotionHistory, Promotion, PromotionDecision,
    PromotionHistory, PromotionUpdate,
};

/// Filters for listing promotion claims.
#[derive(Debug, Clone, Default)]
pub struct PromotionHistoryQuery<'a> {
    pub shop_id: Option<&'a ShopId>,
    pub customer_id: Option<&'a CustomerId>,
    pub status: Option<PromotionStatus>,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_promotions(&self, shop_id: &ShopId) -> Result<Vec<Promotion>, BackendError> {
        let url =
            self.endpoint_with_query(&["promotions"], &[("shop_id", Some(shop_id.as_str()))])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the promotion does not exist.
    #[instrument(skip(self), fields(promotion_id = %id))]
    pub async fn get_promotion(&self, id: &PromotionId) -> Result<Promotion, BackendError> {
        let url = self.endpoint(&["promotions", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, promotion), fields(shop_id = %promotion.shop_id))]
    pub async fn create_promotion(&self, promotion: &NewPromotion) -> Result<Promotion, BackendError> {
        let url = self.endpoint(&["promotions"])?;
        self.post(url, promotion).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(promotion_id = %id))]
    pub async fn update_promotion(
        &self,
        id: &PromotionId,
        update: &PromotionUpdate,
    ) -> Result<Promotion, BackendError> {
        let url = self.endpoint(&["promotions", id.as_str()])?;
        self.patch(url, update).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(promotion_id = %id))]
    pub async fn delete_promotion(&self, id: &PromotionId) -> Result<(), BackendError> {
        let url = self.endpoint(&["promotions", id.as_str()])?;
        self.delete(url).await
    }

    /// List promotion claims.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_promotion_histories(
        &self,
        query: &PromotionHistoryQuery<'_>,
    ) -> Result<Vec<PromotionHistory>, BackendError> {
        let url = self.endpoint_with_query(
            &["promotion-histories"],
            &[
                ("shop_id", query.shop_id.map(ShopId::as_str)),
                ("customer_id", query.customer_id.map(CustomerId::as_str)),
                ("status", query.status.map(PromotionStatus::as_str)),
            ],
        )?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the claim does not exist.
    #[instrument(skip(self), fields(history_id = %id))]
    pub async fn get_promotion_history(
        &self,
        id: &PromotionHistoryId,
    ) -> Result<PromotionHistory, BackendError> {
        let url = self.endpoint(&["promotion-histories", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, claim), fields(customer_id = %claim.customer_id, promotion_id = %claim.promotion_id))]
    pub async fn create_promotion_history(
        &self,
        claim: &NewPromotionHistory,
    ) -> Result<PromotionHistory, BackendError> {
        let url = self.endpoint(&["promotion-histories"])?;
        self.post(url, claim).await
    }

    /// Write an approval/rejection onto a claim.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, decision), fields(history_id = %id, status = decision.status.as_str()))]
    pub async fn decide_promotion_history(
        &self,
        id: &PromotionHistoryId,
        decision: &PromotionDecision,
    ) -> Result<PromotionHistory, BackendError> {
        let url = self.endpoint(&["promotion-histories", id.as_str()])?;
        self.patch(url, decision).await
    }
}
