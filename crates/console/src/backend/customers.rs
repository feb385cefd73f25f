//! Customers, custom fields and points history.

use tracing::instrument;

use shopcrm_core::{BranchId, CustomFieldId, CustomerId, ShopId};

use super::{
    BackendClient, BackendError, CustomField, Customer, CustomerUpdate, NewCustomField,
    NewCustomer, NewPointsEntry, PointsHistory,
};

/// Filters for listing customers.
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery<'a> {
    pub shop_id: Option<&'a ShopId>,
    pub branch_id: Option<&'a BranchId>,
    pub search: Option<&'a str>,
}

impl BackendClient {
    /// List customers.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_customers(&self, query: &CustomerQuery<'_>) -> Result<Vec<Customer>, BackendError> {
        let url = self.endpoint_with_query(
            &["customers"],
            &[
                ("shop_id", query.shop_id.map(ShopId::as_str)),
                ("branch_id", query.branch_id.map(BranchId::as_str)),
                ("search", query.search),
            ],
        )?;
        self.get(url).await
    }

    /// Get a customer by ID. The `points` field is the current balance.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the customer does not exist.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: &CustomerId) -> Result<Customer, BackendError> {
        let url = self.endpoint(&["customers", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, customer), fields(shop_id = %customer.shop_id))]
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, BackendError> {
        let url = self.endpoint(&["customers"])?;
        self.post(url, customer).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: &CustomerId,
        update: &CustomerUpdate,
    ) -> Result<Customer, BackendError> {
        let url = self.endpoint(&["customers", id.as_str()])?;
        self.patch(url, update).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: &CustomerId) -> Result<(), BackendError> {
        let url = self.endpoint(&["customers", id.as_str()])?;
        self.delete(url).await
    }

    /// Custom field definitions of a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_custom_fields(&self, shop_id: &ShopId) -> Result<Vec<CustomField>, BackendError> {
        let url =
            self.endpoint_with_query(&["custom-fields"], &[("shop_id", Some(shop_id.as_str()))])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, field), fields(shop_id = %field.shop_id, key = %field.key))]
    pub async fn create_custom_field(&self, field: &NewCustomField) -> Result<CustomField, BackendError> {
        let url = self.endpoint(&["custom-fields"])?;
        self.post(url, field).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(field_id = %id))]
    pub async fn delete_custom_field(&self, id: &CustomFieldId) -> Result<(), BackendError> {
        let url = self.endpoint(&["custom-fields", id.as_str()])?;
        self.delete(url).await
    }

    /// Points history of one customer, newest first as the backend returns it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_points_history(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<PointsHistory>, BackendError> {
        let url = self
            .endpoint_with_query(&["points"], &[("customer_id", Some(customer_id.as_str()))])?;
        self.get(url).await
    }

    /// Record a points change. The backend applies it to the balance.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, entry), fields(customer_id = %entry.customer_id, points = entry.points))]
    pub async fn create_points_entry(&self, entry: &NewPointsEntry) -> Result<PointsHistory, BackendError> {
        let url = self.endpoint(&["points"])?;
        self.post(url, entry).await
    }
}
