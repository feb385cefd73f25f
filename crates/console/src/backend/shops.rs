//! Shops, branches and staff accounts.

use tracing::instrument;

use shopcrm_core::{BranchId, ShopId, UserId};

use super::{
    BackendClient, BackendError, Branch, BranchUpdate, Employee, NewBranch, NewEmployee, NewShop,
    Shop, ShopUpdate,
};

impl BackendClient {
    /// List all shops (superadmin).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_shops(&self) -> Result<Vec<Shop>, BackendError> {
        let url = self.endpoint(&["shops"])?;
        self.get(url).await
    }

    /// Get a shop by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the shop does not exist.
    #[instrument(skip(self), fields(shop_id = %id))]
    pub async fn get_shop(&self, id: &ShopId) -> Result<Shop, BackendError> {
        let url = self.endpoint(&["shops", id.as_str()])?;
        self.get(url).await
    }

    /// Create a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, shop), fields(name = %shop.name))]
    pub async fn create_shop(&self, shop: &NewShop) -> Result<Shop, BackendError> {
        let url = self.endpoint(&["shops"])?;
        self.post(url, shop).await
    }

    /// Partially update a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(shop_id = %id))]
    pub async fn update_shop(&self, id: &ShopId, update: &ShopUpdate) -> Result<Shop, BackendError> {
        let url = self.endpoint(&["shops", id.as_str()])?;
        self.patch(url, update).await
    }

    /// Delete a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %id))]
    pub async fn delete_shop(&self, id: &ShopId) -> Result<(), BackendError> {
        let url = self.endpoint(&["shops", id.as_str()])?;
        self.delete(url).await
    }

    /// List the branches of a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_branches(&self, shop_id: &ShopId) -> Result<Vec<Branch>, BackendError> {
        let url = self.endpoint_with_query(&["branches"], &[("shop_id", Some(shop_id.as_str()))])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the branch does not exist.
    #[instrument(skip(self), fields(branch_id = %id))]
    pub async fn get_branch(&self, id: &BranchId) -> Result<Branch, BackendError> {
        let url = self.endpoint(&["branches", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, branch), fields(shop_id = %branch.shop_id))]
    pub async fn create_branch(&self, branch: &NewBranch) -> Result<Branch, BackendError> {
        let url = self.endpoint(&["branches"])?;
        self.post(url, branch).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(branch_id = %id))]
    pub async fn update_branch(
        &self,
        id: &BranchId,
        update: &BranchUpdate,
    ) -> Result<Branch, BackendError> {
        let url = self.endpoint(&["branches", id.as_str()])?;
        self.patch(url, update).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(branch_id = %id))]
    pub async fn delete_branch(&self, id: &BranchId) -> Result<(), BackendError> {
        let url = self.endpoint(&["branches", id.as_str()])?;
        self.delete(url).await
    }

    /// List staff accounts of a shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_employees(&self, shop_id: &ShopId) -> Result<Vec<Employee>, BackendError> {
        let url = self.endpoint_with_query(&["employees"], &[("shop_id", Some(shop_id.as_str()))])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the account does not exist.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_employee(&self, id: &UserId) -> Result<Employee, BackendError> {
        let url = self.endpoint(&["employees", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, employee), fields(shop_id = %employee.shop_id, role = %employee.role))]
    pub async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, BackendError> {
        let url = self.endpoint(&["employees"])?;
        self.post(url, employee).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_employee(&self, id: &UserId) -> Result<(), BackendError> {
        let url = self.endpoint(&["employees", id.as_str()])?;
        self.delete(url).await
    }
}
