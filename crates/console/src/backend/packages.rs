//! Subscription packages and renewals.

use tracing::instrument;

use shopcrm_core::{PackageId, ShopId};

use super::{
    BackendClient, BackendError, NewPackage, NewPackageRenewal, Package, PackageRenewal,
    PackageUpdate,
};

impl BackendClient {
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_packages(&self) -> Result<Vec<Package>, BackendError> {
        let url = self.endpoint(&["packages"])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the package does not exist.
    #[instrument(skip(self), fields(package_id = %id))]
    pub async fn get_package(&self, id: &PackageId) -> Result<Package, BackendError> {
        let url = self.endpoint(&["packages", id.as_str()])?;
        self.get(url).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, package), fields(name = %package.name))]
    pub async fn create_package(&self, package: &NewPackage) -> Result<Package, BackendError> {
        let url = self.endpoint(&["packages"])?;
        self.post(url, package).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update), fields(package_id = %id))]
    pub async fn update_package(
        &self,
        id: &PackageId,
        update: &PackageUpdate,
    ) -> Result<Package, BackendError> {
        let url = self.endpoint(&["packages", id.as_str()])?;
        self.patch(url, update).await
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(package_id = %id))]
    pub async fn delete_package(&self, id: &PackageId) -> Result<(), BackendError> {
        let url = self.endpoint(&["packages", id.as_str()])?;
        self.delete(url).await
    }

    /// Renewal history, optionally for one shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_package_renewals(
        &self,
        shop_id: Option<&ShopId>,
    ) -> Result<Vec<PackageRenewal>, BackendError> {
        let url = self.endpoint_with_query(
            &["package-renewals"],
            &[("shop_id", shop_id.map(ShopId::as_str))],
        )?;
        self.get(url).await
    }

    /// Record a package purchase. Does not touch the shop record.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, renewal), fields(shop_id = %renewal.shop_id, package_id = %renewal.package_id))]
    pub async fn create_package_renewal(
        &self,
        renewal: &NewPackageRenewal,
    ) -> Result<PackageRenewal, BackendError> {
        let url = self.endpoint(&["package-renewals"])?;
        self.post(url, renewal).await
    }
}
