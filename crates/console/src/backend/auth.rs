//! Login and OTP endpoints.

use tracing::instrument;

use super::{
    BackendClient, BackendError, LoginRequest, LoginResponse, OtpRequest, OtpTicket,
    OtpVerifyRequest, OtpVerifyResponse,
};

impl BackendClient {
    /// Exchange credentials for a bearer token and the user record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for bad credentials.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.post(url, request).await
    }

    /// Ask the backend to text an OTP to the phone.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn request_otp(&self, request: &OtpRequest) -> Result<OtpTicket, BackendError> {
        let url = self.endpoint(&["auth", "otp", "request"])?;
        self.post(url, request).await
    }

    /// Check an OTP. A wrong code is `verified: false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn verify_otp(
        &self,
        request: &OtpVerifyRequest,
    ) -> Result<OtpVerifyResponse, BackendError> {
        let url = self.endpoint(&["auth", "otp", "verify"])?;
        self.post(url, request).await
    }
}
