//! CRM backend REST client.
//!
//! The backend owns every record; the console never caches or reconciles
//! them. This module provides:
//! - [`BackendClient`], a thin JSON client that adds the caller's bearer token
//!   and normalizes error responses into [`BackendError`]
//! - One file per resource family with typed request methods
//!
//! # API Reference
//!
//! - Base URL: `CRM_BACKEND_URL`
//! - Authentication: `Authorization: Bearer <auth_token>` from the session
//! - Errors: `{ "message" | "error": string }` with an HTTP status

mod auth;
mod customers;
mod error;
mod packages;
mod promotions;
mod referrals;
mod settings;
mod shops;
mod sms;
pub mod types;

pub use customers::CustomerQuery;
pub use error::BackendError;
pub use promotions::PromotionHistoryQuery;
pub use types::*;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;

/// CRM backend API client.
///
/// Cheap to clone. [`BackendClient::with_token`] returns a copy that sends the
/// given bearer token with every request; the shared connection pool is kept.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
    token: Option<SecretString>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Decode a record that comes back either bare or wrapped in `{ "data": ... }`.
///
/// A wrapped body that fails to decode falls back to the bare form; if that
/// fails too the wrapped error is returned, since it names the broken field.
fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value.get("data") {
        Some(data) => {
            T::deserialize(data).or_else(|wrapped| T::deserialize(&value).map_err(|_| wrapped))
        }
        None => T::deserialize(&value),
    }
}

impl BackendClient {
    /// Create a new backend client without a bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
            token: None,
        })
    }

    /// Copy of this client that authenticates as the given token.
    #[must_use]
    pub fn with_token(&self, token: SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: Some(token),
        }
    }

    /// Whether a bearer token is attached.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Url` if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Url(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Endpoint URL with query parameters; `None` values are skipped.
    pub(crate) fn endpoint_with_query(
        &self,
        segments: &[&str],
        query: &[(&str, Option<&str>)],
    ) -> Result<Url, BackendError> {
        let mut url = self.endpoint(segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(%url, "backend GET");
        let response = self.request(Method::GET, url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        debug!(%url, "backend POST");
        let response = self.request(Method::POST, url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a PATCH request with a JSON body.
    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        debug!(%url, "backend PATCH");
        let response = self.request(Method::PATCH, url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request with a JSON body.
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        debug!(%url, "backend PUT");
        let response = self.request(Method::PUT, url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request, ignoring any body.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), BackendError> {
        debug!(%url, "backend DELETE");
        let response = self.request(Method::DELETE, url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let bytes = response.bytes().await?;
        decode_envelope(&bytes).map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Parse an error response.
    async fn parse_error(response: Response) -> BackendError {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let error = BackendError::from_status(status, &body);
        warn!(%url, status = status.as_u16(), error = %error, "backend request failed");
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::config::parse_base_url;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig::new(parse_base_url(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://backend.local/api");
        let url = client.endpoint(&["settings", "shop-1"]).unwrap();
        assert_eq!(url.as_str(), "http://backend.local/api/settings/shop-1");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://backend.local/");
        let url = client.endpoint(&["customers", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://backend.local/customers/a%2Fb%20c");
    }

    #[test]
    fn test_endpoint_query_skips_none() {
        let client = client("http://backend.local/");
        let url = client
            .endpoint_with_query(&["customers"], &[("shop_id", Some("s1")), ("branch_id", None)])
            .unwrap();
        assert_eq!(url.as_str(), "http://backend.local/customers?shop_id=s1");

        let url = client
            .endpoint_with_query(&["customers"], &[("branch_id", None)])
            .unwrap();
        assert_eq!(url.as_str(), "http://backend.local/customers");
    }

    #[test]
    fn test_with_token_shares_pool_and_redacts() {
        let base = client("http://backend.local/");
        assert!(!base.is_authenticated());

        let authed = base.with_token(SecretString::from("tok-123"));
        assert!(authed.is_authenticated());
        assert!(Arc::ptr_eq(&base.inner, &authed.inner));
        assert!(!format!("{authed:?}").contains("tok-123"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
        #[serde(default)]
        data: Option<String>,
    }

    #[test]
    fn test_envelope_accepts_wrapped_and_bare() {
        let wrapped: Vec<u32> = decode_envelope(br#"{"data":[1,2]}"#).unwrap();
        assert_eq!(wrapped, vec![1, 2]);

        let bare: Vec<u32> = decode_envelope(b"[3]").unwrap();
        assert_eq!(bare, vec![3]);

        // A bare record with its own `data` field still decodes
        let named: Named = decode_envelope(br#"{"name":"Ann","data":"x"}"#).unwrap();
        assert_eq!(named.name, "Ann");
        assert_eq!(named.data.as_deref(), Some("x"));
    }

    #[test]
    fn test_envelope_error_names_the_field() {
        let err = decode_envelope::<Named>(br#"{"data":{"nick":"Ann"}}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `name`"), "{err}");

        let err = decode_envelope::<Named>(br#"{"name":7}"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"), "{err}");
    }
}
