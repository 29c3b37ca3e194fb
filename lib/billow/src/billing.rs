//! Site-scoped billing client.

use billow_core::{
    ApiRequest, HttpTransport, ListParams, Method, PathTemplate, RetryPolicy, SiteContext,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::{ClientConfig, ClientConfigBuilder, Error, Executor, HyperClient, Pager, Result};

/// Client for one site of the billing API.
///
/// Cheap to clone and safe to share between tasks. Resource methods are
/// generic over the record type; use `serde_json::Value` when no typed model
/// is at hand.
///
/// # Example
///
/// ```no_run
/// use billow::BillingClient;
///
/// # async fn example() -> billow::Result<()> {
/// let client = BillingClient::builder()
///     .base_url("https://billing.example.com")
///     .api_key("my-api-key")
///     .site_id("subdomain-acme")
///     .build()?;
///
/// let account: serde_json::Value = client.get_account("code-bob").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BillingClient<C = HyperClient> {
    site: SiteContext,
    executor: Executor<C>,
}

impl BillingClient {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> BillingClientBuilder {
        BillingClientBuilder::default()
    }

    /// Create a client from `BILLOW_API_KEY`, `BILLOW_SITE_ID` and
    /// `BILLOW_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is missing or the URL is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Create a client with a pooled HTTPS transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the API key, site ID or base URL
    /// is missing.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::invalid_request("no API key configured"))?;
        let site_id = config
            .site_id
            .clone()
            .ok_or_else(|| Error::invalid_request("no site ID configured"))?;

        let transport = HyperClient::builder()
            .config(config.clone())
            .with_api_key(api_key)
            .with_logging()
            .build();
        let executor = Executor::from_config(transport, &config)?;

        Ok(Self::new(executor, SiteContext::new(site_id)))
    }
}

impl<C: HttpTransport> BillingClient<C> {
    /// Create a client for `site` over an existing executor.
    #[must_use]
    pub const fn new(executor: Executor<C>, site: SiteContext) -> Self {
        Self { site, executor }
    }

    /// The same client scoped to another site, sharing the transport.
    #[must_use]
    pub fn for_site(&self, site: SiteContext) -> Self {
        Self {
            site,
            executor: self.executor.clone(),
        }
    }

    /// The site this client is scoped to.
    #[must_use]
    pub const fn site(&self) -> &SiteContext {
        &self.site
    }

    /// The underlying executor.
    #[must_use]
    pub const fn executor(&self) -> &Executor<C> {
        &self.executor
    }

    /// Resolve a site-rooted path template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] if a placeholder has no value.
    pub fn path(&self, template: &PathTemplate, params: &[(&str, &str)]) -> Result<String> {
        self.site.path(template, params)
    }

    // ========================================================================
    // Generic verbs
    // ========================================================================

    /// GET `path` and decode the record.
    ///
    /// # Errors
    ///
    /// Returns the call or decode error.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = ApiRequest::builder(Method::Get, path).build();
        self.executor.execute_json(&request).await
    }

    /// POST a JSON body to `path`.
    ///
    /// A generated idempotency key makes the call safe to retry.
    ///
    /// # Errors
    ///
    /// Returns the serialization, call or decode error.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::builder(Method::Post, path).json(body)?.build();
        self.executor.execute_json(&request).await
    }

    /// POST a JSON body with a caller-chosen idempotency key.
    ///
    /// Repeating the call with the same key is deduplicated by the service.
    ///
    /// # Errors
    ///
    /// Returns the serialization, call or decode error.
    pub async fn post_idempotent<B, T>(&self, path: &str, body: &B, key: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::builder(Method::Post, path)
            .json(body)?
            .idempotency_key(key)
            .build();
        self.executor.execute_json(&request).await
    }

    /// PUT a JSON body to `path`.
    ///
    /// # Errors
    ///
    /// Returns the serialization, call or decode error.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::builder(Method::Put, path).json(body)?.build();
        self.executor.execute_json(&request).await
    }

    /// PUT to `path` without a body, for state transitions.
    ///
    /// # Errors
    ///
    /// Returns the call or decode error.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = ApiRequest::builder(Method::Put, path).build();
        self.executor.execute_json(&request).await
    }

    /// DELETE `path`.
    ///
    /// # Errors
    ///
    /// Returns the call or decode error.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = ApiRequest::builder(Method::Delete, path).build();
        self.executor.execute_json(&request).await
    }

    /// A lazy pager over the list at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be serialized.
    pub fn pager<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<Pager<T, C>> {
        let request = ApiRequest::builder(Method::Get, path).params(params)?.build();
        Ok(Pager::new(self.executor.clone(), request))
    }
}

/// Builder for [`BillingClient`].
#[derive(Debug, Default)]
pub struct BillingClientBuilder {
    config: ClientConfigBuilder,
    base_url: Option<String>,
}

impl BillingClientBuilder {
    /// Set the API root.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config = self.config.api_key(api_key);
        self
    }

    /// Set the site ID.
    #[must_use]
    pub fn site_id(mut self, site_id: impl Into<String>) -> Self {
        self.config = self.config.site_id(site_id);
        self
    }

    /// Set the call deadline, retries included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the per-attempt I/O timeout.
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.attempt_timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config = self.config.retry(retry);
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or a required setting
    /// is missing.
    pub fn build(self) -> Result<BillingClient> {
        let mut config = self.config;
        if let Some(base_url) = self.base_url {
            config = config.base_url(Url::parse(&base_url)?);
        }
        BillingClient::from_config(config.build())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn builder_requires_api_key() {
        let result = BillingClient::builder()
            .base_url("https://billing.example.com")
            .site_id("s1")
            .build();
        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("API key"));
    }

    #[test]
    fn builder_requires_site() {
        let result = BillingClient::builder()
            .base_url("https://billing.example.com")
            .api_key("k")
            .build();
        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("site"));
    }

    #[test]
    fn builder_requires_base_url() {
        let result = BillingClient::builder().api_key("k").site_id("s1").build();
        let_assert!(Err(Error::InvalidRequest(_)) = result);
    }

    #[test]
    fn builder_rejects_bad_url() {
        let result = BillingClient::builder()
            .base_url("::nope::")
            .api_key("k")
            .site_id("s1")
            .build();
        let_assert!(Err(Error::InvalidUrl(_)) = result);
    }

    #[test]
    fn for_site_switches_scope() {
        let client = BillingClient::builder()
            .base_url("https://billing.example.com")
            .api_key("k")
            .site_id("s1")
            .build()
            .expect("valid client");

        let other = client.for_site(SiteContext::new("s2"));
        check!(client.site().site_id() == "s1");
        check!(other.site().site_id() == "s2");
    }
}
