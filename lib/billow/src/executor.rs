//! Request execution: headers, idempotency keys, retries and the call
//! deadline.
//!
//! One [`Executor::execute`] is one logical call. It may make several
//! attempts through the [`HttpTransport`], but never past the call deadline
//! and never more than the [`RetryPolicy`] allows.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use billow_core::{
    ApiRequest, DefaultErrorDecoder, ErrorDecoder, HttpRequest, HttpTransport, JSON_CONTENT_TYPE,
    Method, Page, Response, RetryPolicy,
};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use crate::{ClientConfig, Error, HyperClient, Result};

/// Header carrying the idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// A call result with its attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed<T> {
    /// The decoded result.
    pub value: T,
    /// Attempts made, the successful one included.
    pub attempts: u32,
}

impl<T> Executed<T> {
    /// Attempts beyond the first.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    fn map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Executed<U>> {
        Ok(Executed {
            value: f(self.value)?,
            attempts: self.attempts,
        })
    }
}

/// Runs [`ApiRequest`]s against the API root.
///
/// # Example
///
/// ```no_run
/// use billow::{Executor, HyperClient};
/// use billow_core::{ApiRequest, Method};
/// use url::Url;
///
/// # async fn example() -> billow::Result<()> {
/// let transport = HyperClient::builder().with_api_key("my-api-key").build();
/// let executor = Executor::new(transport, Url::parse("https://billing.example.com")?);
///
/// let request = ApiRequest::builder(Method::Get, "/sites/subdomain-acme").build();
/// let site: serde_json::Value = executor.execute_json(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Executor<C = HyperClient> {
    transport: C,
    base_url: Url,
    retry: RetryPolicy,
    timeout: Duration,
    user_agent: Arc<str>,
    generate_idempotency_keys: bool,
    decoder: Arc<dyn ErrorDecoder>,
}

impl<C> fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("generate_idempotency_keys", &self.generate_idempotency_keys)
            .finish_non_exhaustive()
    }
}

impl<C: HttpTransport> Executor<C> {
    /// Create an executor with default policy, deadline and error decoder.
    #[must_use]
    pub fn new(transport: C, base_url: Url) -> Self {
        let defaults = ClientConfig::default();
        Self {
            transport,
            base_url,
            retry: defaults.retry,
            timeout: defaults.timeout,
            user_agent: Arc::from(defaults.user_agent),
            generate_idempotency_keys: true,
            decoder: Arc::new(DefaultErrorDecoder),
        }
    }

    /// Create an executor from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if no base URL is configured.
    pub fn from_config(transport: C, config: &ClientConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| Error::invalid_request("no base URL configured"))?;

        Ok(Self::new(transport, base_url)
            .with_retry(config.retry)
            .with_timeout(config.timeout)
            .with_user_agent(config.user_agent.as_str()))
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Arc::from(user_agent);
        self
    }

    /// Whether POSTs without a caller key get a generated one (default on).
    ///
    /// When off, such POSTs are sent once and never retried.
    #[must_use]
    pub const fn with_generated_idempotency_keys(mut self, enabled: bool) -> Self {
        self.generate_idempotency_keys = enabled;
        self
    }

    /// Replace the error decoder.
    #[must_use]
    pub fn with_error_decoder(mut self, decoder: impl ErrorDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// The API root.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The call deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a call and return the successful response.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] for a non-success status that is not retried
    /// - [`Error::RetriesExhausted`] when every allowed attempt failed
    /// - [`Error::Timeout`] when the call deadline elapsed
    /// - [`Error::Transport`] when a non-retryable call got no response
    pub async fn execute(&self, request: &ApiRequest) -> Result<Response> {
        Ok(self.execute_traced(request).await?.value)
    }

    /// Execute a call and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`Executor::execute`]; also fails if the body does not decode as `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.execute(request).await?.json()
    }

    /// Execute a list call and decode one page.
    ///
    /// # Errors
    ///
    /// See [`Executor::execute`]; also fails if the body is not a list of `T`.
    pub async fn execute_page<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Page<T>> {
        Page::from_response(&self.execute(request).await?)
    }

    /// Like [`Executor::execute_json`], also reporting the attempt count.
    ///
    /// # Errors
    ///
    /// See [`Executor::execute_json`].
    pub async fn execute_json_traced<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Executed<T>> {
        self.execute_traced(request).await?.map(|response| response.json())
    }

    /// Like [`Executor::execute`], also reporting the attempt count.
    ///
    /// # Errors
    ///
    /// See [`Executor::execute`].
    pub async fn execute_traced(&self, request: &ApiRequest) -> Result<Executed<Response>> {
        let request = self.prepare(request);
        let span = info_span!(
            "billow_call",
            method = %request.method(),
            path = request.path()
        );
        self.run(&request).instrument(span).await
    }

    /// Attach a generated idempotency key to a POST that has none.
    ///
    /// The key is created once per call so that every attempt carries the
    /// same one.
    fn prepare(&self, request: &ApiRequest) -> ApiRequest {
        if self.generate_idempotency_keys
            && request.method() == Method::Post
            && request.idempotency_key().is_none()
        {
            request.with_idempotency_key(uuid::Uuid::new_v4().to_string())
        } else {
            request.clone()
        }
    }

    fn wire_request(&self, request: &ApiRequest) -> HttpRequest {
        let mut builder = HttpRequest::builder(request.method(), request.url(&self.base_url))
            .header("Accept", JSON_CONTENT_TYPE)
            .header("User-Agent", &*self.user_agent)
            .body(request.body().cloned());

        if request.body().is_some() {
            builder = builder.header("Content-Type", JSON_CONTENT_TYPE);
        }
        if let Some(key) = request.idempotency_key() {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        builder.build()
    }

    async fn run(&self, request: &ApiRequest) -> Result<Executed<Response>> {
        let deadline = Instant::now() + self.timeout;
        let retry_eligible = request.is_idempotent();
        let mut attempt = 0;

        loop {
            if Instant::now() >= deadline {
                warn!(attempts = attempt, "call deadline exceeded");
                return Err(Error::Timeout { attempts: attempt });
            }

            attempt += 1;
            debug!(attempt, "sending attempt");

            let sent =
                tokio::time::timeout_at(deadline, self.transport.send(self.wire_request(request)))
                    .await;
            let Ok(outcome) = sent else {
                warn!(attempts = attempt, "call deadline exceeded");
                return Err(Error::Timeout { attempts: attempt });
            };

            let (error, retry_after) = match outcome {
                Ok(response) if response.is_success() => {
                    debug!(attempt, status = response.status(), "call succeeded");
                    return Ok(Executed {
                        value: response,
                        attempts: attempt,
                    });
                }
                Ok(response) => {
                    let api = self.decoder.decode(response.status(), response.body());
                    (Error::Api(api), response.retry_after())
                }
                Err(error) => (error, None),
            };

            if !retry_eligible || !RetryPolicy::should_retry_error(&error) {
                debug!(attempt, error = %error, "call failed");
                return Err(error);
            }

            if !self.retry.has_attempts_left(attempt) {
                warn!(attempts = attempt, error = %error, "retries exhausted");
                if self.retry.max_attempts() == 1 {
                    return Err(error);
                }
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.retry.backoff(attempt, retry_after);
            if Instant::now() + delay >= deadline {
                warn!(attempts = attempt, error = %error, "backoff would cross the call deadline");
                return Err(Error::Timeout { attempts: attempt });
            }

            warn!(
                attempt,
                error = %error,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
