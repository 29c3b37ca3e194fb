//! API key authentication middleware.
//!
//! The billing API takes the private API key as the HTTP Basic username with
//! an empty password: `Authorization: Basic base64("<key>:")`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use base64::Engine;
use tower::{Layer, Service};

use crate::{Error, HttpRequest, Response, Result};

/// Layer that authenticates requests with an API key.
///
/// # Example
///
/// ```ignore
/// use billow::middleware::ApiKeyAuthLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(ApiKeyAuthLayer::new("my-api-key"))
///     .service(client);
/// ```
#[derive(Clone)]
pub struct ApiKeyAuthLayer {
    /// Full `Authorization` header value.
    authorization: Arc<str>,
}

impl std::fmt::Debug for ApiKeyAuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthLayer").finish_non_exhaustive()
    }
}

impl ApiKeyAuthLayer {
    /// Create a new layer for the given API key.
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            authorization: authorization_value(api_key.as_ref()),
        }
    }
}

fn authorization_value(api_key: &str) -> Arc<str> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{api_key}:"));
    Arc::from(format!("Basic {encoded}"))
}

impl<S> Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuth {
            inner,
            authorization: Arc::clone(&self.authorization),
        }
    }
}

/// Service that adds the `Authorization` header to requests.
#[derive(Clone)]
pub struct ApiKeyAuth<S> {
    inner: S,
    authorization: Arc<str>,
}

impl<S> ApiKeyAuth<S> {
    /// Wrap `inner`, authenticating with `api_key`.
    pub fn new(inner: S, api_key: impl AsRef<str>) -> Self {
        Self {
            inner,
            authorization: authorization_value(api_key.as_ref()),
        }
    }
}

impl<S> Service<HttpRequest> for ApiKeyAuth<S>
where
    S: Service<HttpRequest, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: HttpRequest) -> Self::Future {
        request
            .headers_mut()
            .insert("Authorization".to_string(), self.authorization.to_string());

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(request).await })
    }
}
