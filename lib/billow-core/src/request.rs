//! Request descriptors and wire requests.
//!
//! An [`ApiRequest`] describes one logical call relative to the API root:
//! verb, resolved path, query and optional JSON body. The executor turns it
//! into an [`HttpRequest`] per attempt, adding the base URL and headers.
//!
//! # Example
//!
//! ```
//! use billow_core::{ApiRequest, Method};
//!
//! let request = ApiRequest::builder(Method::Get, "/sites/acme/accounts")
//!     .query("limit", "200")
//!     .build();
//! assert!(request.is_idempotent());
//! ```

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use url::Url;

use crate::{Error, Method, Result};

// ============================================================================
// Request Descriptor
// ============================================================================

/// Immutable description of one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Option<Bytes>,
    idempotency_key: Option<String>,
}

impl ApiRequest {
    /// Creates a new [`ApiRequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, path)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Resolved path, already percent-encoded.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    #[must_use]
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// JSON request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Caller-supplied idempotency key.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// Whether the call may be repeated safely.
    ///
    /// GET, PUT and DELETE always are; POST only with an idempotency key.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        self.method.is_idempotent() || self.idempotency_key.is_some()
    }

    /// A copy of this request carrying the given idempotency key.
    #[must_use]
    pub fn with_idempotency_key(&self, key: impl Into<String>) -> Self {
        Self {
            idempotency_key: Some(key.into()),
            ..self.clone()
        }
    }

    /// Absolute URL of this request under `base`.
    ///
    /// The request path is appended to the base path, so a base URL such as
    /// `https://billing.example.com/api` keeps its `/api` prefix.
    #[must_use]
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let joined = format!("{}{}", base.path().trim_end_matches('/'), self.path);
        url.set_path(&joined);
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }

    /// Build the request for a server-provided "next" link.
    ///
    /// The link may be absolute or relative; only its path and query are
    /// used, the scheme and host always come from `base`. When `base` has a
    /// path prefix (`https://billing.example.com/api`) and the link path
    /// starts with it, the prefix is dropped so that [`ApiRequest::url`]
    /// adds it back exactly once. The query is taken from the link as-is,
    /// replacing the original one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the link cannot be parsed.
    pub fn follow(&self, link: &str, base: &Url) -> Result<Self> {
        let url = match Url::parse(link) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://link.invalid")?.join(link)?
            }
            Err(err) => return Err(Error::InvalidUrl(err)),
        };

        let prefix = base.path().trim_end_matches('/');
        let path = match url.path().strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() && rest.starts_with('/') => rest,
            _ => url.path(),
        };

        Ok(Self {
            method: self.method,
            path: path.to_string(),
            query: url.query_pairs().into_owned().collect(),
            body: None,
            idempotency_key: None,
        })
    }
}

/// Builder for [`ApiRequest`].
#[derive(Debug, Clone)]
pub struct ApiRequestBuilder {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Option<Bytes>,
    idempotency_key: Option<String>,
}

impl ApiRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            idempotency_key: None,
        }
    }

    /// Sets a query parameter, replacing any previous value.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets multiple query parameters.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Sets query parameters from a serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if query serialization fails.
    pub fn params<T: serde::Serialize + ?Sized>(self, params: &T) -> Result<Self> {
        let pairs = crate::to_query_pairs(params)?;
        Ok(self.query_pairs(pairs))
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(crate::to_json(value)?);
        Ok(self)
    }

    /// Sets an already encoded JSON body.
    #[must_use]
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the idempotency key, making a POST retry-eligible.
    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Builds the [`ApiRequest`].
    #[must_use]
    pub fn build(self) -> ApiRequest {
        ApiRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            body: self.body,
            idempotency_key: self.idempotency_key,
        }
    }
}

// ============================================================================
// Wire Request
// ============================================================================

/// A single HTTP request as sent by a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HashMap<String, String>, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl HttpRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    /// Builds the [`HttpRequest`].
    #[must_use]
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}
