//! The transport seam.
//!
//! [`HttpTransport`] sends one wire request and returns whatever the server
//! answered. It knows nothing about retries, deadlines or error envelopes;
//! the executor layers those on top. Implement it for mocks or to plug in a
//! different HTTP stack.

use std::future::Future;

use crate::{HttpRequest, Response, Result};

/// A single-attempt HTTP transport.
///
/// Implementations return `Ok` for every response the server sent,
/// whatever its status, and [`crate::Error::Transport`] when no response
/// arrived (connection refused or reset, TLS failure, I/O timeout).
///
/// # Example
///
/// ```
/// use billow_core::{HttpRequest, HttpTransport, Response, Result};
/// use bytes::Bytes;
///
/// #[derive(Clone)]
/// struct AlwaysEmpty;
///
/// impl HttpTransport for AlwaysEmpty {
///     async fn send(&self, _request: HttpRequest) -> Result<Response> {
///         Ok(Response::new(204, Default::default(), Bytes::new()))
///     }
/// }
/// ```
pub trait HttpTransport: Clone + Send + Sync + 'static {
    /// Send the request once.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<Response>> + Send;
}
