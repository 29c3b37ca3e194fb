//! Tower middleware layers for the billow HTTP transport.
//!
//! Layers wrap every single attempt the executor makes, so they see retries
//! as separate requests.
//!
//! - [`ApiKeyAuthLayer`] - `Authorization: Basic base64(key:)`
//! - [`LoggingLayer`] - logs requests and responses using `tracing`
//!
//! # Example
//!
//! ```no_run
//! use billow::HyperClient;
//! use billow::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .with_api_key("my-api-key")
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod auth;
mod logging;

pub use auth::{ApiKeyAuth, ApiKeyAuthLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
