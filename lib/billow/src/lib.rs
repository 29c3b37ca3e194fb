//! Async client for a multi-tenant billing API.
//!
//! Every call is scoped to a site, authenticated with an API key, retried
//! with exponential backoff when that is safe, and bounded by one deadline
//! across all attempts. List endpoints come back as lazy [`Pager`]s that
//! follow the server's cursor links.
//!
//! # Example
//!
//! ```no_run
//! use billow::prelude::*;
//!
//! # async fn example() -> billow::Result<()> {
//! let client = BillingClient::builder()
//!     .base_url("https://billing.example.com")
//!     .api_key("my-api-key")
//!     .site_id("subdomain-acme")
//!     .retry(RetryPolicy::new(5))
//!     .build()?;
//!
//! let params: ListParams = ListParams::filtered().limit(200).into();
//! let accounts: Vec<serde_json::Value> = client.list_accounts(&params)?.collect_all().await?;
//!
//! let bob: serde_json::Value = client.get_account("code-bob").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Every operation returns [`Error`]. Service errors keep their status and
//! per-parameter messages; [`Error::kind`] gives the taxonomy used for
//! retry decisions.

mod billing;
mod client;
mod config;
mod connector;
mod executor;
pub mod middleware;
mod pager;
pub mod prelude;
mod resources;

pub use billing::{BillingClient, BillingClientBuilder};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, ENV_API_KEY, ENV_BASE_URL, ENV_SITE_ID};
pub use executor::{Executed, Executor, IDEMPOTENCY_KEY_HEADER};
pub use pager::Pager;

// Re-export tower for middleware composition
pub use tower;

pub use billow_core::{
    ApiError, ApiRequest, ApiRequestBuilder, DefaultErrorDecoder, Error, ErrorDecoder, ErrorKind,
    HttpRequest, HttpRequestBuilder, HttpTransport, Identifier, KeyKind, ListFilter, ListParams,
    MAX_LIMIT, Method, Order, Page, ParamError, PathTemplate, Response, Result, RetryPolicy,
    SiteContext, SortField, from_json, to_json,
};

pub use billow_core::{StatusCode, header};
