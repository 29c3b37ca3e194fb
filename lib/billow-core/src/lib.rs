//! Core types for the billow billing API client.
//!
//! This crate is free of I/O and provides:
//! - [`Identifier`] - natural-key resolution (`code-`, `uuid-`, `number-`)
//! - [`PathTemplate`] and [`SiteContext`] - safe path construction
//! - [`ApiRequest`] - immutable description of one call
//! - [`HttpRequest`] and [`Response`] - wire request and response
//! - [`Page`] - one page of a list plus its cursor link
//! - [`ListParams`] - typed list query parameters
//! - [`RetryPolicy`] - backoff and retry eligibility
//! - [`Error`], [`ErrorKind`] and [`ErrorDecoder`] - the error taxonomy
//! - [`HttpTransport`] - the transport seam
//! - [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod client;
mod error;
mod identifier;
mod method;
mod page;
mod params;
mod path_template;
pub mod prelude;
mod request;
mod response;
mod retry;
mod site;

pub use body::{JSON_CONTENT_TYPE, from_json, to_json, to_query_pairs, to_query_string};
pub use client::HttpTransport;
pub use error::{
    ApiError, DefaultErrorDecoder, Error, ErrorDecoder, ErrorKind, ParamError, Result,
};
pub use identifier::{Identifier, KeyKind};
pub use method::Method;
pub use page::{Page, next_link};
pub use params::{IdsParam, ListFilter, ListParams, MAX_LIMIT, Order, SortField};
pub use path_template::PathTemplate;
pub use request::{ApiRequest, ApiRequestBuilder, HttpRequest, HttpRequestBuilder};
pub use response::Response;
pub use retry::RetryPolicy;
pub use site::SiteContext;

pub use http::{StatusCode, header};
