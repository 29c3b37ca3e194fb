//! Prelude module for convenient imports.
//!
//! ```ignore
//! use billow_core::prelude::*;
//! ```

pub use crate::{
    ApiError, ApiRequest, Error, ErrorKind, HttpTransport, Identifier, ListParams, Method, Order,
    Page, PathTemplate, Response, Result, SiteContext, SortField,
};
