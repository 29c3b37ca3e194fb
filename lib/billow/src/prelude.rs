//! Prelude module for convenient imports.
//!
//! ```
//! use billow::prelude::*;
//! ```

pub use crate::{
    BillingClient, ClientConfig, Error, ErrorKind, Executor, HttpTransport, HyperClient,
    Identifier, KeyKind, ListParams, Method, Order, Pager, Result, RetryPolicy, SiteContext,
    SortField,
};
pub use serde::{Deserialize, Serialize};
