//! One page of a list response and its pagination metadata.
//!
//! List endpoints answer with an envelope:
//!
//! ```json
//! {"object": "list", "has_more": true, "next": "/sites/acme/accounts?cursor=...", "data": [...]}
//! ```
//!
//! The server also may advertise the next page with an RFC 8288 `Link`
//! header. Either way the cursor is opaque: the client never computes
//! offsets.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{Response, Result};

/// Decoded records of one page plus the link to the following page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records in server order.
    pub data: Vec<T>,
    /// Link to the next page; `None` on the last page.
    pub next: Option<String>,
}

#[derive(Deserialize)]
struct ListEnvelope<T> {
    #[serde(default)]
    has_more: Option<bool>,
    #[serde(default)]
    next: Option<String>,
    data: Vec<T>,
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a list response.
    ///
    /// The body's `next` wins over a `Link` header. `has_more: false` ends
    /// iteration even when a link is present; a response without any next
    /// metadata is the last page whatever its size.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a list envelope of `T`.
    pub fn from_response(response: &Response) -> Result<Self> {
        let envelope: ListEnvelope<T> = crate::from_json(response.body())?;

        let next = if envelope.has_more == Some(false) {
            None
        } else {
            envelope
                .next
                .filter(|next| !next.is_empty())
                .or_else(|| response.header("link").and_then(next_link))
        };

        Ok(Self {
            data: envelope.data,
            next,
        })
    }
}

impl<T> Page<T> {
    /// Returns `true` if no page follows this one.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Extract the `rel="next"` target of a `Link` header value.
#[must_use]
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((name, value)) = param.split_once('=') else {
                return false;
            };
            name.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_ascii_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        is_next.then(|| target.to_string())
    })
}
