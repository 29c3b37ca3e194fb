//! Site scoping.

use crate::{PathTemplate, Result};

/// The site every resource path is rooted under.
///
/// Immutable once created; a client serving several sites holds one context
/// per site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteContext {
    site_id: String,
}

impl SiteContext {
    /// Create a context. `site_id` may be a plain ID or `subdomain-<name>`.
    #[must_use]
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
        }
    }

    /// The site identifier.
    #[must_use]
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Resolve a site-rooted template.
    ///
    /// The `site_id` placeholder is filled from this context; `params`
    /// supplies the rest.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingParameter`] if a placeholder has no value.
    ///
    /// # Example
    ///
    /// ```
    /// use billow_core::{PathTemplate, SiteContext};
    ///
    /// let site = SiteContext::new("subdomain-acme");
    /// let path = site
    ///     .path(
    ///         &PathTemplate::new("/sites/{site_id}/accounts/{account_id}"),
    ///         &[("account_id", "code-bob")],
    ///     )
    ///     .expect("resolved");
    /// assert_eq!(path, "/sites/subdomain-acme/accounts/code-bob");
    /// ```
    pub fn path(&self, template: &PathTemplate, params: &[(&str, &str)]) -> Result<String> {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push(("site_id", self.site_id.as_str()));
        all.extend_from_slice(params);
        template.build(&all)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::Error;

    const INVOICE_LINE_ITEMS: PathTemplate =
        PathTemplate::new("/sites/{site_id}/invoices/{invoice_id}/line_items");

    #[test]
    fn fills_site_id() {
        let site = SiteContext::new("s1");
        let path = site
            .path(&INVOICE_LINE_ITEMS, &[("invoice_id", "number-1001")])
            .expect("resolved");
        check!(path == "/sites/s1/invoices/number-1001/line_items");
    }

    #[test]
    fn site_id_is_encoded() {
        let site = SiteContext::new("a b");
        let path = site
            .path(&PathTemplate::new("/sites/{site_id}"), &[])
            .expect("resolved");
        check!(path == "/sites/a%20b");
    }

    #[test]
    fn missing_resource_id() {
        let site = SiteContext::new("s1");
        let result = site.path(&INVOICE_LINE_ITEMS, &[]);
        let_assert!(Err(Error::MissingParameter { name }) = result);
        check!(name == "invoice_id");
    }
}
