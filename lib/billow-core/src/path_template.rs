//! Path templates with `{name}` placeholders.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped in a path parameter: everything but RFC 3986 unreserved.
const PATH_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A resource path template such as `/sites/{site_id}/accounts/{account_id}`.
///
/// Each parameter value is percent-encoded on its own before substitution, so
/// a `/` inside an identifier never adds a path segment.
///
/// # Example
///
/// ```
/// use billow_core::PathTemplate;
///
/// let template = PathTemplate::new("/sites/{site_id}/accounts/{account_id}");
/// let path = template
///     .build(&[("site_id", "acme"), ("account_id", "code-a/b")])
///     .expect("all parameters present");
/// assert_eq!(path, "/sites/acme/accounts/code-a%2Fb");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathTemplate(&'static str);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    /// Get the template string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Names of the placeholders, in template order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an unterminated placeholder.
    pub fn placeholders(&self) -> Result<Vec<&'static str>> {
        let mut names = Vec::new();
        let mut rest = self.0;
        while let Some(start) = rest.find('{') {
            let after = rest.get(start + 1..).unwrap_or_default();
            let end = after.find('}').ok_or_else(|| self.unterminated())?;
            names.push(after.get(..end).unwrap_or_default());
            rest = after.get(end + 1..).unwrap_or_default();
        }
        Ok(names)
    }

    /// Expand the template against named parameters.
    ///
    /// Extra parameters that do not appear in the template are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] when a placeholder has no value, and
    /// [`Error::InvalidRequest`] for an unterminated placeholder.
    pub fn build(&self, params: &[(&str, &str)]) -> Result<String> {
        let mut path = String::with_capacity(self.0.len());
        let mut rest = self.0;

        while let Some(start) = rest.find('{') {
            path.push_str(rest.get(..start).unwrap_or_default());
            let after = rest.get(start + 1..).unwrap_or_default();
            let end = after.find('}').ok_or_else(|| self.unterminated())?;
            let name = after.get(..end).unwrap_or_default();

            let value = params
                .iter()
                .find_map(|(key, value)| (*key == name).then_some(*value))
                .ok_or_else(|| Error::missing_parameter(name))?;
            path.extend(utf8_percent_encode(value, PATH_PARAM));

            rest = after.get(end + 1..).unwrap_or_default();
        }
        path.push_str(rest);

        Ok(path)
    }

    fn unterminated(&self) -> Error {
        Error::invalid_request(format!("unterminated placeholder in path template `{}`", self.0))
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn builds_nested_path() {
        let template = PathTemplate::new("/sites/{site_id}/plans/{plan_id}/add_ons/{add_on_id}");
        let path = template
            .build(&[("add_on_id", "gold"), ("plan_id", "code-pro"), ("site_id", "acme")])
            .expect("complete params");
        check!(path == "/sites/acme/plans/code-pro/add_ons/gold");
    }

    #[test]
    fn encodes_each_value_separately() {
        let template = PathTemplate::new("/sites/{site_id}/accounts/{account_id}");
        let path = template
            .build(&[("site_id", "a b"), ("account_id", "code-x/y?z#w")])
            .expect("complete params");
        check!(path == "/sites/a%20b/accounts/code-x%2Fy%3Fz%23w");
        check!(path.split('/').count() == 5);
    }

    #[test]
    fn encodes_email_style_codes() {
        let template = PathTemplate::new("/accounts/{account_id}");
        let path = template
            .build(&[("account_id", "code-benjamin.dumonde@example.com")])
            .expect("complete params");
        insta::assert_snapshot!(path, @"/accounts/code-benjamin.dumonde%40example.com");
    }

    #[test]
    fn empty_value_still_substituted() {
        let template = PathTemplate::new("/sites/{site_id}/invoices/{invoice_id}");
        let path = template
            .build(&[("site_id", "acme"), ("invoice_id", "")])
            .expect("empty is present");
        check!(path == "/sites/acme/invoices/");
    }

    #[test]
    fn template_without_placeholders() {
        let path = PathTemplate::new("/sites").build(&[]).expect("nothing to fill");
        check!(path == "/sites");
    }

    #[test]
    fn missing_parameter_fails() {
        let template = PathTemplate::new("/sites/{site_id}/coupons/{coupon_id}");
        let result = template.build(&[("site_id", "acme")]);
        let_assert!(Err(Error::MissingParameter { name }) = result);
        check!(name == "coupon_id");
    }

    #[test]
    fn every_omitted_placeholder_fails() {
        let template = PathTemplate::new("/sites/{site_id}/accounts/{account_id}/notes/{note_id}");
        let all = [("site_id", "s"), ("account_id", "a"), ("note_id", "n")];
        for skipped in 0..all.len() {
            let params: Vec<_> = all
                .iter()
                .enumerate()
                .filter_map(|(i, pair)| (i != skipped).then_some(*pair))
                .collect();
            let_assert!(Err(Error::MissingParameter { .. }) = template.build(&params));
        }
    }

    #[test]
    fn unterminated_placeholder_is_invalid() {
        let template = PathTemplate::new("/sites/{site_id");
        let_assert!(Err(Error::InvalidRequest(_)) = template.build(&[("site_id", "x")]));
    }

    #[test]
    fn lists_placeholders_in_order() {
        let template = PathTemplate::new("/sites/{site_id}/subscriptions/{subscription_id}/change");
        check!(template.placeholders().expect("valid") == vec!["site_id", "subscription_id"]);
    }

    #[test]
    fn path_template_as_ref() {
        let template = PathTemplate::new("/sites/{site_id}");
        let s: &str = template.as_ref();
        check!(s == "/sites/{site_id}");
        check!(template.to_string() == "/sites/{site_id}");
    }
}
