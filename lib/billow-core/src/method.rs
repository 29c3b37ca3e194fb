//! HTTP verbs used by the billing API.

use derive_more::Display;

/// HTTP request method.
///
/// The billing API only exposes these four verbs; `PATCH`, `HEAD` and
/// `OPTIONS` are never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET - fetch a resource or a page of resources.
    #[display("GET")]
    Get,
    /// POST - create a resource or trigger an action.
    #[display("POST")]
    Post,
    /// PUT - update a resource or trigger an idempotent action.
    #[display("PUT")]
    Put,
    /// DELETE - remove, deactivate or terminate a resource.
    #[display("DELETE")]
    Delete,
}

impl Method {
    /// Returns `true` if repeating the call has no additional effect.
    ///
    /// `POST` is the only verb that is not idempotent; it becomes
    /// retry-eligible only once an idempotency key is attached.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            other => Err(crate::Error::InvalidRequest(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn only_post_is_not_idempotent() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Put.is_idempotent());
        assert!(Method::Delete.is_idempotent());
        assert!(!Method::Post.is_idempotent());
    }

    #[test]
    fn method_into_http() {
        assert_eq!(http::Method::from(Method::Get), http::Method::GET);
        assert_eq!(http::Method::from(Method::Delete), http::Method::DELETE);
    }

    #[test]
    fn method_from_http() {
        assert_eq!(
            Method::try_from(http::Method::PUT).expect("PUT"),
            Method::Put
        );
        assert!(Method::try_from(http::Method::PATCH).is_err());
    }
}
