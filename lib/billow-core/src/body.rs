//! Body serialization utilities.
//!
//! Resource records are opaque to billow: request bodies are any
//! `Serialize`, responses any `DeserializeOwned`.

use bytes::Bytes;

use crate::Result;

/// MIME type of request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use billow_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct AccountCreate { code: String }
///
/// let body = AccountCreate { code: "bob".to_string() };
/// let bytes = to_json(&body).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"code":"bob"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to a query string.
///
/// Uses `serde_html_form`; `None` fields must be skipped by the caller's
/// serde attributes.
///
/// # Errors
///
/// Returns an error if query serialization fails.
pub fn to_query_string<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Serialize a value to decoded query pairs.
///
/// # Errors
///
/// Returns an error if query serialization fails.
pub fn to_query_pairs<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<(String, String)>> {
    let query = to_query_string(value)?;
    Ok(url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect())
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so that a bad record deep in a page reports
/// where it failed (e.g. `data[17].account.code`).
///
/// # Errors
///
/// Returns an error if JSON deserialization fails.
///
/// # Example
///
/// ```
/// use billow_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Account { code: String }
///
/// let account: Account = from_json(br#"{"code":"bob"}"#).expect("deserialize");
/// assert_eq!(account, Account { code: "bob".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_serialize() {
        #[derive(serde::Serialize)]
        struct PlanUpdate {
            name: String,
            trial_length: u32,
        }

        let plan = PlanUpdate {
            name: "Gold".to_string(),
            trial_length: 14,
        };

        let bytes = to_json(&plan).expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"name":"Gold","trial_length":14}"#);
    }

    #[test]
    fn to_query_string_skips_none() {
        #[derive(serde::Serialize)]
        struct Filter {
            state: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            limit: Option<u32>,
        }

        let query = to_query_string(&Filter {
            state: "active".to_string(),
            limit: None,
        })
        .expect("serialize");
        assert_eq!(query, "state=active");
    }

    #[test]
    fn to_query_pairs_decodes_values() {
        #[derive(serde::Serialize)]
        struct Filter {
            begin_time: String,
        }

        let pairs = to_query_pairs(&Filter {
            begin_time: "2024-01-01T00:00:00+00:00".to_string(),
        })
        .expect("serialize");
        assert_eq!(
            pairs,
            vec![(
                "begin_time".to_string(),
                "2024-01-01T00:00:00+00:00".to_string()
            )]
        );
    }

    #[test]
    fn from_json_syntax_error() {
        let result: Result<serde_json::Value> = from_json(b"not json");
        let err = result.expect_err("should fail");
        assert!(err.to_string().contains("JSON deserialization error"));
    }

    #[test]
    fn from_json_error_has_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Account {
            #[allow(dead_code)]
            code: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Listing {
            #[allow(dead_code)]
            data: Vec<Account>,
        }

        let result: Result<Listing> = from_json(br#"{"data":[{"code":"a"},{}]}"#);
        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("data[1]"), "Expected path 'data[1]' in error: {msg}");
        assert!(msg.contains("code"), "Expected field 'code' in error: {msg}");
    }
}
