//! Resource lookup keys.
//!
//! Most resources can be addressed either by their server-assigned ID or by
//! an alternate key written with a literal prefix:
//!
//! ```
//! use billow_core::{Identifier, KeyKind};
//!
//! assert_eq!(
//!     Identifier::resolve("code-bob"),
//!     Identifier::AlternateKey { kind: KeyKind::Code, value: "bob".to_string() },
//! );
//! assert_eq!(
//!     Identifier::resolve("hympfmab60ic"),
//!     Identifier::Plain("hympfmab60ic".to_string()),
//! );
//! ```

use std::fmt;

/// Kind of alternate key, selected by the identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `code-` prefix (account code, plan code, coupon code, ...).
    Code,
    /// `uuid-` prefix (transaction or subscription UUID).
    Uuid,
    /// `number-` prefix (invoice number).
    Number,
}

impl KeyKind {
    const ALL: [Self; 3] = [Self::Code, Self::Uuid, Self::Number];

    /// The literal prefix, including the trailing dash.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Code => "code-",
            Self::Uuid => "uuid-",
            Self::Number => "number-",
        }
    }
}

/// A caller-supplied resource identifier, classified once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// A raw server ID, used verbatim.
    Plain(String),
    /// An alternate key with its prefix stripped.
    AlternateKey {
        /// Which alternate key this is.
        kind: KeyKind,
        /// The key value without its prefix.
        value: String,
    },
}

impl Identifier {
    /// Classify a raw identifier string.
    ///
    /// Never fails: strings without a known prefix, including the empty
    /// string, are [`Identifier::Plain`].
    #[must_use]
    pub fn resolve(raw: &str) -> Self {
        KeyKind::ALL
            .into_iter()
            .find_map(|kind| {
                raw.strip_prefix(kind.prefix())
                    .map(|value| Self::AlternateKey {
                        kind,
                        value: value.to_string(),
                    })
            })
            .unwrap_or_else(|| Self::Plain(raw.to_string()))
    }

    /// Build an alternate key directly.
    #[must_use]
    pub fn alternate(kind: KeyKind, value: impl Into<String>) -> Self {
        Self::AlternateKey {
            kind,
            value: value.into(),
        }
    }

    /// The alternate key kind, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<KeyKind> {
        match self {
            Self::Plain(_) => None,
            Self::AlternateKey { kind, .. } => Some(*kind),
        }
    }

    /// The key value, without prefix.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(value) | Self::AlternateKey { value, .. } => value,
        }
    }

    /// Wire form of this identifier, before percent-encoding.
    ///
    /// The service expects the prefix back on alternate keys. The whole
    /// segment is percent-encoded by [`crate::PathTemplate::build`], which
    /// leaves the prefix untouched and escapes the value.
    #[must_use]
    pub fn to_path_segment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(id) => f.write_str(id),
            Self::AlternateKey { kind, value } => write!(f, "{}{value}", kind.prefix()),
        }
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::resolve(raw)
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self::resolve(&raw)
    }
}

impl From<&String> for Identifier {
    fn from(raw: &String) -> Self {
        Self::resolve(raw)
    }
}
