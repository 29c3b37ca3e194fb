//! Error types for billow.
//!
//! Every failed call ends in one [`Error`]. Failures that reached the service
//! carry an [`ApiError`] built by an [`ErrorDecoder`] from the status code and
//! the JSON error envelope; [`Error::kind`] flattens everything into a single
//! [`ErrorKind`] so callers can tell "fix your request" from "retry later".

use derive_more::{Display, Error, From};
use serde::Deserialize;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// 400 or 422: the request was rejected, see [`ApiError::params`].
    #[display("validation error")]
    Validation,
    /// 401 or 403: bad or insufficient credentials.
    #[display("authorization error")]
    Authorization,
    /// 404: the resource does not exist.
    #[display("not found")]
    NotFound,
    /// 409: conflicting or concurrent modification.
    #[display("conflict")]
    Conflict,
    /// 429: too many requests.
    #[display("rate limited")]
    RateLimited,
    /// 5xx: the service failed.
    #[display("server error")]
    Server,
    /// Any other 4xx.
    #[display("client error")]
    Client,
    /// A non-success status outside the 4xx/5xx ranges.
    #[display("unexpected response")]
    Unexpected,
    /// Network failure before any response was received.
    #[display("transport error")]
    Transport,
    /// The call deadline elapsed.
    #[display("timeout")]
    Timeout,
    /// The retry budget was spent on retryable failures.
    #[display("retries exhausted")]
    RetriesExhausted,
    /// A path placeholder had no value.
    #[display("missing parameter")]
    MissingParameter,
    /// The request could not be built.
    #[display("invalid request")]
    InvalidRequest,
    /// A success response could not be decoded.
    #[display("decode error")]
    Decode,
}

impl ErrorKind {
    /// Select the kind for a non-success HTTP status.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 | 403 => Self::Authorization,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            402..=499 => Self::Client,
            _ => Self::Unexpected,
        }
    }

    /// Returns `true` for kinds worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Server | Self::Transport)
    }
}

// ============================================================================
// API Error Record
// ============================================================================

/// One rejected request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParamError {
    /// Name of the offending parameter.
    pub param: String,
    /// Why it was rejected; empty when the service gave no detail.
    #[serde(default)]
    pub message: String,
}

impl ParamError {
    /// Create a parameter error.
    #[must_use]
    pub fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            message: message.into(),
        }
    }
}

/// A classified non-success response.
///
/// Built once per failed call by an [`ErrorDecoder`] and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{kind} ({status}): {message}")]
pub struct ApiError {
    /// Classification derived from the status code.
    pub kind: ErrorKind,
    /// HTTP status code.
    pub status: u16,
    /// The envelope `type` field, verbatim.
    pub error_type: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Per-parameter details, in the order the service sent them.
    pub params: Vec<ParamError>,
}

impl ApiError {
    /// Create an error record with no envelope detail.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status,
            error_type: None,
            message: message.into(),
            params: Vec::new(),
        }
    }

    /// Attach parameter details.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamError>) -> Self {
        self.params = params;
        self
    }

    /// Attach the envelope `type`.
    #[must_use]
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }
}

// ============================================================================
// Error Decoder Trait
// ============================================================================

/// Turns a non-success response into an [`ApiError`].
///
/// Implementations must be pure: the same status and body always produce the
/// same record.
pub trait ErrorDecoder: Send + Sync + 'static {
    /// Decode an HTTP error response.
    fn decode(&self, status: u16, body: &[u8]) -> ApiError;
}

/// Default error decoder for the billing API envelope.
///
/// The status code selects the [`ErrorKind`]; the envelope, either wrapped as
/// `{"error": {...}}` or flat, fills `type`, `message` and `params`. A missing
/// or unreadable body falls back to the canonical reason phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorDecoder;

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { error: EnvelopeBody },
    Flat(EnvelopeBody),
}

#[derive(Deserialize)]
struct EnvelopeBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    #[serde(default)]
    params: Vec<ParamError>,
}

impl EnvelopeBody {
    fn is_empty(&self) -> bool {
        self.error_type.is_none() && self.message.is_none() && self.params.is_empty()
    }
}

impl ErrorDecoder for DefaultErrorDecoder {
    fn decode(&self, status: u16, body: &[u8]) -> ApiError {
        let envelope = serde_json::from_slice::<Envelope>(body)
            .ok()
            .map(|envelope| match envelope {
                Envelope::Wrapped { error } | Envelope::Flat(error) => error,
            })
            .filter(|body| !body.is_empty());

        let Some(envelope) = envelope else {
            return ApiError::new(status, reason_phrase(status));
        };

        ApiError {
            kind: ErrorKind::from_status(status),
            status,
            error_type: envelope.error_type,
            message: envelope
                .message
                .unwrap_or_else(|| reason_phrase(status)),
            params: envelope.params,
        }
    }
}

fn reason_phrase(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), ToString::to_string)
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for billow operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The service answered with a non-success status.
    #[display("{_0}")]
    #[from]
    Api(#[error(not(source))] ApiError),

    /// Network failure before a response arrived (connect, reset, I/O timeout).
    #[display("transport error: {_0}")]
    #[from(skip)]
    Transport(#[error(not(source))] String),

    /// The call deadline elapsed; no further attempts were made.
    #[display("call deadline exceeded after {attempts} attempt(s)")]
    #[from(skip)]
    Timeout {
        /// Attempts started before the deadline.
        attempts: u32,
    },

    /// Every allowed attempt failed with a retryable error.
    #[display("retries exhausted after {attempts} attempt(s): {last}")]
    #[from(skip)]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error of the final attempt.
        #[error(source)]
        last: Box<Error>,
    },

    /// A path placeholder had no value.
    #[display("missing path parameter `{name}`")]
    #[from(skip)]
    MissingParameter {
        /// Placeholder name.
        #[error(not(source))]
        name: String,
    },

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "data[3].account.code").
        path: String,
        /// Error message.
        message: String,
    },

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a missing parameter error.
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Flattened classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(api) => api.kind,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::InvalidRequest(_)
            | Self::JsonSerialization(_)
            | Self::QuerySerialization(_)
            | Self::InvalidUrl(_) => ErrorKind::InvalidRequest,
            Self::JsonDeserialization { .. } => ErrorKind::Decode,
        }
    }

    /// Returns `true` if a single attempt failing this way may be retried.
    ///
    /// Terminal errors such as [`Error::Timeout`] and
    /// [`Error::RetriesExhausted`] are never retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// The classified API error, looking through [`Error::RetriesExhausted`].
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(api) => Some(api),
            Self::RetriesExhausted { last, .. } => last.api_error(),
            _ => None,
        }
    }

    /// The HTTP status code, if the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|api| api.status)
    }

    /// Parameter details of a validation failure; empty otherwise.
    #[must_use]
    pub fn params(&self) -> &[ParamError] {
        self.api_error()
            .map(|api| api.params.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if the deadline elapsed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
