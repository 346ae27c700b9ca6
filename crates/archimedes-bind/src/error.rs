//! Binding error types.
//!
//! Every failure surfaced by the binder is a [`BindError`]. Conversion
//! failures keep the wire tag, the raw value and the expected type so callers
//! can report them per field.

use http::StatusCode;
use thiserror::Error;

use crate::dispatch::ContentKind;
use crate::primitive::SemanticType;
use crate::validate::ValidationError;

/// Boxed error produced by an underlying decoder or body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by the binding entry points.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{BindError, ConversionError, SemanticType};
/// use http::StatusCode;
///
/// let err = BindError::from(ConversionError::new("abc", SemanticType::I32).with_field("age"));
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.error_code(), "INVALID_PARAMETER");
/// assert!(err.to_string().contains("age"));
/// ```
#[derive(Debug, Error)]
pub enum BindError {
    /// The declared content type is not one the binder can decode.
    #[error("unsupported content type: '{0}'")]
    UnsupportedContentType(String),

    /// A wire value could not be converted to the field's declared type.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The decoder rejected the body syntactically.
    #[error("malformed {format} body: {source}")]
    MalformedBody {
        /// Decoder that rejected the body.
        format: ContentKind,
        /// Underlying decoder error.
        #[source]
        source: BoxError,
    },

    /// The record was bound but the validation hook reported violations.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The body exceeded a configured size limit.
    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// The limit that was exceeded, in bytes.
        limit: usize,
    },

    /// Reading the body stream or a spool file failed.
    #[error("failed to read request body: {0}")]
    Io(#[from] std::io::Error),
}

impl BindError {
    /// Creates a malformed body error for the given decoder.
    pub fn malformed(format: ContentKind, source: impl Into<BoxError>) -> Self {
        Self::MalformedBody {
            format,
            source: source.into(),
        }
    }

    /// Returns the conversion error, if this is one.
    #[must_use]
    pub fn as_conversion(&self) -> Option<&ConversionError> {
        match self {
            Self::Conversion(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the validation error, if this is one.
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Conversion(_) | Self::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedContentType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::Conversion(_) => "INVALID_PARAMETER",
            Self::MalformedBody { .. } => "DESERIALIZATION_FAILED",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Io(_) => "BODY_READ_FAILED",
        }
    }
}

/// A wire value that could not be converted to its target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}cannot convert {value:?} to {expected}", field_prefix(.field.as_deref()))]
pub struct ConversionError {
    field: Option<String>,
    value: String,
    expected: String,
}

fn field_prefix(field: Option<&str>) -> String {
    field.map(|f| format!("{f}: ")).unwrap_or_default()
}

impl ConversionError {
    /// Creates a conversion error for `value` targeting `expected`.
    #[must_use]
    pub fn new(value: impl Into<String>, expected: SemanticType) -> Self {
        Self {
            field: None,
            value: value.into(),
            expected: expected.to_string(),
        }
    }

    /// Creates a conversion error reported by a whole-body decoder.
    ///
    /// Serde reports mismatches as `invalid type: <found>, expected <wanted>`;
    /// the two halves become the value and the expected type.
    #[must_use]
    pub fn from_decoder_message(field: impl Into<String>, message: &str) -> Self {
        let message = strip_position(message);
        let detail = message
            .strip_prefix("invalid type: ")
            .or_else(|| message.strip_prefix("invalid value: "))
            .unwrap_or(message);

        let (value, expected) = match detail.split_once(", expected ") {
            Some((value, expected)) => (value, expected),
            None => (detail, "declared field type"),
        };

        Self {
            field: Some(field.into()),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Attaches the field (wire tag or header name) the value belonged to.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Returns the field the value belonged to, if known.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the offending value.
    ///
    /// For form values and headers this is the raw wire text. For JSON, XML
    /// and YAML bodies it is the decoder's description of what it found,
    /// such as `string "abc"` or `sequence`, not the raw token.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the name of the expected type.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

// serde_json appends " at line L column C"
fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(idx) if message[idx..].contains(" column ") => &message[..idx],
        _ => message,
    }
}

/// Errors that can occur while loading a [`BindConfig`](crate::BindConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a new environment variable parse error.
    pub fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
