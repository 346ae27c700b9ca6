//! Content-type dispatch.
//!
//! The declared content type picks the decoding strategy:
//!
//! | Content-Type | Strategy |
//! |--------------|----------|
//! | `application/json`, absent or empty | whole-body JSON |
//! | `application/xml`, `text/xml` | whole-body XML |
//! | `application/x-yaml`, `text/yaml` | whole-body YAML |
//! | `application/x-www-form-urlencoded` | form fields |
//! | `multipart/form-data` | form fields, then file fields |
//!
//! Parameters (anything from the first `;` or space) are ignored and the
//! comparison is case-insensitive. An empty body binds nothing and succeeds
//! whatever the content type; so does a JSON, XML or YAML body holding only
//! whitespace.

use std::fmt;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::config::BindConfig;
use crate::decode::{decode_json, decode_xml, decode_yaml};
use crate::descriptor::{Bindable, TagKind};
use crate::error::BindError;
use crate::fields::{bind_fields, AssignFiles, ConvertValues, WireValues};
use crate::multipart::MultipartForm;
use crate::request::{BindRequest, RequestBody};

/// Recognized content type essences.
const CONTENT_KINDS: &[(&str, ContentKind)] = &[
    ("", ContentKind::Json),
    ("application/json", ContentKind::Json),
    ("application/xml", ContentKind::Xml),
    ("text/xml", ContentKind::Xml),
    ("application/x-yaml", ContentKind::Yaml),
    ("text/yaml", ContentKind::Yaml),
    ("application/x-www-form-urlencoded", ContentKind::UrlEncoded),
    ("multipart/form-data", ContentKind::Multipart),
];

/// The decoding strategy selected from a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// `application/xml` or `text/xml`
    Xml,
    /// `application/x-yaml` or `text/yaml`
    Yaml,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `multipart/form-data`
    Multipart,
}

impl ContentKind {
    /// Selects the strategy for a raw `Content-Type` header value.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::UnsupportedContentType`] for anything outside
    /// the supported set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use archimedes_bind::ContentKind;
    ///
    /// assert_eq!(ContentKind::from_content_type(None).unwrap(), ContentKind::Json);
    /// assert_eq!(
    ///     ContentKind::from_content_type(Some("Text/XML; charset=utf-8")).unwrap(),
    ///     ContentKind::Xml,
    /// );
    /// assert!(ContentKind::from_content_type(Some("text/plain")).is_err());
    /// ```
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, BindError> {
        let raw = content_type.unwrap_or_default();
        let essence = essence(raw);

        CONTENT_KINDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(essence))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| BindError::UnsupportedContentType(raw.to_string()))
    }

    /// Returns `true` if the whole body is decoded in one go.
    #[must_use]
    pub fn is_whole_body(self) -> bool {
        matches!(self, Self::Json | Self::Xml | Self::Yaml)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::Yaml => write!(f, "yaml"),
            Self::UrlEncoded => write!(f, "urlencoded form"),
            Self::Multipart => write!(f, "multipart form"),
        }
    }
}

/// Strips content type parameters: everything from the first `;` or space.
///
/// A value starting with a separator is returned unchanged.
#[must_use]
pub fn essence(content_type: &str) -> &str {
    match content_type.find([';', ' ']) {
        Some(idx) if idx > 0 => &content_type[..idx],
        _ => content_type,
    }
}

/// Decodes `request` into `target` according to its content type.
///
/// Whole-body formats replace `target`; form formats update the fields that
/// carry a matching tag and leave the rest untouched. On a conversion
/// failure the fields bound so far stay bound.
pub async fn dispatch<T>(
    request: BindRequest,
    target: &mut T,
    config: &BindConfig,
) -> Result<(), BindError>
where
    T: Bindable + DeserializeOwned,
{
    let (headers, body) = request.into_parts();
    let content_type = match headers.get(CONTENT_TYPE) {
        Some(value) => Some(value.to_str().map_err(|_| {
            BindError::UnsupportedContentType(String::from_utf8_lossy(value.as_bytes()).into())
        })?),
        None => None,
    };
    let kind = ContentKind::from_content_type(content_type)?;

    let Some(body) = body.peek_non_empty().await? else {
        tracing::debug!(content_kind = %kind, "empty request body, nothing to bind");
        return Ok(());
    };

    tracing::debug!(content_kind = %kind, "binding request body");

    match kind {
        ContentKind::Json => {
            if let Some(bytes) = read_document(body, kind, config).await? {
                *target = decode_json(&bytes)?;
            }
        }
        ContentKind::Xml => {
            if let Some(bytes) = read_document(body, kind, config).await? {
                *target = decode_xml(&bytes)?;
            }
        }
        ContentKind::Yaml => {
            if let Some(bytes) = read_document(body, kind, config).await? {
                *target = decode_yaml(&bytes)?;
            }
        }
        ContentKind::UrlEncoded => {
            let bytes = body.collect(Some(config.form_limit())).await?;
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| BindError::malformed(ContentKind::UrlEncoded, e))?;
            let values: WireValues<String> = pairs.into_iter().collect();

            bind_fields::<T, ConvertValues>(&values, target, T::descriptors(TagKind::Form))?;
        }
        ContentKind::Multipart => {
            let boundary = multer::parse_boundary(content_type.unwrap_or_default())
                .map_err(|e| BindError::malformed(ContentKind::Multipart, e))?;
            let form = MultipartForm::read(body, &boundary, config).await?;

            bind_fields::<T, ConvertValues>(&form.values, target, T::descriptors(TagKind::Form))?;
            bind_fields::<T, AssignFiles>(&form.files, target, T::descriptors(TagKind::File))?;
        }
    }

    Ok(())
}

// Buffers a whole-body document; `None` when it holds only whitespace.
async fn read_document(
    body: RequestBody,
    kind: ContentKind,
    config: &BindConfig,
) -> Result<Option<Bytes>, BindError> {
    let bytes = body.collect(config.max_body_size).await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        tracing::debug!(content_kind = %kind, "blank request body, nothing to bind");
        return Ok(None);
    }
    Ok(Some(bytes))
}
