//! Whole-body decoders for JSON, XML and YAML.
//!
//! Decoding is delegated to serde; field paths are tracked with
//! `serde_path_to_error` so type mismatches are reported against the
//! offending field, the same way form conversion failures are.

use serde::de::DeserializeOwned;

use crate::dispatch::ContentKind;
use crate::error::{BindError, ConversionError};

/// Decodes a JSON body.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut de)
        .map_err(|err| map_error(ContentKind::Json, err))?;
    de.end()
        .map_err(|err| BindError::malformed(ContentKind::Json, err))?;
    Ok(value)
}

/// Decodes an XML body.
pub fn decode_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindError> {
    let text =
        std::str::from_utf8(body).map_err(|err| BindError::malformed(ContentKind::Xml, err))?;
    let mut de = quick_xml::de::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut de).map_err(|err| map_error(ContentKind::Xml, err))
}

/// Decodes a YAML body.
pub fn decode_yaml<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindError> {
    let de = serde_yaml::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(de).map_err(|err| map_error(ContentKind::Yaml, err))
}

fn map_error<E>(format: ContentKind, err: serde_path_to_error::Error<E>) -> BindError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let path = err.path().to_string();
    let inner = err.into_inner();
    let message = inner.to_string();
    // serde_yaml prefixes its messages with "<path>: "
    let detail = message
        .strip_prefix(path.as_str())
        .and_then(|rest| rest.strip_prefix(": "))
        .unwrap_or(message.as_str());

    if path != "." && is_type_mismatch(detail) {
        return BindError::Conversion(ConversionError::from_decoder_message(path, detail));
    }

    BindError::malformed(format, inner)
}

// serde::de::Error::invalid_type / invalid_value message prefixes
fn is_type_mismatch(message: &str) -> bool {
    message.starts_with("invalid type: ") || message.starts_with("invalid value: ")
}
