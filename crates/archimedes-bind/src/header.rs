//! Single header binding.

use http::header::HeaderName;
use http::HeaderMap;

use crate::error::{BindError, ConversionError};
use crate::primitive::{convert_to, Primitive};

/// Binds the header `name` into a primitive or timestamp.
///
/// The name is matched case-insensitively. A missing header converts like an
/// empty string, yielding the zero value of `P`. Conversion failures are
/// reported against `name` as given.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::bind_header_field;
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-retry-count", "3".parse().unwrap());
///
/// let retries: u32 = bind_header_field(&headers, "X-Retry-Count").unwrap();
/// assert_eq!(retries, 3);
///
/// let missing: u32 = bind_header_field(&headers, "X-Other").unwrap();
/// assert_eq!(missing, 0);
/// ```
pub fn bind_header_field<P: Primitive>(headers: &HeaderMap, name: &str) -> Result<P, BindError> {
    let raw = match HeaderName::from_bytes(name.trim().as_bytes()) {
        Ok(key) => headers.get(&key),
        Err(_) => None,
    };

    let text = match raw {
        Some(value) => value.to_str().map_err(|_| {
            ConversionError::new(String::from_utf8_lossy(value.as_bytes()), P::SEMANTIC)
                .with_field(name)
        })?,
        None => "",
    };

    convert_to(text).map_err(|err| BindError::Conversion(err.with_field(name)))
}
