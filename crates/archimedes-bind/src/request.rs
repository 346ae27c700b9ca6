//! The request view the binder reads from.
//!
//! A [`BindRequest`] carries the request headers and a single-pass body
//! stream. It can be built from any [`http::Request`] whose body implements
//! [`http_body::Body`], or assembled by hand with [`BindRequestBuilder`].

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};
use futures_util::TryStreamExt;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use http_body_util::BodyExt;

use crate::error::{BindError, BoxError};
use crate::header::bind_header_field;
use crate::primitive::Primitive;

/// A request body that can be read exactly once.
pub struct RequestBody {
    stream: BoxStream<'static, io::Result<Bytes>>,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            stream: stream::empty().boxed(),
        }
    }

    /// Wraps a stream of chunks.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: futures_util::Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            stream: stream.map_err(|e| io::Error::other(e.into())).boxed(),
        }
    }

    /// Reads the next chunk, skipping empty ones.
    ///
    /// Returns `None` at end of input.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            if !chunk.is_empty() {
                return Ok(Some(chunk));
            }
        }
        Ok(None)
    }

    /// Reads the first chunk and reports whether the body had any bytes.
    ///
    /// On `Some`, the returned body still yields every byte, starting with
    /// the one just read.
    pub(crate) async fn peek_non_empty(mut self) -> io::Result<Option<Self>> {
        match self.next_chunk().await? {
            Some(first) => Ok(Some(Self {
                stream: stream::once(async move { Ok(first) })
                    .chain(self.stream)
                    .boxed(),
            })),
            None => Ok(None),
        }
    }

    /// Buffers the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::PayloadTooLarge`] once more than `limit` bytes
    /// have been read, or [`BindError::Io`] if the stream fails.
    pub async fn collect(mut self, limit: Option<usize>) -> Result<Bytes, BindError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            if let Some(limit) = limit {
                if buf.len() + chunk.len() > limit {
                    return Err(BindError::PayloadTooLarge { limit });
                }
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    pub(crate) fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self {
            stream: stream::once(async move { Ok(bytes) }).boxed(),
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").finish_non_exhaustive()
    }
}

/// Headers and body of an incoming request.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::BindRequest;
///
/// let request = BindRequest::builder()
///     .header("content-type", "application/json")
///     .header("x-request-id", "abc-123")
///     .body(r#"{"name": "Alice"}"#)
///     .build();
///
/// assert_eq!(request.content_type(), Some("application/json"));
/// assert_eq!(request.header("X-Request-ID"), Some("abc-123"));
/// ```
#[derive(Debug)]
pub struct BindRequest {
    headers: HeaderMap,
    body: RequestBody,
}

impl BindRequest {
    /// Creates a request from headers and a body.
    pub fn new(headers: HeaderMap, body: impl Into<RequestBody>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> BindRequestBuilder {
        BindRequestBuilder::new()
    }

    /// Adapts an [`http::Request`], streaming its body.
    pub fn from_http<B>(request: http::Request<B>) -> Self
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        Self {
            headers: parts.headers,
            body: RequestBody::from_stream(body.into_data_stream()),
        }
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Binds a single header into a primitive.
    ///
    /// See [`bind_header_field`].
    pub fn header_field<P: Primitive>(&self, name: &str) -> Result<P, BindError> {
        bind_header_field(&self.headers, name)
    }

    /// Splits the request into headers and body.
    #[must_use]
    pub fn into_parts(self) -> (HeaderMap, RequestBody) {
        (self.headers, self.body)
    }
}

/// Builder for constructing a [`BindRequest`].
#[derive(Debug, Default)]
pub struct BindRequestBuilder {
    headers: HeaderMap,
    body: RequestBody,
}

impl BindRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a single header; invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the Content-Type header.
    #[must_use]
    pub fn content_type(self, value: &str) -> Self {
        self.header(CONTENT_TYPE.as_str(), value)
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> BindRequest {
        BindRequest {
            headers: self.headers,
            body: self.body,
        }
    }
}
