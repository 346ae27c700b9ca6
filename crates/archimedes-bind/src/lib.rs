//! # Archimedes Bind
//!
//! Request body and header binding for the Archimedes HTTP framework.
//!
//! This crate populates typed records from incoming requests. The declared
//! content type selects how the body is read:
//!
//! | Content-Type | Binding |
//! |--------------|---------|
//! | `application/json` (or none) | Whole body decoded with serde |
//! | `application/xml`, `text/xml` | Whole body decoded with serde |
//! | `application/x-yaml`, `text/yaml` | Whole body decoded with serde |
//! | `application/x-www-form-urlencoded` | `#[bind(form = "...")]` fields |
//! | `multipart/form-data` | `#[bind(form)]` then `#[bind(file)]` fields |
//!
//! An empty body binds nothing and succeeds. Anything else is rejected with
//! [`BindError::UnsupportedContentType`].
//!
//! ## Records
//!
//! Form binding is driven by `#[derive(Bind)]`, which records the tagged
//! fields of a struct in declaration order. Whole-body formats use the
//! record's `serde::Deserialize` impl, so wire names there follow
//! `#[serde(rename)]`.
//!
//! ```rust
//! use archimedes_bind::{Bind, FileHandle};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Bind)]
//! #[serde(default)]
//! struct Profile {
//!     #[bind(form = "name")]
//!     name: String,
//!     #[bind(form = "age")]
//!     age: Option<u16>,
//!     #[bind(form = "tag")]
//!     tags: Vec<String>,
//!     #[bind(file = "avatar")]
//!     #[serde(skip)]
//!     avatar: Option<FileHandle>,
//! }
//! ```
//!
//! Supported form field types are the primitives (`bool`, integers, floats,
//! `String`), `chrono` timestamps, and `Option` or `Vec` of those. File
//! fields are `Option<FileHandle>` or `Vec<FileHandle>`. `#[bind(flatten)]`
//! binds the tagged fields of an embedded record as if they were declared
//! inline.
//!
//! ## Binding
//!
//! ```rust
//! use archimedes_bind::{bind_body, Bind, BindRequest};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Bind)]
//! #[serde(default)]
//! struct Search {
//!     #[bind(form = "q")]
//!     query: String,
//!     #[bind(form = "page")]
//!     page: u32,
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let request = BindRequest::builder()
//!     .content_type("application/x-www-form-urlencoded")
//!     .body("q=rust&page=2")
//!     .build();
//!
//! let search: Search = bind_body(request).await.unwrap();
//! assert_eq!(search.query, "rust");
//! assert_eq!(search.page, 2);
//! # });
//! ```
//!
//! Single headers bind with [`bind_header_field`].
//!
//! ## Error Handling
//!
//! Every entry point returns [`BindError`], which maps onto an HTTP status
//! and a stable error code:
//!
//! ```rust
//! use archimedes_bind::BindError;
//!
//! let err = BindError::UnsupportedContentType("text/plain".into());
//! assert_eq!(err.status_code(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
//! assert_eq!(err.error_code(), "UNSUPPORTED_MEDIA_TYPE");
//! ```

#![doc(html_root_url = "https://docs.rs/archimedes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets `#[derive(Bind)]` expand to `::archimedes_bind::...` inside this crate.
extern crate self as archimedes_bind;

mod body;
mod config;
mod decode;
mod descriptor;
mod dispatch;
mod error;
mod fields;
mod file;
mod header;
mod multipart;
mod primitive;
mod request;
mod validate;

pub use body::{bind_body, Binder};
pub use config::{
    BindConfig, DEFAULT_MAX_FORM_SIZE, DEFAULT_MAX_MEMORY, DEFAULT_MAX_VALUE_OVERFLOW,
};
pub use decode::{decode_json, decode_xml, decode_yaml};
pub use descriptor::{Bindable, Cardinality, FieldDescriptor, FieldKind, FileField, FormField, TagKind};
pub use dispatch::{dispatch, essence, ContentKind};
pub use error::{BindError, BoxError, ConfigError, ConversionError};
pub use fields::{bind_fields, AssignFiles, ConvertValues, ValueStrategy, WireValues};
pub use file::FileHandle;
pub use header::bind_header_field;
pub use multipart::MultipartForm;
pub use primitive::{convert, convert_to, Primitive, SemanticType, Value};
pub use request::{BindRequest, BindRequestBuilder, RequestBody};
pub use validate::{FieldViolation, Validate, ValidationError};

pub use archimedes_bind_macros::Bind;
