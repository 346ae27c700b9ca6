//! Procedural macros for Archimedes request binding.
//!
//! This crate provides `#[derive(Bind)]`, which generates the field
//! descriptor tables `archimedes-bind` walks when binding urlencoded and
//! multipart bodies. Use it through the `archimedes_bind::Bind` re-export.
//!
//! # Attributes
//!
//! | Attribute | On | Meaning |
//! |-----------|----|---------|
//! | `#[bind(form = "name")]` | field | Bind text values sent as `name` |
//! | `#[bind(file = "name")]` | field | Bind files uploaded as `name` |
//! | `#[bind(flatten)]` | field | Bind the tagged fields of an embedded record |
//! | `#[bind(validate)]` | struct | Run `Validate::validate` after binding |
//!
//! Fields without a `bind` attribute are never touched by form binding.
//!
//! # Generated Code
//!
//! For each tag kind the macro emits a lazily built, declaration-ordered
//! table of `FieldDescriptor`s, each holding a field accessor:
//!
//! ```rust,ignore
//! impl ::archimedes_bind::Bindable for Upload {
//!     fn descriptors(tag: TagKind) -> &'static [FieldDescriptor<Self>] {
//!         static FORM: OnceLock<Vec<FieldDescriptor<Upload>>> = OnceLock::new();
//!         // ...
//!         {
//!             fn access(record: &mut Upload) -> &mut String {
//!                 &mut record.title
//!             }
//!             fields.push(FieldDescriptor::value("title", "title", access));
//!         }
//!         // ...
//!     }
//! }
//! ```
//!
//! Enums, unions, tuple structs and generic structs are rejected at compile
//! time.

mod expand;
mod parse;

use proc_macro::TokenStream;

/// Derives `archimedes_bind::Bindable` for a struct with named fields.
///
/// # Example
///
/// ```rust,ignore
/// use archimedes_bind::{Bind, FileHandle};
///
/// #[derive(Default, Bind)]
/// struct Upload {
///     #[bind(form = "title")]
///     title: String,
///     #[bind(form = "tag")]
///     tags: Vec<String>,
///     #[bind(file = "attachment")]
///     attachment: Option<FileHandle>,
/// }
/// ```
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    expand::expand_bind(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
