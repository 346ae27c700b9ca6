//! Field descriptors and the [`Bindable`] trait.
//!
//! A descriptor table lists, per binding mode, the fields of a record that
//! carry the matching tag, in declaration order. Tables are generated by
//! `#[derive(Bind)]` and built once per type.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::ConversionError;
use crate::file::FileHandle;
use crate::primitive::{convert_to, Primitive, SemanticType};
use crate::validate::FieldViolation;

/// Which tag a binding pass looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `#[bind(form = "...")]`: text values from urlencoded or multipart bodies.
    Form,
    /// `#[bind(file = "...")]`: uploaded files from multipart bodies.
    File,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Whether a field takes one wire value or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Only the first wire value is used.
    Single,
    /// Every wire value is appended in input order.
    Repeated,
}

/// What a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A primitive converted from text.
    Value(SemanticType),
    /// One or more uploaded file handles.
    File,
}

type ValueSetter<T> = Arc<dyn Fn(&mut T, &[String]) -> Result<(), ConversionError> + Send + Sync>;
type FileSetter<T> = Arc<dyn Fn(&mut T, &[FileHandle]) + Send + Sync>;

enum Setter<T> {
    Values(ValueSetter<T>),
    Files(FileSetter<T>),
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Values(f) => Self::Values(Arc::clone(f)),
            Self::Files(f) => Self::Files(Arc::clone(f)),
        }
    }
}

/// A bindable field of record type `T`.
pub struct FieldDescriptor<T> {
    name: Cow<'static, str>,
    tag: &'static str,
    kind: FieldKind,
    cardinality: Cardinality,
    setter: Setter<T>,
}

impl<T: 'static> FieldDescriptor<T> {
    /// Describes a value field reached through `access`.
    pub fn value<F: FormField + 'static>(
        name: &'static str,
        tag: &'static str,
        access: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            tag,
            kind: FieldKind::Value(F::SEMANTIC),
            cardinality: F::CARDINALITY,
            setter: Setter::Values(Arc::new(move |record: &mut T, values: &[String]| {
                access(record).bind_values(values)
            })),
        }
    }

    /// Describes a file field reached through `access`.
    pub fn file<F: FileField + 'static>(
        name: &'static str,
        tag: &'static str,
        access: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            tag,
            kind: FieldKind::File,
            cardinality: F::CARDINALITY,
            setter: Setter::Files(Arc::new(move |record: &mut T, files: &[FileHandle]| {
                access(record).bind_files(files);
            })),
        }
    }

    /// Re-targets this descriptor onto an outer record embedding `T`.
    ///
    /// The field name becomes `prefix.name`; the wire tag is unchanged.
    pub fn lift<U: 'static>(&self, prefix: &str, access: fn(&mut U) -> &mut T) -> FieldDescriptor<U> {
        let setter = match &self.setter {
            Setter::Values(inner) => {
                let inner = Arc::clone(inner);
                Setter::Values(Arc::new(move |record: &mut U, values: &[String]| {
                    inner(access(record), values)
                }) as ValueSetter<U>)
            }
            Setter::Files(inner) => {
                let inner = Arc::clone(inner);
                Setter::Files(Arc::new(move |record: &mut U, files: &[FileHandle]| {
                    inner(access(record), files);
                }) as FileSetter<U>)
            }
        };

        FieldDescriptor {
            name: Cow::Owned(format!("{prefix}.{}", self.name)),
            tag: self.tag,
            kind: self.kind,
            cardinality: self.cardinality,
            setter,
        }
    }
}

impl<T> FieldDescriptor<T> {
    /// Returns the Rust field path (`outer.inner` for flattened fields).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wire name the field binds from.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Returns what the field holds.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the field's cardinality.
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Converts `values` into the field of `record`.
    ///
    /// File descriptors ignore text values.
    pub fn assign_values(&self, record: &mut T, values: &[String]) -> Result<(), ConversionError> {
        match &self.setter {
            Setter::Values(set) => set(record, values),
            Setter::Files(_) => Ok(()),
        }
    }

    /// Assigns `files` to the field of `record`.
    ///
    /// Value descriptors ignore file handles.
    pub fn assign_files(&self, record: &mut T, files: &[FileHandle]) {
        if let Setter::Files(set) = &self.setter {
            set(record, files);
        }
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tag: self.tag,
            kind: self.kind,
            cardinality: self.cardinality,
            setter: self.setter.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .field("cardinality", &self.cardinality)
            .finish_non_exhaustive()
    }
}

/// Field types that can be bound from form text values.
///
/// Implemented for every [`Primitive`] (single), `Option<P>` (single, left
/// as `None` for an empty value) and `Vec<P>` (repeated).
pub trait FormField {
    /// Semantic type of each element.
    const SEMANTIC: SemanticType;
    /// Whether the field takes one value or many.
    const CARDINALITY: Cardinality;

    /// Converts and stores `values`.
    fn bind_values(&mut self, values: &[String]) -> Result<(), ConversionError>;
}

macro_rules! impl_form_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FormField for $ty {
                const SEMANTIC: SemanticType = <$ty as Primitive>::SEMANTIC;
                const CARDINALITY: Cardinality = Cardinality::Single;

                fn bind_values(&mut self, values: &[String]) -> Result<(), ConversionError> {
                    if let Some(first) = values.first() {
                        *self = convert_to(first)?;
                    }
                    Ok(())
                }
            }

            impl FormField for Option<$ty> {
                const SEMANTIC: SemanticType = <$ty as Primitive>::SEMANTIC;
                const CARDINALITY: Cardinality = Cardinality::Single;

                fn bind_values(&mut self, values: &[String]) -> Result<(), ConversionError> {
                    match values.first() {
                        Some(first) if !first.is_empty() => *self = Some(convert_to(first)?),
                        _ => {}
                    }
                    Ok(())
                }
            }

            impl FormField for Vec<$ty> {
                const SEMANTIC: SemanticType = <$ty as Primitive>::SEMANTIC;
                const CARDINALITY: Cardinality = Cardinality::Repeated;

                fn bind_values(&mut self, values: &[String]) -> Result<(), ConversionError> {
                    self.reserve(values.len());
                    for value in values {
                        self.push(convert_to(value)?);
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_form_field!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    DateTime<FixedOffset>,
    DateTime<Utc>,
);

/// Field types that can hold uploaded files.
///
/// `Option<FileHandle>` takes the first file sent under its tag,
/// `Vec<FileHandle>` takes all of them.
pub trait FileField {
    /// Whether the field takes one file or many.
    const CARDINALITY: Cardinality;

    /// Stores `files`.
    fn bind_files(&mut self, files: &[FileHandle]);
}

impl FileField for Option<FileHandle> {
    const CARDINALITY: Cardinality = Cardinality::Single;

    fn bind_files(&mut self, files: &[FileHandle]) {
        if let Some(first) = files.first() {
            *self = Some(first.clone());
        }
    }
}

impl FileField for Vec<FileHandle> {
    const CARDINALITY: Cardinality = Cardinality::Repeated;

    fn bind_files(&mut self, files: &[FileHandle]) {
        self.extend_from_slice(files);
    }
}

/// Record types the binder can populate field by field.
///
/// Derive it with `#[derive(Bind)]` rather than implementing it by hand:
///
/// ```rust
/// use archimedes_bind::{Bind, Bindable, TagKind};
///
/// #[derive(Default, Bind)]
/// struct Upload {
///     #[bind(form = "title")]
///     title: String,
///     #[bind(form = "tag")]
///     tags: Vec<String>,
///     #[bind(file = "attachment")]
///     attachment: Option<archimedes_bind::FileHandle>,
/// }
///
/// let form_tags: Vec<_> = Upload::descriptors(TagKind::Form).iter().map(|d| d.tag()).collect();
/// assert_eq!(form_tags, ["title", "tag"]);
/// assert_eq!(Upload::descriptors(TagKind::File).len(), 1);
/// ```
pub trait Bindable: Default + Sized + 'static {
    /// Returns the fields carrying `tag`, in declaration order, including
    /// those of flattened sub-records.
    fn descriptors(tag: TagKind) -> &'static [FieldDescriptor<Self>];

    /// Validation hook run after a successful bind.
    ///
    /// Returns no violations unless the record opted in with
    /// `#[bind(validate)]`.
    fn violations(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}
