//! Multi-value field binding.
//!
//! [`bind_fields`] walks a descriptor table and copies matching entries of a
//! [`WireValues`] set into the record. The same loop serves text values and
//! uploaded files; a [`ValueStrategy`] decides how entries are stored.

use indexmap::IndexMap;

use crate::descriptor::{Cardinality, FieldDescriptor, TagKind};
use crate::error::BindError;
use crate::file::FileHandle;

/// Wire name to ordered values, in first-seen order of the names.
///
/// Repetition of a name on the wire models a multi-valued field.
#[derive(Debug, Clone)]
pub struct WireValues<V> {
    entries: IndexMap<String, Vec<V>>,
}

impl<V> Default for WireValues<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> WireValues<V> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: V) {
        self.entries.entry(name.into()).or_default().push(value);
    }

    /// Returns the values sent under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[V]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Returns the wire names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no values were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for WireValues<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.append(name, value);
        }
        values
    }
}

/// How wire entries are stored into a field.
pub trait ValueStrategy {
    /// Wire entry type.
    type Item;

    /// The tag kind whose descriptors this strategy binds.
    const TAG: TagKind;

    /// Stores `items` into the field described by `descriptor`.
    fn apply<T>(
        descriptor: &FieldDescriptor<T>,
        record: &mut T,
        items: &[Self::Item],
    ) -> Result<(), BindError>;
}

/// Converts text values through the primitive converter.
#[derive(Debug, Clone, Copy)]
pub struct ConvertValues;

impl ValueStrategy for ConvertValues {
    type Item = String;

    const TAG: TagKind = TagKind::Form;

    fn apply<T>(
        descriptor: &FieldDescriptor<T>,
        record: &mut T,
        items: &[String],
    ) -> Result<(), BindError> {
        descriptor
            .assign_values(record, items)
            .map_err(|err| BindError::Conversion(err.with_field(descriptor.tag())))
    }
}

/// Assigns uploaded file handles directly.
#[derive(Debug, Clone, Copy)]
pub struct AssignFiles;

impl ValueStrategy for AssignFiles {
    type Item = FileHandle;

    const TAG: TagKind = TagKind::File;

    fn apply<T>(
        descriptor: &FieldDescriptor<T>,
        record: &mut T,
        items: &[FileHandle],
    ) -> Result<(), BindError> {
        descriptor.assign_files(record, items);
        Ok(())
    }
}

/// Binds `wire` onto `record` following `descriptors`.
///
/// Fields are visited in descriptor order. Single fields receive only the
/// first wire value; repeated fields receive all of them in order. The first
/// failure aborts the pass and leaves earlier fields bound.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{bind_fields, Bind, Bindable, ConvertValues, TagKind, WireValues};
///
/// #[derive(Debug, Default, Bind)]
/// struct Filter {
///     #[bind(form = "age")]
///     age: u8,
///     #[bind(form = "id")]
///     ids: Vec<u64>,
/// }
///
/// let wire: WireValues<String> = [("age", "42"), ("id", "1"), ("id", "2")]
///     .into_iter()
///     .map(|(k, v)| (k, v.to_string()))
///     .collect();
///
/// let mut filter = Filter::default();
/// bind_fields::<_, ConvertValues>(&wire, &mut filter, Filter::descriptors(TagKind::Form)).unwrap();
/// assert_eq!(filter.age, 42);
/// assert_eq!(filter.ids, [1, 2]);
/// ```
pub fn bind_fields<T, S: ValueStrategy>(
    wire: &WireValues<S::Item>,
    record: &mut T,
    descriptors: &[FieldDescriptor<T>],
) -> Result<(), BindError> {
    for descriptor in descriptors {
        let Some(items) = wire.get(descriptor.tag()) else {
            continue;
        };
        if items.is_empty() {
            continue;
        }

        let items = match descriptor.cardinality() {
            Cardinality::Single => &items[..1],
            Cardinality::Repeated => items,
        };

        tracing::trace!(
            field = %descriptor.name(),
            tag = descriptor.tag(),
            kind = %S::TAG,
            count = items.len(),
            "binding field"
        );

        S::apply(descriptor, record, items)?;
    }

    Ok(())
}
