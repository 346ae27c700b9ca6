//! Single-value conversion from wire text to primitive types.
//!
//! The [`convert`] function is the foundation every binder builds on: form
//! values, multipart text parts and header values all pass through it.
//!
//! | Semantic type | Rust types | Accepted text |
//! |---------------|------------|---------------|
//! | `bool` | `bool` | `1 t T TRUE true True 0 f F FALSE false False` |
//! | signed integers | `i8`..`i64`, `isize` | base-10, optional sign |
//! | unsigned integers | `u8`..`u64`, `usize` | base-10 |
//! | floats | `f32`, `f64` | decimal or exponent notation |
//! | `string` | `String` | anything |
//! | `timestamp` | `DateTime<FixedOffset>`, `DateTime<Utc>` | RFC 3339 |
//!
//! An empty string converts to the type's zero value.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::error::ConversionError;

/// The closed set of types a single wire value can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// UTF-8 text
    String,
    /// Date, time and UTC offset
    Timestamp,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A converted primitive value.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    String(String),
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    /// Returns the zero value of `ty`.
    #[must_use]
    pub fn zero(ty: SemanticType) -> Self {
        match ty {
            SemanticType::Bool => Self::Bool(false),
            SemanticType::I8 => Self::I8(0),
            SemanticType::I16 => Self::I16(0),
            SemanticType::I32 => Self::I32(0),
            SemanticType::I64 => Self::I64(0),
            SemanticType::Isize => Self::Isize(0),
            SemanticType::U8 => Self::U8(0),
            SemanticType::U16 => Self::U16(0),
            SemanticType::U32 => Self::U32(0),
            SemanticType::U64 => Self::U64(0),
            SemanticType::Usize => Self::Usize(0),
            SemanticType::F32 => Self::F32(0.0),
            SemanticType::F64 => Self::F64(0.0),
            SemanticType::String => Self::String(String::new()),
            SemanticType::Timestamp => Self::Timestamp(DateTime::<FixedOffset>::default()),
        }
    }

    /// Returns the semantic type of this value.
    #[must_use]
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Self::Bool(_) => SemanticType::Bool,
            Self::I8(_) => SemanticType::I8,
            Self::I16(_) => SemanticType::I16,
            Self::I32(_) => SemanticType::I32,
            Self::I64(_) => SemanticType::I64,
            Self::Isize(_) => SemanticType::Isize,
            Self::U8(_) => SemanticType::U8,
            Self::U16(_) => SemanticType::U16,
            Self::U32(_) => SemanticType::U32,
            Self::U64(_) => SemanticType::U64,
            Self::Usize(_) => SemanticType::Usize,
            Self::F32(_) => SemanticType::F32,
            Self::F64(_) => SemanticType::F64,
            Self::String(_) => SemanticType::String,
            Self::Timestamp(_) => SemanticType::Timestamp,
        }
    }
}

/// Renders the canonical textual form, which [`convert`] maps back to an
/// equal value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Timestamp(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// Converts a single wire token into a value of type `ty`.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{convert, SemanticType, Value};
///
/// assert_eq!(convert("42", SemanticType::U16).unwrap(), Value::U16(42));
/// assert_eq!(convert("", SemanticType::I32).unwrap(), Value::I32(0));
/// assert!(convert("abc", SemanticType::I32).is_err());
/// ```
pub fn convert(text: &str, ty: SemanticType) -> Result<Value, ConversionError> {
    if text.is_empty() {
        return Ok(Value::zero(ty));
    }

    let fail = || ConversionError::new(text, ty);

    let value = match ty {
        SemanticType::Bool => Value::Bool(parse_bool(text).ok_or_else(fail)?),
        SemanticType::I8 => Value::I8(text.parse().map_err(|_| fail())?),
        SemanticType::I16 => Value::I16(text.parse().map_err(|_| fail())?),
        SemanticType::I32 => Value::I32(text.parse().map_err(|_| fail())?),
        SemanticType::I64 => Value::I64(text.parse().map_err(|_| fail())?),
        SemanticType::Isize => Value::Isize(text.parse().map_err(|_| fail())?),
        SemanticType::U8 => Value::U8(text.parse().map_err(|_| fail())?),
        SemanticType::U16 => Value::U16(text.parse().map_err(|_| fail())?),
        SemanticType::U32 => Value::U32(text.parse().map_err(|_| fail())?),
        SemanticType::U64 => Value::U64(text.parse().map_err(|_| fail())?),
        SemanticType::Usize => Value::Usize(text.parse().map_err(|_| fail())?),
        SemanticType::F32 => Value::F32(text.parse().map_err(|_| fail())?),
        SemanticType::F64 => Value::F64(text.parse().map_err(|_| fail())?),
        SemanticType::String => Value::String(text.to_owned()),
        SemanticType::Timestamp => {
            Value::Timestamp(DateTime::parse_from_rfc3339(text).map_err(|_| fail())?)
        }
    };

    Ok(value)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Rust types that a single wire value can be converted into.
///
/// Implemented for every type listed in the module documentation; the set is
/// closed.
pub trait Primitive: Sized + Default + Send + 'static {
    /// The semantic type used for conversion.
    const SEMANTIC: SemanticType;

    /// Extracts `Self` from a value of the matching semantic type.
    fn from_value(value: Value) -> Option<Self>;

    /// Wraps `self` into a [`Value`].
    fn into_value(self) -> Value;
}

/// Converts a single wire token directly into `P`.
///
/// ```rust
/// use archimedes_bind::convert_to;
///
/// let enabled: bool = convert_to("T").unwrap();
/// assert!(enabled);
/// ```
pub fn convert_to<P: Primitive>(text: &str) -> Result<P, ConversionError> {
    let value = convert(text, P::SEMANTIC)?;
    P::from_value(value).ok_or_else(|| ConversionError::new(text, P::SEMANTIC))
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SEMANTIC: SemanticType = SemanticType::$variant;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    DateTime<FixedOffset> => Timestamp,
}

impl Primitive for DateTime<Utc> {
    const SEMANTIC: SemanticType = SemanticType::Timestamp;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(v.with_timezone(&Utc)),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Timestamp(self.fixed_offset())
    }
}
