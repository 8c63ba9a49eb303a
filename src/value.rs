//! In-memory field values.
//!
//! A [`FieldValue`] is what an entity getter hands to the codec and what the
//! codec hands back to a setter. It is independent of how the value ends up
//! being stored; that decision belongs to the type registry.

use time::OffsetDateTime;

use crate::error::ValueError;

/// Semantic value of one entity field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Boolean(bool),
    Char(char),
    Instant(OffsetDateTime),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Double(_) => "double",
            FieldValue::Text(_) => "text",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Char(_) => "character",
            FieldValue::Instant(_) => "instant",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    u8 => Integer,
    u16 => Integer,
    u32 => Integer,
    f32 => Float,
    f64 => Double,
    String => Text,
    bool => Boolean,
    char => Char,
    OffsetDateTime => Instant,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

macro_rules! impl_try_from_integer {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<FieldValue> for $ty {
                type Error = ValueError;

                fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
                    match value {
                        FieldValue::Integer(v) => <$ty>::try_from(v)
                            .map_err(|_| ValueError::OutOfRange { target: stringify!($ty) }),
                        other => Err(ValueError::mismatch("integer", other.kind())),
                    }
                }
            }
        )*
    };
}

impl_try_from_integer!(i8, i16, i32, u8, u16, u32);

impl TryFrom<FieldValue> for i64 {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(v) => Ok(v),
            other => Err(ValueError::mismatch("integer", other.kind())),
        }
    }
}

impl TryFrom<FieldValue> for f32 {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Float(v) => Ok(v),
            other => Err(ValueError::mismatch("float", other.kind())),
        }
    }
}

impl TryFrom<FieldValue> for f64 {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Double(v) => Ok(v),
            FieldValue::Float(v) => Ok(f64::from(v)),
            other => Err(ValueError::mismatch("double", other.kind())),
        }
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Boolean(v) => Ok(v),
            other => Err(ValueError::mismatch("boolean", other.kind())),
        }
    }
}

impl TryFrom<FieldValue> for char {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Char(v) => Ok(v),
            other => Err(ValueError::mismatch("character", other.kind())),
        }
    }
}

/// Character columns decode to `Char`; a `String` field declared as a
/// character column receives it as a one-character string.
impl TryFrom<FieldValue> for String {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Text(v) => Ok(v),
            FieldValue::Char(c) => Ok(c.to_string()),
            other => Err(ValueError::mismatch("text", other.kind())),
        }
    }
}

impl TryFrom<FieldValue> for OffsetDateTime {
    type Error = ValueError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Instant(v) => Ok(v),
            other => Err(ValueError::mismatch("instant", other.kind())),
        }
    }
}

macro_rules! impl_try_from_optional {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<FieldValue> for Option<$ty> {
                type Error = ValueError;

                fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
                    match value {
                        FieldValue::Null => Ok(None),
                        other => <$ty>::try_from(other).map(Some),
                    }
                }
            }
        )*
    };
}

impl_try_from_optional!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    bool,
    char,
    String,
    OffsetDateTime
);
