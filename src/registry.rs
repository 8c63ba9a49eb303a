//! Type conversion registry.
//!
//! Maps each [`SemanticType`] to the [`TypeConversion`] that knows how to
//! store it. The built-in types are registered by [`TypeRegistry::new`]; the
//! host may add new types or replace built-ins with [`TypeRegistry::register`]
//! (last registration wins).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::error::{OrmError, Result, ValueError};
use crate::sqlite::{DataType, Value};
use crate::value::FieldValue;

/// Semantic type of an entity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Integer,
    Float,
    Double,
    Text,
    Boolean,
    Character,
    Instant,
    /// Host-registered type, identified by name.
    Custom(&'static str),
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer => write!(f, "integer"),
            SemanticType::Float => write!(f, "float"),
            SemanticType::Double => write!(f, "double"),
            SemanticType::Text => write!(f, "text"),
            SemanticType::Boolean => write!(f, "boolean"),
            SemanticType::Character => write!(f, "character"),
            SemanticType::Instant => write!(f, "instant"),
            SemanticType::Custom(name) => write!(f, "custom({name})"),
        }
    }
}

/// Bidirectional codec between a semantic value and a storage cell.
///
/// Implementations must be stateless: one registry is shared read-only by
/// every DAO on every thread. Null handling is done by the row codec, so
/// neither method is called with a null value.
pub trait TypeConversion: Send + Sync {
    /// Column type used when the table is created.
    fn storage_type(&self) -> DataType;

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError>;

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError>;
}

struct IntegerConversion;

impl TypeConversion for IntegerConversion {
    fn storage_type(&self) -> DataType {
        DataType::Integer
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Integer(v) => Ok(Value::Integer(*v)),
            other => Err(ValueError::mismatch("integer", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Integer(v) => Ok(FieldValue::Integer(*v)),
            other => Err(ValueError::mismatch("integer", other.kind())),
        }
    }
}

struct FloatConversion;

impl TypeConversion for FloatConversion {
    fn storage_type(&self) -> DataType {
        DataType::Real
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Float(v) => Ok(Value::Real(f64::from(*v))),
            other => Err(ValueError::mismatch("float", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Real(v) => Ok(FieldValue::Float(*v as f32)),
            // SQLite may hand back whole REAL values as integers
            Value::Integer(v) => Ok(FieldValue::Float(*v as f32)),
            other => Err(ValueError::mismatch("float", other.kind())),
        }
    }
}

struct DoubleConversion;

impl TypeConversion for DoubleConversion {
    fn storage_type(&self) -> DataType {
        DataType::Real
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Double(v) => Ok(Value::Real(*v)),
            FieldValue::Float(v) => Ok(Value::Real(f64::from(*v))),
            other => Err(ValueError::mismatch("double", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Real(v) => Ok(FieldValue::Double(*v)),
            Value::Integer(v) => Ok(FieldValue::Double(*v as f64)),
            other => Err(ValueError::mismatch("double", other.kind())),
        }
    }
}

struct TextConversion;

impl TypeConversion for TextConversion {
    fn storage_type(&self) -> DataType {
        DataType::Text
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Text(v) => Ok(Value::Text(v.clone())),
            FieldValue::Char(c) => Ok(Value::Text(c.to_string())),
            other => Err(ValueError::mismatch("text", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Text(v) => Ok(FieldValue::Text(v.clone())),
            other => Err(ValueError::mismatch("text", other.kind())),
        }
    }
}

/// Stored as `0`/`1`.
struct BooleanConversion;

impl TypeConversion for BooleanConversion {
    fn storage_type(&self) -> DataType {
        DataType::Integer
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Boolean(v) => Ok(Value::Integer(i64::from(*v))),
            other => Err(ValueError::mismatch("boolean", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Integer(v) => Ok(FieldValue::Boolean(*v == 1)),
            other => Err(ValueError::mismatch("boolean", other.kind())),
        }
    }
}

/// Stored as a one-character text cell. Longer text keeps only its first
/// character; empty text is stored as NULL.
struct CharacterConversion;

impl TypeConversion for CharacterConversion {
    fn storage_type(&self) -> DataType {
        DataType::Text
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Char(c) => Ok(Value::Text(c.to_string())),
            FieldValue::Text(s) => Ok(s
                .chars()
                .next()
                .map_or(Value::Null, |c| Value::Text(c.to_string()))),
            other => Err(ValueError::mismatch("character", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Text(s) => Ok(s.chars().next().map_or(FieldValue::Null, FieldValue::Char)),
            other => Err(ValueError::mismatch("character", other.kind())),
        }
    }
}

/// Stored as epoch milliseconds.
struct InstantConversion;

impl InstantConversion {
    const NANOS_PER_MILLI: i128 = 1_000_000;
}

impl TypeConversion for InstantConversion {
    fn storage_type(&self) -> DataType {
        DataType::Integer
    }

    fn encode(&self, value: &FieldValue) -> std::result::Result<Value, ValueError> {
        match value {
            FieldValue::Instant(instant) => {
                let millis = instant
                    .unix_timestamp_nanos()
                    .div_euclid(Self::NANOS_PER_MILLI);
                i64::try_from(millis)
                    .map(Value::Integer)
                    .map_err(|_| ValueError::OutOfRange { target: "epoch millis" })
            }
            other => Err(ValueError::mismatch("instant", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> std::result::Result<FieldValue, ValueError> {
        match cell {
            Value::Integer(millis) => {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(*millis) * Self::NANOS_PER_MILLI)
                    .map(FieldValue::Instant)
                    .map_err(|_| ValueError::OutOfRange { target: "instant" })
            }
            other => Err(ValueError::mismatch("instant", other.kind())),
        }
    }
}

/// Registry of type conversions keyed by semantic type.
///
/// Cloning is cheap: entries are reference counted.
#[derive(Clone)]
pub struct TypeRegistry {
    entries: HashMap<SemanticType, Arc<dyn TypeConversion>>,
}

impl TypeRegistry {
    /// Create a registry holding the built-in conversions.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };
        registry.register(SemanticType::Integer, IntegerConversion);
        registry.register(SemanticType::Float, FloatConversion);
        registry.register(SemanticType::Double, DoubleConversion);
        registry.register(SemanticType::Text, TextConversion);
        registry.register(SemanticType::Boolean, BooleanConversion);
        registry.register(SemanticType::Character, CharacterConversion);
        registry.register(SemanticType::Instant, InstantConversion);
        registry
    }

    /// Add or replace the conversion for `semantic_type`.
    pub fn register(
        &mut self,
        semantic_type: SemanticType,
        conversion: impl TypeConversion + 'static,
    ) {
        if self
            .entries
            .insert(semantic_type, Arc::new(conversion))
            .is_some()
        {
            log::debug!("replaced conversion for {semantic_type}");
        }
    }

    pub fn resolve(&self, semantic_type: SemanticType) -> Result<&dyn TypeConversion> {
        self.entries
            .get(&semantic_type)
            .map(|entry| &**entry)
            .ok_or(OrmError::UnregisteredType(semantic_type))
    }

    pub fn is_registered(&self, semantic_type: SemanticType) -> bool {
        self.entries.contains_key(&semantic_type)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
