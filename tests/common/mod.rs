// Shared record types for the integration tests
#![allow(dead_code)]

use rust_sqlite_orm::{entity, EasyLite, EasyLiteConfig, FieldValue, TypeConversion, Value};
use rust_sqlite_orm::{DataType, ValueError};
use time::OffsetDateTime;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Note {
    pub id: i32,
    pub body: String,
    pub author: Option<String>,
    pub sent: bool,
    pub date: Option<OffsetDateTime>,
}

entity! {
    Note as "Note" {
        #[primary_key]
        id: Integer,
        body: Text,
        author: Text,
        sent: Boolean,
        date: Instant,
    }
}

impl Note {
    pub fn new(id: i32, body: &str, sent: bool) -> Self {
        Self {
            id,
            body: body.to_string(),
            sent,
            ..Self::default()
        }
    }
}

/// One field per built-in semantic type
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sample {
    pub id: i64,
    pub count: i32,
    pub ratio: f32,
    pub amount: f64,
    pub label: String,
    pub flag: bool,
    pub grade: char,
    pub initial: String,
    pub at: Option<OffsetDateTime>,
}

entity! {
    Sample {
        #[primary_key]
        id: Integer,
        count: Integer,
        ratio: Float,
        amount: Double,
        label: Text,
        flag: Boolean,
        grade: Character,
        initial: Character,
        at: Instant,
    }
}

/// Keyed by text
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Contact {
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
}

entity! {
    Contact as "contacts" {
        #[primary_key]
        email: Text,
        name: Text,
        age: Integer,
    }
}

/// Keyed by a double
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reading {
    pub at: f64,
    pub celsius: f32,
}

entity! {
    Reading {
        #[primary_key]
        at: Double,
        celsius: Float,
    }
}

/// Keyed by an optional integer so the key can be missing at runtime
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Draft {
    pub id: Option<i64>,
    pub text: String,
}

entity! {
    Draft {
        #[primary_key]
        id: Integer,
        text: Text,
    }
}

/// Keyed by a boolean, so the table holds at most two rows
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Flagged {
    pub on: bool,
    pub label: String,
}

entity! {
    Flagged {
        #[primary_key]
        on: Boolean,
        label: Text,
    }
}

/// Keyed by an instant
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stamped {
    pub at: Option<OffsetDateTime>,
    pub label: String,
}

entity! {
    Stamped {
        #[primary_key]
        at: Instant,
        label: Text,
    }
}

/// Keyed by a character
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lettered {
    pub letter: char,
    pub word: String,
}

entity! {
    Lettered {
        #[primary_key]
        letter: Character,
        word: Text,
    }
}

/// Keyed by a single-precision float
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Floated {
    pub key: f32,
    pub label: String,
}

entity! {
    Floated {
        #[primary_key]
        key: Float,
        label: Text,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Unkeyed {
    pub name: String,
}

entity! {
    Unkeyed {
        name: Text,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DoubleKeyed {
    pub a: i32,
    pub b: i32,
}

entity! {
    DoubleKeyed {
        #[primary_key]
        a: Integer,
        #[primary_key]
        b: Integer,
    }
}

/// Uses a type that is only known once `cents` is registered
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Price {
    pub id: i32,
    pub amount: f64,
}

entity! {
    Price {
        #[primary_key]
        id: Integer,
        amount: Custom("cents"),
    }
}

/// Stores a decimal amount as whole cents
pub struct CentsConversion;

impl TypeConversion for CentsConversion {
    fn storage_type(&self) -> DataType {
        DataType::Integer
    }

    fn encode(&self, value: &FieldValue) -> Result<Value, ValueError> {
        match value {
            FieldValue::Double(amount) => Ok(Value::Integer((amount * 100.0).round() as i64)),
            other => Err(ValueError::mismatch("double", other.kind())),
        }
    }

    fn decode(&self, cell: &Value) -> Result<FieldValue, ValueError> {
        match cell {
            Value::Integer(cents) => Ok(FieldValue::Double(*cents as f64 / 100.0)),
            other => Err(ValueError::mismatch("integer", other.kind())),
        }
    }
}

pub fn instant_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).unwrap()
}

/// In-memory database with the tables of the common entities
pub fn create_test_db() -> anyhow::Result<EasyLite> {
    let mut easy = EasyLite::open_in_memory(EasyLiteConfig::default())?;
    easy.register_entity::<Note>()?;
    easy.register_entity::<Sample>()?;
    easy.register_entity::<Contact>()?;
    easy.register_entity::<Reading>()?;
    easy.register_entity::<Draft>()?;
    easy.register_entity::<Flagged>()?;
    easy.register_entity::<Stamped>()?;
    easy.register_entity::<Lettered>()?;
    easy.register_entity::<Floated>()?;
    easy.initialize_schema()?;
    Ok(easy)
}
