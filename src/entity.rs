//! Record definitions.
//!
//! An [`Entity`] describes itself with an explicit list of fields instead of
//! being inspected at runtime. Each [`FieldDef`] carries the column name, the
//! semantic type, the primary key marker and a getter/setter pair.
//!
//! The [`entity!`](crate::entity!) macro writes the definition for plain
//! structs:
//!
//! ```
//! use rust_sqlite_orm::entity;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! pub struct Note {
//!     pub id: i32,
//!     pub body: String,
//!     pub sent: bool,
//! }
//!
//! entity! {
//!     Note {
//!         #[primary_key]
//!         id: Integer,
//!         body: Text,
//!         sent: Boolean,
//!     }
//! }
//! ```

use std::fmt;

use crate::error::ValueError;
use crate::registry::SemanticType;
use crate::value::FieldValue;

pub type Getter<E> = fn(&E) -> FieldValue;
pub type Setter<E> = fn(&mut E, FieldValue) -> Result<(), ValueError>;

/// A record type that can be mapped to a table.
///
/// `Default` provides the blank instance rows are decoded into.
pub trait Entity: Default + Send + Sync + 'static {
    fn definition() -> EntityDefinition<Self>;
}

/// One declared field of an entity
pub struct FieldDef<E> {
    pub(crate) name: &'static str,
    pub(crate) semantic_type: SemanticType,
    pub(crate) primary_key: bool,
    pub(crate) get: Getter<E>,
    pub(crate) set: Setter<E>,
}

impl<E> FieldDef<E> {
    pub fn new(
        name: &'static str,
        semantic_type: SemanticType,
        get: Getter<E>,
        set: Setter<E>,
    ) -> Self {
        Self {
            name,
            semantic_type,
            primary_key: false,
            get,
            set,
        }
    }

    /// Mark this field as the table's primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<E> fmt::Debug for FieldDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("semantic_type", &self.semantic_type)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

/// Field list and table name of an entity type
#[derive(Debug)]
pub struct EntityDefinition<E> {
    pub(crate) type_name: &'static str,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<FieldDef<E>>,
}

impl<E> EntityDefinition<E> {
    pub fn new() -> Self {
        Self {
            type_name: simple_type_name::<E>(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Override the table name (defaults to the simple type name)
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    pub fn field(mut self, field: FieldDef<E>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDef<E>] {
        &self.fields
    }
}

impl<E> Default for EntityDefinition<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// `my_app::model::Note` -> `Note`, `a::Wrapper<b::X>` -> `Wrapper`
fn simple_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    // generic arguments may contain `::` themselves
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map_or(0, |i| i + 2);
    &base[start..]
}

/// Implements [`Entity`] for a struct from its field list.
///
/// Field types name a [`SemanticType`] variant. `#[primary_key]` marks the
/// key field and `Note as "notes"` overrides the table name. Custom types are
/// written `Custom("name")`.
#[macro_export]
macro_rules! entity {
    (
        $entity:ident $(as $table:literal)? {
            $(
                $(#[$marker:ident])?
                $field:ident : $kind:ident $(($custom:literal))?
            ),* $(,)?
        }
    ) => {
        impl $crate::Entity for $entity {
            fn definition() -> $crate::EntityDefinition<Self> {
                $crate::EntityDefinition::new()
                    $(.table($table))?
                    $(
                        .field(
                            $crate::FieldDef::new(
                                stringify!($field),
                                $crate::SemanticType::$kind $(($custom))?,
                                |entity: &$entity| {
                                    $crate::FieldValue::from(::core::clone::Clone::clone(&entity.$field))
                                },
                                |entity: &mut $entity, value: $crate::FieldValue| {
                                    entity.$field = ::core::convert::TryFrom::try_from(value)?;
                                    Ok(())
                                },
                            )
                            $(.$marker())?
                        )
                    )*
            }
        }
    };
}
