//! Entity mapping and CRUD persistence over SQLite for the Runar ecosystem.
//!
//! # Intention
//!
//! - Map typed record definitions to tables and entity instances to rows.
//! - Provide create/read/update/delete/exists by primary key through [`Dao`].
//! - Keep value conversion open: hosts register their own [`TypeConversion`]s.
//!
//! # Architectural Boundaries
//!
//! - Statement execution lives behind [`Storage`]; [`SqliteStore`] is the
//!   SQLite implementation.
//! - No query planning beyond key lookup and full scans, no migrations, no
//!   relationships and no multi-statement transactions.

pub mod codec;
pub mod dao;
pub mod descriptor;
pub mod easylite;
pub mod entity;
pub mod error;
pub mod registry;
pub mod sqlite;
pub mod storage;
pub mod value;

pub use codec::RowCodec;
pub use dao::Dao;
pub use descriptor::{extract, ColumnDescriptor, DescriptorCache, TableDescriptor};
pub use easylite::{EasyLite, EasyLiteConfig};
pub use entity::{Entity, EntityDefinition, FieldDef};
pub use error::{OrmError, Result, ValueError};
pub use registry::{SemanticType, TypeConversion, TypeRegistry};
pub use sqlite::{ColumnValues, DataType, Row, SqliteStore, TableDefinition, Value};
pub use storage::Storage;
pub use value::FieldValue;
