//! CRUD access to the table of one entity type.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::RowCodec;
use crate::descriptor::{extract, TableDescriptor};
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::registry::{SemanticType, TypeRegistry};
use crate::sqlite::{SqliteStore, Value};
use crate::storage::Storage;
use crate::value::FieldValue;

/// Data access object for entity type `E` keyed by `K`.
///
/// A `Dao` only holds shared, read-only state (store handle, registry and
/// descriptor), so it can be cloned and used from several threads. Every
/// call is a single blocking statement against the store.
pub struct Dao<K, E, S = SqliteStore> {
    store: Arc<S>,
    registry: Arc<TypeRegistry>,
    descriptor: Arc<TableDescriptor<E>>,
    _key: PhantomData<fn(K)>,
}

impl<K, E, S> Dao<K, E, S>
where
    K: Into<FieldValue>,
    E: Entity,
    S: Storage,
{
    /// Extract the descriptor of `E` and build a DAO over `store`.
    ///
    /// Schema errors surface here, before any statement runs.
    pub fn new(store: Arc<S>, registry: Arc<TypeRegistry>) -> Result<Self> {
        let descriptor = Arc::new(extract::<E>(&registry)?);
        Self::with_descriptor(store, registry, descriptor)
    }

    /// Build a DAO from an already extracted descriptor.
    ///
    /// Every column must still resolve in `registry` to a conversion with
    /// the storage type recorded at extraction.
    pub fn with_descriptor(
        store: Arc<S>,
        registry: Arc<TypeRegistry>,
        descriptor: Arc<TableDescriptor<E>>,
    ) -> Result<Self> {
        for column in descriptor.columns() {
            let storage_type = registry.resolve(column.semantic_type)?.storage_type();
            if storage_type != column.storage_type {
                return Err(OrmError::SchemaMismatch {
                    table: descriptor.name().to_string(),
                    reason: format!(
                        "column {} was extracted as {} but {} is now stored as {}",
                        column.name,
                        column.storage_type.sql(),
                        column.semantic_type,
                        storage_type.sql()
                    ),
                });
            }
        }
        Ok(Self {
            store,
            registry,
            descriptor,
            _key: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &TableDescriptor<E> {
        &self.descriptor
    }

    fn codec(&self) -> RowCodec<'_> {
        RowCodec::new(&self.registry)
    }

    /// Create the entity's table unless it exists.
    pub fn create_table(&self) -> Result<()> {
        self.store
            .create_table(&self.descriptor.table_definition())
            .map_err(OrmError::storage)
    }

    /// Insert `entity` and return the row id the store assigned.
    pub fn create<'e>(&self, entity: impl Into<Option<&'e E>>) -> Result<i64> {
        let entity = entity.into().ok_or(OrmError::NullEntity)?;
        let values = self.codec().encode(entity, &self.descriptor)?;
        let id = self
            .store
            .insert(self.descriptor.name(), &values)
            .map_err(OrmError::storage)?;
        log::debug!("created row {} in {}", id, self.descriptor.name());
        Ok(id)
    }

    /// Look up one entity by primary key. `Ok(None)` when no row matches.
    ///
    /// `key` should have the key field's type; an `f64` key on a Float
    /// column is narrowed to `f32`.
    pub fn find_by_id(&self, key: K) -> Result<Option<E>> {
        let predicate = self.key_predicate(key.into())?;
        self.find_by_predicate(&predicate)
    }

    /// Every row of the table, in storage order.
    pub fn find_all(&self) -> Result<Vec<E>> {
        let rows = self
            .store
            .query_all(self.descriptor.name())
            .map_err(OrmError::storage)?;
        log::debug!("loaded {} rows from {}", rows.len(), self.descriptor.name());
        let codec = self.codec();
        rows.iter()
            .map(|row| codec.decode(row, &self.descriptor))
            .collect()
    }

    /// Rewrite every column of the row matching the entity's primary key.
    /// Returns the affected row count; 0 means no row matched.
    pub fn update<'e>(&self, entity: impl Into<Option<&'e E>>) -> Result<usize> {
        let entity = entity.into().ok_or(OrmError::NullEntity)?;
        let predicate = self.entity_predicate(entity)?;
        let values = self.codec().encode(entity, &self.descriptor)?;
        let column = &self.descriptor.primary_key_column().name;
        let affected = self
            .store
            .update(self.descriptor.name(), &values, column, &predicate)
            .map_err(OrmError::storage)?;
        log::debug!(
            "updated {} rows in {} where {} = {:?}",
            affected,
            self.descriptor.name(),
            column,
            predicate
        );
        Ok(affected)
    }

    /// Delete the row matching the entity's primary key. Returns the affected
    /// row count; 0 means no row matched.
    pub fn delete<'e>(&self, entity: impl Into<Option<&'e E>>) -> Result<usize> {
        let entity = entity.into().ok_or(OrmError::NullEntity)?;
        let predicate = self.entity_predicate(entity)?;
        let column = &self.descriptor.primary_key_column().name;
        let affected = self
            .store
            .delete(self.descriptor.name(), column, &predicate)
            .map_err(OrmError::storage)?;
        log::debug!(
            "deleted {} rows from {} where {} = {:?}",
            affected,
            self.descriptor.name(),
            column,
            predicate
        );
        Ok(affected)
    }

    /// Whether a row with the entity's primary key is stored.
    pub fn exists<'e>(&self, entity: impl Into<Option<&'e E>>) -> Result<bool> {
        let entity = entity.into().ok_or(OrmError::NullEntity)?;
        let predicate = self.entity_predicate(entity)?;
        Ok(self.find_by_predicate(&predicate)?.is_some())
    }

    fn find_by_predicate(&self, predicate: &Value) -> Result<Option<E>> {
        let column = &self.descriptor.primary_key_column().name;
        log::debug!(
            "find in {} where {} = {:?}",
            self.descriptor.name(),
            column,
            predicate
        );
        let row = self
            .store
            .query_one(self.descriptor.name(), column, predicate)
            .map_err(OrmError::storage)?;
        row.map(|row| self.codec().decode(&row, &self.descriptor))
            .transpose()
    }

    fn entity_predicate(&self, entity: &E) -> Result<Value> {
        let key = (self.descriptor.primary_key_accessor().get)(entity);
        self.key_predicate(key)
    }

    /// Textual form of a key, bound as the primary key predicate.
    ///
    /// Numeric keys use their native display; other types are encoded with
    /// the column's conversion and the stored cell is rendered as text.
    fn key_predicate(&self, key: FieldValue) -> Result<Value> {
        let column = self.descriptor.primary_key_column();
        let missing = |reason: &str| OrmError::MissingPrimaryKey {
            entity: self.descriptor.name().to_string(),
            reason: reason.to_string(),
        };
        let text = match (column.semantic_type, &key) {
            (_, FieldValue::Null) => return Err(missing("primary key value is null")),
            (SemanticType::Integer, FieldValue::Integer(v)) => v.to_string(),
            // widened first so the text parses back to the stored REAL
            (SemanticType::Float, FieldValue::Float(v)) => f64::from(*v).to_string(),
            (SemanticType::Float, FieldValue::Double(v)) => f64::from(*v as f32).to_string(),
            (SemanticType::Double, FieldValue::Double(v)) => v.to_string(),
            _ => self
                .codec()
                .encode_value(column, &key)?
                .to_text()
                .ok_or_else(|| missing("primary key has no textual form"))?,
        };
        Ok(Value::Text(text))
    }
}

impl<K, E, S> Clone for Dao<K, E, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            descriptor: Arc::clone(&self.descriptor),
            _key: PhantomData,
        }
    }
}

impl<K, E, S> fmt::Debug for Dao<K, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dao")
            .field("table", &self.descriptor.name())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
