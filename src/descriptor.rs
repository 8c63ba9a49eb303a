//! Table metadata derived from entity definitions.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::entity::{Entity, Getter, Setter};
use crate::error::{OrmError, Result};
use crate::registry::{SemanticType, TypeRegistry};
use crate::sqlite::{ColumnConstraint, ColumnDefinition, DataType, TableDefinition};

/// One mapped column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
    pub is_primary_key: bool,
    /// Storage type reported by the registry at extraction time.
    pub storage_type: DataType,
}

pub(crate) struct Accessor<E> {
    pub(crate) get: Getter<E>,
    pub(crate) set: Setter<E>,
}

/// Immutable table schema of an entity type `E`.
///
/// Built by [`extract`]; holds the column list in declaration order and the
/// field accessors the row codec drives.
pub struct TableDescriptor<E> {
    name: String,
    columns: Vec<ColumnDescriptor>,
    primary_key: usize,
    accessors: Vec<Accessor<E>>,
}

impl<E> TableDescriptor<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn primary_key_column(&self) -> &ColumnDescriptor {
        &self.columns[self.primary_key]
    }

    pub(crate) fn primary_key_accessor(&self) -> &Accessor<E> {
        &self.accessors[self.primary_key]
    }

    pub(crate) fn mapped(&self) -> impl Iterator<Item = (&ColumnDescriptor, &Accessor<E>)> {
        self.columns.iter().zip(self.accessors.iter())
    }

    /// Physical definition used to create the table
    pub fn table_definition(&self) -> TableDefinition {
        TableDefinition {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| ColumnDefinition {
                    name: column.name.clone(),
                    data_type: column.storage_type,
                    constraints: if column.is_primary_key {
                        vec![ColumnConstraint::PrimaryKey]
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
        }
    }
}

impl<E> fmt::Debug for TableDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDescriptor")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

/// Derive the table descriptor of `E`.
///
/// Fails if a field's semantic type has no registered conversion, if a
/// column name repeats, or unless exactly one field is the primary key.
pub fn extract<E: Entity>(registry: &TypeRegistry) -> Result<TableDescriptor<E>> {
    let definition = E::definition();
    let entity = definition.type_name;

    let mut columns = Vec::with_capacity(definition.fields.len());
    let mut accessors = Vec::with_capacity(definition.fields.len());
    let mut keys = Vec::new();

    for field in definition.fields {
        let conversion = registry.resolve(field.semantic_type).map_err(|_| {
            OrmError::UnmappableField {
                entity: entity.to_string(),
                field: field.name.to_string(),
                semantic_type: field.semantic_type,
            }
        })?;
        if columns
            .iter()
            .any(|column: &ColumnDescriptor| column.name == field.name)
        {
            return Err(OrmError::DuplicateColumn {
                entity: entity.to_string(),
                column: field.name.to_string(),
            });
        }
        if field.primary_key {
            keys.push(columns.len());
        }
        columns.push(ColumnDescriptor {
            name: field.name.to_string(),
            semantic_type: field.semantic_type,
            is_primary_key: field.primary_key,
            storage_type: conversion.storage_type(),
        });
        accessors.push(Accessor {
            get: field.get,
            set: field.set,
        });
    }

    let primary_key = match keys.as_slice() {
        [key] => *key,
        [] => {
            return Err(OrmError::MissingPrimaryKey {
                entity: entity.to_string(),
                reason: "no field is marked as primary key".to_string(),
            })
        }
        many => {
            return Err(OrmError::MissingPrimaryKey {
                entity: entity.to_string(),
                reason: format!("{} fields are marked as primary key", many.len()),
            })
        }
    };

    let name = definition
        .table
        .unwrap_or_else(|| entity.to_string());
    log::debug!(
        "extracted table {} for {} ({} columns, key {})",
        name,
        entity,
        columns.len(),
        columns[primary_key].name
    );

    Ok(TableDescriptor {
        name,
        columns,
        primary_key,
        accessors,
    })
}

/// Descriptors keyed by entity type, extracted once and shared afterwards.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    descriptors: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached descriptor of `E`, extracting it on first use.
    ///
    /// Extraction errors are returned every time and never cached.
    pub fn get_or_extract<E: Entity>(
        &self,
        registry: &TypeRegistry,
    ) -> Result<Arc<TableDescriptor<E>>> {
        let key = TypeId::of::<E>();
        let cached = self
            .descriptors
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(descriptor) = cached.and_then(|any| any.downcast::<TableDescriptor<E>>().ok()) {
            return Ok(descriptor);
        }

        let descriptor = Arc::new(extract::<E>(registry)?);
        self.descriptors
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, descriptor.clone());
        Ok(descriptor)
    }

    pub fn clear(&self) {
        self.descriptors
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}
