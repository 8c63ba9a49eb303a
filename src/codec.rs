//! Conversion between entity instances and rows.

use crate::descriptor::{ColumnDescriptor, TableDescriptor};
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::registry::TypeRegistry;
use crate::sqlite::{ColumnValues, Row, Value};
use crate::value::FieldValue;

/// Encodes entities into column values and decodes rows back into entities,
/// resolving each column's conversion in the registry.
#[derive(Debug, Clone, Copy)]
pub struct RowCodec<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> RowCodec<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Column values for every mapped field of `entity`, in column order
    pub fn encode<E>(&self, entity: &E, descriptor: &TableDescriptor<E>) -> Result<ColumnValues> {
        let mut values = ColumnValues::new();
        for (column, accessor) in descriptor.mapped() {
            let value = (accessor.get)(entity);
            values.insert(&column.name, self.encode_value(column, &value)?);
        }
        Ok(values)
    }

    /// Build a fresh `E` from `row`. Every mapped column must be present.
    pub fn decode<E: Entity>(&self, row: &Row, descriptor: &TableDescriptor<E>) -> Result<E> {
        let mut entity = E::default();
        for (column, accessor) in descriptor.mapped() {
            let cell = row.get(&column.name).ok_or_else(|| OrmError::SchemaMismatch {
                table: descriptor.name().to_string(),
                reason: format!("missing column `{}`", column.name),
            })?;
            let value = self.decode_cell(descriptor.name(), column, cell)?;
            (accessor.set)(&mut entity, value).map_err(|source| OrmError::FieldAccess {
                field: column.name.clone(),
                source,
            })?;
        }
        Ok(entity)
    }

    pub(crate) fn encode_value(
        &self,
        column: &ColumnDescriptor,
        value: &FieldValue,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.registry
            .resolve(column.semantic_type)?
            .encode(value)
            .map_err(|source| OrmError::FieldAccess {
                field: column.name.clone(),
                source,
            })
    }

    fn decode_cell(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        cell: &Value,
    ) -> Result<FieldValue> {
        if matches!(cell, Value::Null) {
            return Ok(FieldValue::Null);
        }
        self.registry
            .resolve(column.semantic_type)?
            .decode(cell)
            .map_err(|err| OrmError::SchemaMismatch {
                table: table.to_string(),
                reason: format!("column `{}`: {}", column.name, err),
            })
    }
}
