//! Application-facing entry point.

use std::any::TypeId;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dao::Dao;
use crate::descriptor::DescriptorCache;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::registry::{SemanticType, TypeConversion, TypeRegistry};
use crate::sqlite::{SqliteStore, TableDefinition};
use crate::storage::Storage;
use crate::value::FieldValue;

/// Database settings supplied by the host application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasyLiteConfig {
    /// File name of the database, relative to the directory passed to
    /// [`EasyLite::open`].
    pub database_name: String,
    /// Schema version recorded in the database.
    pub version: u32,
    /// Namespace the host keeps its record types in.
    pub model_namespace: String,
}

impl EasyLiteConfig {
    pub fn new(database_name: impl Into<String>, version: u32) -> Self {
        Self {
            database_name: database_name.into(),
            version,
            ..Self::default()
        }
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_model_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.model_namespace = namespace.into();
        self
    }
}

impl Default for EasyLiteConfig {
    fn default() -> Self {
        Self {
            database_name: "app.db".to_string(),
            version: 1,
            model_namespace: String::new(),
        }
    }
}

type TableDefinitionFn = fn(&DescriptorCache, &TypeRegistry) -> Result<TableDefinition>;

fn table_definition_of<E: Entity>(
    cache: &DescriptorCache,
    registry: &TypeRegistry,
) -> Result<TableDefinition> {
    Ok(cache.get_or_extract::<E>(registry)?.table_definition())
}

/// Owns the store, the type registry and the descriptor cache, and hands
/// out [`Dao`]s.
///
/// Constructed explicitly by the host; there is no global instance.
pub struct EasyLite {
    config: EasyLiteConfig,
    store: Arc<SqliteStore>,
    registry: Arc<TypeRegistry>,
    descriptors: DescriptorCache,
    entities: Vec<(TypeId, TableDefinitionFn)>,
}

impl EasyLite {
    /// Open `config.database_name` inside `directory`.
    pub fn open(config: EasyLiteConfig, directory: impl AsRef<Path>) -> Result<Self> {
        let path = directory.as_ref().join(&config.database_name);
        let store = SqliteStore::open(path).map_err(OrmError::storage)?;
        Self::with_store(config, store)
    }

    pub fn open_in_memory(config: EasyLiteConfig) -> Result<Self> {
        let store = SqliteStore::open_in_memory().map_err(OrmError::storage)?;
        Self::with_store(config, store)
    }

    /// Wrap an opened store, recording the configured schema version when
    /// the database has none yet.
    pub fn with_store(config: EasyLiteConfig, store: SqliteStore) -> Result<Self> {
        let current = store.user_version().map_err(OrmError::storage)?;
        if current == 0 {
            store
                .set_user_version(config.version)
                .map_err(OrmError::storage)?;
        } else if current != config.version {
            log::warn!(
                "database {} is at version {}, configured version is {}",
                config.database_name,
                current,
                config.version
            );
        }
        log::info!(
            "easylite ready: database {} version {}",
            config.database_name,
            config.version
        );
        Ok(Self {
            config,
            store: Arc::new(store),
            registry: Arc::new(TypeRegistry::new()),
            descriptors: DescriptorCache::new(),
            entities: Vec::new(),
        })
    }

    pub fn config(&self) -> &EasyLiteConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Add or replace a type conversion.
    ///
    /// DAOs handed out earlier keep the registry they were built with.
    pub fn register_type(
        &mut self,
        semantic_type: SemanticType,
        conversion: impl TypeConversion + 'static,
    ) {
        Arc::make_mut(&mut self.registry).register(semantic_type, conversion);
        // storage types may have changed
        self.descriptors.clear();
    }

    pub fn is_type_registered(&self, semantic_type: SemanticType) -> bool {
        self.registry.is_registered(semantic_type)
    }

    /// Record `E` as one of the host's entity types. Its metadata is
    /// extracted immediately so schema errors surface at registration.
    pub fn register_entity<E: Entity>(&mut self) -> Result<()> {
        self.descriptors.get_or_extract::<E>(&self.registry)?;
        let id = TypeId::of::<E>();
        if !self.entities.iter().any(|(known, _)| *known == id) {
            self.entities.push((id, table_definition_of::<E>));
        }
        Ok(())
    }

    /// Create the table of every registered entity that does not exist yet.
    pub fn initialize_schema(&self) -> Result<()> {
        for (_, definition) in &self.entities {
            let table = definition(&self.descriptors, &self.registry)?;
            self.store.create_table(&table).map_err(OrmError::storage)?;
        }
        Ok(())
    }

    /// DAO for `E`. Fails if `E`'s metadata cannot be extracted.
    pub fn dao<K, E>(&self) -> Result<Dao<K, E>>
    where
        K: Into<FieldValue>,
        E: Entity,
    {
        let descriptor = self.descriptors.get_or_extract::<E>(&self.registry)?;
        Dao::with_descriptor(
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            descriptor,
        )
    }
}

impl fmt::Debug for EasyLite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasyLite")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}
