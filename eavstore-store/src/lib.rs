//! EAV data-access layer for EAVStore.
//!
//! Stores heterogeneous records in four fixed SQLite tables and keeps them
//! consistent: every stored value belongs to a property of the instance's
//! own entity.
//!
//! # Architecture
//!
//! - [`EntityStore`] owns entity definitions, always returned with their
//!   properties attached
//! - [`PropertyStore`] owns property definitions and resolves raw
//!   `{name, value}` pairs into [`ValidatedProperties`]
//! - [`InstanceStore`] owns instances and their data rows, and answers
//!   attribute-value queries
//! - [`EavStore`] bundles the three over one shared connection and
//!   implements the multi-step flows the HTTP layer needs
//!
//! Every mutation touching more than one row runs in a single transaction.

mod entity_store;
mod error;
mod instance_store;
mod property_store;
mod query;
mod sql;
mod validation;

use std::path::Path;

use eavstore_db::Database;
use eavstore_model::{EntityDetail, EntityId, Instance, InstanceId, PropertyValue};
use tracing::debug;

pub use entity_store::EntityStore;
pub use error::{StoreError, StoreResult};
pub use instance_store::InstanceStore;
pub use property_store::PropertyStore;
pub use sql::MAX_NAME_LEN;
pub use validation::{ValidatedProperties, ValidationMode};

/// The three stores over one shared database handle.
#[derive(Debug, Clone)]
pub struct EavStore {
    entities: EntityStore,
    properties: PropertyStore,
    instances: InstanceStore,
}

impl EavStore {
    pub fn new(db: Database) -> Self {
        Self {
            entities: EntityStore::new(db.clone()),
            properties: PropertyStore::new(db.clone()),
            instances: InstanceStore::new(db),
        }
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Opens a private in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn instances(&self) -> &InstanceStore {
        &self.instances
    }

    /// An entity with its properties and all of its instances.
    pub fn entity_detail(&self, id: EntityId) -> StoreResult<EntityDetail> {
        let entity = self.entities.find(id)?;
        let instances = self.instances.get_by_entity_id(id)?;
        Ok(EntityDetail { entity, instances })
    }

    /// Creates an instance of the entity named `entity_name` from raw
    /// `{name, value}` pairs.
    ///
    /// Fails with `NotFound` for an unknown entity and `NoValidProperties`
    /// when no pair resolves.
    pub fn create_instance(
        &self,
        entity_name: &str,
        raw: &[PropertyValue],
        mode: ValidationMode,
    ) -> StoreResult<Instance> {
        let entity = self
            .entities
            .get_by_name(entity_name)?
            .ok_or_else(|| StoreError::not_found("entity", entity_name.trim()))?;
        let properties = self
            .properties
            .validate_with(mode, &entity, raw)?
            .require_any()?;
        self.instances.store(&entity, &properties)
    }

    /// Partially updates an instance from raw `{name, value}` pairs, resolved
    /// against the instance's own entity.
    pub fn update_instance(
        &self,
        id: InstanceId,
        raw: &[PropertyValue],
        mode: ValidationMode,
    ) -> StoreResult<Instance> {
        let instance = self.instances.find_by_id(id)?;
        let entity = self.entities.find(instance.entity_id())?;
        let properties = self
            .properties
            .validate_with(mode, &entity, raw)?
            .require_any()?;
        debug!(instance_id = %id, entity = %entity.name, "updating instance");
        self.instances.update(&instance, &properties)
    }
}
