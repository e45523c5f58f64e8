//! Instances, their data rows, and the attribute-value query engine.

use eavstore_db::Database;
use eavstore_model::{Entity, EntityId, Instance, InstanceId, PropertyValue};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::query::{count_instances, load_instances, InstanceFilter};
use crate::sql::{map_constraint, now_millis};
use crate::validation::ValidatedProperties;
use crate::{StoreError, StoreResult};

fn fetch_instance(conn: &Connection, id: InstanceId) -> StoreResult<Instance> {
    load_instances(conn, &InstanceFilter::id(id))?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found("instance", id))
}

fn ensure_same_entity(entity_id: EntityId, properties: &ValidatedProperties) -> StoreResult<()> {
    if properties.entity_id() == entity_id {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "properties were resolved for entity {} but the instance belongs to entity {entity_id}",
            properties.entity_id()
        )))
    }
}

fn duplicate_value() -> StoreError {
    StoreError::Conflict("instance already has a value for this property".to_string())
}

/// Persistent store for instances and their values.
#[derive(Debug, Clone)]
pub struct InstanceStore {
    db: Database,
}

impl InstanceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns every instance with data, property and entity resolved.
    pub fn list(&self) -> StoreResult<Vec<Instance>> {
        let conn = self.db.lock()?;
        Ok(load_instances(&conn, &InstanceFilter::all())?)
    }

    /// Returns the total number of instances.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        Ok(count_instances(&conn)?)
    }

    pub fn find_by_id(&self, id: InstanceId) -> StoreResult<Instance> {
        let conn = self.db.lock()?;
        fetch_instance(&conn, id)
    }

    /// Instances of the entity called `entity_name`. Unknown entities yield
    /// an empty list.
    pub fn get_by_entity(&self, entity_name: &str) -> StoreResult<Vec<Instance>> {
        let conn = self.db.lock()?;
        Ok(load_instances(
            &conn,
            &InstanceFilter::entity_name(entity_name.trim()),
        )?)
    }

    pub fn get_by_entity_id(&self, entity_id: EntityId) -> StoreResult<Vec<Instance>> {
        let conn = self.db.lock()?;
        Ok(load_instances(&conn, &InstanceFilter::entity_id(entity_id))?)
    }

    /// Instances that have, for every predicate, a data row whose property
    /// name and value both match it.
    ///
    /// Predicates match by property name only, so same-named properties of
    /// different entities are all candidates. An empty predicate list
    /// matches every instance.
    pub fn get_by_data(&self, predicates: &[PropertyValue]) -> StoreResult<Vec<Instance>> {
        let conn = self.db.lock()?;
        let instances = load_instances(&conn, &InstanceFilter::matching_all(predicates))?;
        debug!(
            predicates = predicates.len(),
            matched = instances.len(),
            "queried instances by data"
        );
        Ok(instances)
    }

    /// Creates an instance of `entity` with one data row per property.
    pub fn store(
        &self,
        entity: &Entity,
        properties: &ValidatedProperties,
    ) -> StoreResult<Instance> {
        ensure_same_entity(entity.id, properties)?;

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let now = now_millis();
        tx.execute(
            "INSERT INTO instances (entity_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![entity.id.get(), now],
        )
        .map_err(|e| match map_constraint(e, duplicate_value) {
            StoreError::Validation(_) => StoreError::not_found("entity", entity.id),
            other => other,
        })?;
        let id = InstanceId::new(tx.last_insert_rowid());

        {
            let mut insert = tx.prepare(
                "INSERT INTO instance_data (property_id, instance_id, value, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4)",
            )?;
            for (property_id, value) in properties.iter() {
                insert
                    .execute(params![property_id.get(), id.get(), value, now])
                    .map_err(|e| map_constraint(e, duplicate_value))?;
            }
        }

        let instance = fetch_instance(&tx, id)?;
        tx.commit()?;
        debug!(instance_id = %id, entity = %entity.name, values = properties.len(), "created instance");
        Ok(instance)
    }

    /// Upserts one data row per property. Properties absent from the map
    /// keep their current values.
    ///
    /// Only `instance.id` is trusted; the owning entity is read back from
    /// the database and must match the one `properties` was resolved for.
    pub fn update(
        &self,
        instance: &Instance,
        properties: &ValidatedProperties,
    ) -> StoreResult<Instance> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let stored_entity = tx
            .query_row(
                "SELECT entity_id FROM instances WHERE id = ?1",
                params![instance.id.get()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(EntityId::new)
            .ok_or_else(|| StoreError::not_found("instance", instance.id))?;
        ensure_same_entity(stored_entity, properties)?;

        let now = now_millis();
        tx.execute(
            "UPDATE instances SET updated_at = ?1 WHERE id = ?2",
            params![now, instance.id.get()],
        )?;

        {
            let mut upsert = tx.prepare(
                "INSERT INTO instance_data (property_id, instance_id, value, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4) \
                 ON CONFLICT(instance_id, property_id) \
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )?;
            for (property_id, value) in properties.iter() {
                upsert
                    .execute(params![property_id.get(), instance.id.get(), value, now])
                    .map_err(|e| map_constraint(e, duplicate_value))?;
            }
        }

        let updated = fetch_instance(&tx, instance.id)?;
        tx.commit()?;
        debug!(instance_id = %instance.id, values = properties.len(), "updated instance");
        Ok(updated)
    }

    /// Deletes an instance and all of its data rows.
    pub fn destroy(&self, id: InstanceId) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let exists = tx.query_row(
            "SELECT COUNT(*) FROM instances WHERE id = ?1",
            params![id.get()],
            |row| row.get::<_, i64>(0),
        )? > 0;
        if !exists {
            return Err(StoreError::not_found("instance", id));
        }
        let values = tx.execute(
            "DELETE FROM instance_data WHERE instance_id = ?1",
            params![id.get()],
        )?;
        tx.execute("DELETE FROM instances WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        debug!(instance_id = %id, values, "deleted instance");
        Ok(())
    }
}
