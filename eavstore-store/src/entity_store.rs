//! Entity definitions, always materialized with their properties.

use std::collections::HashMap;

use eavstore_db::Database;
use eavstore_model::{Entity, EntityId, Property};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::property_store::{insert_property, select_properties};
use crate::sql::{check_name, map_constraint, now_millis};
use crate::{StoreError, StoreResult};

const ENTITY_COLUMNS: &str = "id, name, created_at, updated_at";

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: EntityId::new(row.get(0)?),
        name: row.get(1)?,
        properties: Vec::new(),
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn with_properties(conn: &Connection, mut entity: Entity) -> rusqlite::Result<Entity> {
    entity.properties = select_properties(conn, "WHERE entity_id = ?1", params![entity.id.get()])?;
    Ok(entity)
}

pub(crate) fn fetch_entity(conn: &Connection, id: EntityId) -> StoreResult<Entity> {
    let entity = conn
        .query_row(
            &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1"),
            params![id.get()],
            entity_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("entity", id))?;
    Ok(with_properties(conn, entity)?)
}

pub(crate) fn lookup_entity(conn: &Connection, name: &str) -> StoreResult<Option<Entity>> {
    let entity = conn
        .query_row(
            &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE name = ?1"),
            params![name],
            entity_from_row,
        )
        .optional()?;
    match entity {
        Some(entity) => Ok(Some(with_properties(conn, entity)?)),
        None => Ok(None),
    }
}

fn duplicate_entity(name: &str) -> StoreError {
    StoreError::Conflict(format!("entity '{name}' already exists"))
}

/// Persistent store for entity definitions.
#[derive(Debug, Clone)]
pub struct EntityStore {
    db: Database,
}

impl EntityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns every entity with its properties attached.
    pub fn list(&self) -> StoreResult<Vec<Entity>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {ENTITY_COLUMNS} FROM entities ORDER BY id"))?;
        let mut entities = stmt
            .query_map([], entity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_entity: HashMap<EntityId, Vec<Property>> = HashMap::new();
        for property in select_properties(&conn, "", [])? {
            by_entity.entry(property.entity_id).or_default().push(property);
        }
        for entity in &mut entities {
            entity.properties = by_entity.remove(&entity.id).unwrap_or_default();
        }
        Ok(entities)
    }

    /// Returns the total number of entities.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Exact-match lookup by name. A missing entity is `None`, not an error.
    pub fn get_by_name(&self, name: &str) -> StoreResult<Option<Entity>> {
        let conn = self.db.lock()?;
        lookup_entity(&conn, name.trim())
    }

    pub fn find(&self, id: EntityId) -> StoreResult<Entity> {
        let conn = self.db.lock()?;
        fetch_entity(&conn, id)
    }

    /// Creates an entity with no properties.
    pub fn create(&self, name: &str) -> StoreResult<Entity> {
        self.create_with_properties(name, &[] as &[&str])
    }

    /// Creates an entity and its initial property definitions in one
    /// transaction. Nothing is written if any property name is rejected.
    pub fn create_with_properties<S: AsRef<str>>(
        &self,
        name: &str,
        property_names: &[S],
    ) -> StoreResult<Entity> {
        let name = check_name("entity", name)?;
        let property_names = property_names
            .iter()
            .map(|p| check_name("property", p.as_ref()))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let now = now_millis();
        tx.execute(
            "INSERT INTO entities (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )
        .map_err(|e| map_constraint(e, || duplicate_entity(&name)))?;
        let id = EntityId::new(tx.last_insert_rowid());

        let mut properties = Vec::with_capacity(property_names.len());
        for property_name in &property_names {
            properties.push(insert_property(&tx, id, property_name)?);
        }
        tx.commit()?;

        debug!(entity_id = %id, name = %name, properties = properties.len(), "created entity");
        Ok(Entity {
            id,
            name,
            properties,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&self, id: EntityId, name: &str) -> StoreResult<Entity> {
        let name = check_name("entity", name)?;
        let conn = self.db.lock()?;
        let changed = conn
            .execute(
                "UPDATE entities SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now_millis(), id.get()],
            )
            .map_err(|e| map_constraint(e, || duplicate_entity(&name)))?;
        if changed == 0 {
            return Err(StoreError::not_found("entity", id));
        }
        debug!(entity_id = %id, name = %name, "renamed entity");
        fetch_entity(&conn, id)
    }

    /// Deletes an entity together with its properties, instances and
    /// instance data.
    pub fn delete(&self, id: EntityId) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM entities WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Err(StoreError::not_found("entity", id));
        }
        tx.commit()?;
        debug!(entity_id = %id, "deleted entity");
        Ok(())
    }
}
