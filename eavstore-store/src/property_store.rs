//! Property definitions.

use std::collections::BTreeMap;

use eavstore_db::Database;
use eavstore_model::{
    Entity, EntityId, EntityRef, Property, PropertyDetail, PropertyId, PropertyValue,
};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tracing::{debug, warn};

use crate::entity_store::fetch_entity;
use crate::sql::{check_name, map_constraint, now_millis};
use crate::validation::{ValidatedProperties, ValidationMode};
use crate::{StoreError, StoreResult};

const PROPERTY_COLUMNS: &str = "id, name, entity_id, created_at, updated_at";

/// Property columns followed by the owning entity's name, over
/// `properties p JOIN entities e`.
const DETAIL_COLUMNS: &str = "p.id, p.name, p.entity_id, p.created_at, p.updated_at, e.name";

fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: PropertyId::new(row.get(0)?),
        name: row.get(1)?,
        entity_id: EntityId::new(row.get(2)?),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyDetail> {
    let property = property_from_row(row)?;
    let entity = EntityRef {
        id: property.entity_id,
        name: row.get(5)?,
    };
    Ok(PropertyDetail { property, entity })
}

fn select_details<P: Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> rusqlite::Result<Vec<PropertyDetail>> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM properties p \
         JOIN entities e ON e.id = p.entity_id {clause} ORDER BY p.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, detail_from_row)?;
    rows.collect()
}

/// Runs `SELECT` over `properties` with an optional trailing clause.
pub(crate) fn select_properties<P: Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> rusqlite::Result<Vec<Property>> {
    let sql = format!("SELECT {PROPERTY_COLUMNS} FROM properties {clause} ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, property_from_row)?;
    rows.collect()
}

fn lookup_property(
    conn: &Connection,
    entity_id: EntityId,
    name: &str,
) -> rusqlite::Result<Option<Property>> {
    conn.query_row(
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE entity_id = ?1 AND name = ?2"),
        params![entity_id.get(), name],
        property_from_row,
    )
    .optional()
}

fn fetch_property(conn: &Connection, id: PropertyId) -> StoreResult<Property> {
    conn.query_row(
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
        params![id.get()],
        property_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("property", id))
}

/// Inserts one property row. Shared with entity creation so both paths
/// report duplicate names the same way.
pub(crate) fn insert_property(
    conn: &Connection,
    entity_id: EntityId,
    name: &str,
) -> StoreResult<Property> {
    let now = now_millis();
    conn.execute(
        "INSERT INTO properties (name, entity_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![name, entity_id.get(), now],
    )
    .map_err(|e| map_constraint(e, || duplicate_property(entity_id, name)))?;
    Ok(Property {
        id: PropertyId::new(conn.last_insert_rowid()),
        name: name.to_string(),
        entity_id,
        created_at: now,
        updated_at: now,
    })
}

fn duplicate_property(entity_id: EntityId, name: &str) -> StoreError {
    StoreError::Conflict(format!(
        "entity {entity_id} already has a property named '{name}'"
    ))
}

/// Persistent store for property definitions.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    db: Database,
}

impl PropertyStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns every property of every entity.
    pub fn list(&self) -> StoreResult<Vec<Property>> {
        let conn = self.db.lock()?;
        Ok(select_properties(&conn, "", [])?)
    }

    /// Returns the total number of properties.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns the properties defined on one entity.
    pub fn list_for_entity(&self, entity_id: EntityId) -> StoreResult<Vec<Property>> {
        let conn = self.db.lock()?;
        Ok(select_properties(
            &conn,
            "WHERE entity_id = ?1",
            params![entity_id.get()],
        )?)
    }

    pub fn find(&self, id: PropertyId) -> StoreResult<Property> {
        let conn = self.db.lock()?;
        fetch_property(&conn, id)
    }

    /// Like [`find`](Self::find), with the owning entity's `{id, name}`
    /// joined in.
    pub fn find_with_entity(&self, id: PropertyId) -> StoreResult<PropertyDetail> {
        let conn = self.db.lock()?;
        select_details(&conn, "WHERE p.id = ?1", params![id.get()])?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("property", id))
    }

    /// The property together with its whole owning entity, sibling
    /// properties included. Read under one lock.
    pub fn find_with_owner(&self, id: PropertyId) -> StoreResult<PropertyDetail<Entity>> {
        let conn = self.db.lock()?;
        let property = fetch_property(&conn, id)?;
        let entity = fetch_entity(&conn, property.entity_id)?;
        Ok(PropertyDetail { property, entity })
    }

    /// Returns all properties with this name, across all entities.
    pub fn find_by_name(&self, name: &str) -> StoreResult<Vec<Property>> {
        let conn = self.db.lock()?;
        Ok(select_properties(&conn, "WHERE name = ?1", params![name.trim()])?)
    }

    /// [`find_by_name`](Self::find_by_name) with each owner embedded.
    pub fn find_by_name_with_entity(&self, name: &str) -> StoreResult<Vec<PropertyDetail>> {
        let conn = self.db.lock()?;
        Ok(select_details(&conn, "WHERE p.name = ?1", params![name.trim()])?)
    }

    /// Scoped lookup: the property called `name` on entity `entity_id`.
    pub fn find_by_entity_and_name(
        &self,
        entity_id: EntityId,
        name: &str,
    ) -> StoreResult<Option<Property>> {
        let conn = self.db.lock()?;
        Ok(lookup_property(&conn, entity_id, name.trim())?)
    }

    /// Defines a new property on an existing entity.
    pub fn store(&self, name: &str, entity_id: EntityId) -> StoreResult<Property> {
        let name = check_name("property", name)?;
        let conn = self.db.lock()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM entities WHERE id = ?1",
                params![entity_id.get()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::not_found("entity", entity_id));
        }
        let property = insert_property(&conn, entity_id, &name)?;
        debug!(property_id = %property.id, %entity_id, name = %property.name, "created property");
        Ok(property)
    }

    pub fn rename(&self, id: PropertyId, name: &str) -> StoreResult<Property> {
        let name = check_name("property", name)?;
        let conn = self.db.lock()?;
        let current = fetch_property(&conn, id)?;
        conn.execute(
            "UPDATE properties SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, now_millis(), id.get()],
        )
        .map_err(|e| map_constraint(e, || duplicate_property(current.entity_id, &name)))?;
        debug!(property_id = %id, from = %current.name, to = %name, "renamed property");
        fetch_property(&conn, id)
    }

    /// Deletes a property and, by cascade, every value stored for it.
    pub fn destroy(&self, id: PropertyId) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM properties WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Err(StoreError::not_found("property", id));
        }
        tx.commit()?;
        debug!(property_id = %id, "deleted property");
        Ok(())
    }

    /// Resolves each pair via the entity-scoped name lookup.
    ///
    /// Pairs whose name does not resolve are dropped and listed in
    /// [`ValidatedProperties::unresolved`]. When a name appears twice the
    /// last value wins. The result may be empty.
    pub fn validate_properties(
        &self,
        entity: &Entity,
        raw: &[PropertyValue],
    ) -> StoreResult<ValidatedProperties> {
        let validated = self.resolve(entity, raw)?;
        if !validated.unresolved().is_empty() {
            warn!(
                entity = %entity.name,
                unresolved = ?validated.unresolved(),
                "dropping unknown properties"
            );
        }
        Ok(validated)
    }

    /// Like [`validate_properties`](Self::validate_properties) but fails with
    /// a validation error naming every unknown property.
    pub fn validate_properties_strict(
        &self,
        entity: &Entity,
        raw: &[PropertyValue],
    ) -> StoreResult<ValidatedProperties> {
        let validated = self.resolve(entity, raw)?;
        if validated.unresolved().is_empty() {
            Ok(validated)
        } else {
            Err(StoreError::Validation(format!(
                "unknown properties for entity '{}': {}",
                entity.name,
                validated.unresolved().join(", ")
            )))
        }
    }

    /// Dispatches on `mode`.
    pub fn validate_with(
        &self,
        mode: ValidationMode,
        entity: &Entity,
        raw: &[PropertyValue],
    ) -> StoreResult<ValidatedProperties> {
        match mode {
            ValidationMode::Lenient => self.validate_properties(entity, raw),
            ValidationMode::Strict => self.validate_properties_strict(entity, raw),
        }
    }

    fn resolve(&self, entity: &Entity, raw: &[PropertyValue]) -> StoreResult<ValidatedProperties> {
        let conn = self.db.lock()?;
        let mut values = BTreeMap::new();
        let mut unresolved = Vec::new();
        for pair in raw {
            let name = pair.name.trim();
            match lookup_property(&conn, entity.id, name)? {
                Some(property) => {
                    values.insert(property.id, pair.value.clone());
                }
                None => unresolved.push(name.to_string()),
            }
        }
        Ok(ValidatedProperties::new(entity.id, values, unresolved))
    }
}
