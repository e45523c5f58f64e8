//! Instance selection and materialization.
//!
//! An [`InstanceFilter`] is an SQL condition over `instances` (aliased `i`)
//! plus its positional parameters. [`load_instances`] runs the filter twice:
//! once for the instance rows and once for their data rows joined to
//! property and entity, then stitches the two into fully-resolved
//! [`Instance`] values.

use std::collections::HashMap;

use eavstore_model::{
    EntityId, EntityRef, Instance, InstanceData, InstanceDataId, InstanceId, PropertyId,
    PropertyRef, PropertyValue,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// One "has a data row with this name and value" condition.
const PREDICATE_EXISTS: &str = "EXISTS (\
    SELECT 1 FROM instance_data qd \
    JOIN properties qp ON qp.id = qd.property_id \
    WHERE qd.instance_id = i.id AND qp.name = ? AND qd.value = ?)";

#[derive(Debug, Clone)]
pub(crate) struct InstanceFilter {
    condition: String,
    params: Vec<Value>,
}

impl InstanceFilter {
    pub(crate) fn all() -> Self {
        Self {
            condition: "1 = 1".to_string(),
            params: Vec::new(),
        }
    }

    pub(crate) fn id(id: InstanceId) -> Self {
        Self {
            condition: "i.id = ?".to_string(),
            params: vec![Value::Integer(id.get())],
        }
    }

    pub(crate) fn entity_id(entity_id: EntityId) -> Self {
        Self {
            condition: "i.entity_id = ?".to_string(),
            params: vec![Value::Integer(entity_id.get())],
        }
    }

    pub(crate) fn entity_name(name: &str) -> Self {
        Self {
            condition: "i.entity_id IN (SELECT qe.id FROM entities qe WHERE qe.name = ?)".to_string(),
            params: vec![Value::Text(name.to_string())],
        }
    }

    /// Instances satisfying every predicate. Each predicate is its own
    /// `EXISTS` sub-query, so different predicates may match different data
    /// rows of the same instance. No predicates selects every instance.
    pub(crate) fn matching_all(predicates: &[PropertyValue]) -> Self {
        if predicates.is_empty() {
            return Self::all();
        }
        let condition = vec![PREDICATE_EXISTS; predicates.len()].join(" AND ");
        let params = predicates
            .iter()
            .flat_map(|p| [Value::Text(p.name.clone()), Value::Text(p.value.clone())])
            .collect();
        Self { condition, params }
    }
}

fn instance_from_row(row: &Row<'_>) -> rusqlite::Result<Instance> {
    Ok(Instance {
        id: InstanceId::new(row.get(0)?),
        entity: EntityRef {
            id: EntityId::new(row.get(1)?),
            name: row.get(2)?,
        },
        data: Vec::new(),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn data_from_row(row: &Row<'_>) -> rusqlite::Result<InstanceData> {
    Ok(InstanceData {
        id: InstanceDataId::new(row.get(0)?),
        instance_id: InstanceId::new(row.get(1)?),
        value: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        property: PropertyRef {
            id: PropertyId::new(row.get(5)?),
            name: row.get(6)?,
            entity: EntityRef {
                id: EntityId::new(row.get(7)?),
                name: row.get(8)?,
            },
        },
    })
}

/// Loads the instances selected by `filter`, ordered by id, with data rows
/// ordered by id.
pub(crate) fn load_instances(
    conn: &Connection,
    filter: &InstanceFilter,
) -> rusqlite::Result<Vec<Instance>> {
    let sql = format!(
        "SELECT i.id, i.entity_id, e.name, i.created_at, i.updated_at \
         FROM instances i JOIN entities e ON e.id = i.entity_id \
         WHERE {} ORDER BY i.id",
        filter.condition
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut instances = stmt
        .query_map(params_from_iter(filter.params.iter()), instance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    if instances.is_empty() {
        return Ok(instances);
    }

    let index: HashMap<InstanceId, usize> = instances
        .iter()
        .enumerate()
        .map(|(pos, instance)| (instance.id, pos))
        .collect();

    let sql = format!(
        "SELECT d.id, d.instance_id, d.value, d.created_at, d.updated_at, \
                p.id, p.name, pe.id, pe.name \
         FROM instance_data d \
         JOIN instances i ON i.id = d.instance_id \
         JOIN properties p ON p.id = d.property_id \
         JOIN entities pe ON pe.id = p.entity_id \
         WHERE {} ORDER BY d.instance_id, d.id",
        filter.condition
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(filter.params.iter()), data_from_row)?;
    for row in rows {
        let data = row?;
        if let Some(&pos) = index.get(&data.instance_id) {
            instances[pos].data.push(data);
        }
    }
    Ok(instances)
}

pub(crate) fn count_instances(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM instances", [], |row| row.get(0))?;
    Ok(count as usize)
}
