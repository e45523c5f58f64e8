//! Shared fixtures for store tests.

#![allow(dead_code)]

use eavstore_model::{Entity, Instance, InstanceId, PropertyValue};
use eavstore_store::{EavStore, ValidationMode};

/// A fresh in-memory store.
pub fn store() -> EavStore {
    EavStore::open_in_memory().unwrap()
}

/// Creates an entity with the given property names.
pub fn entity_with(store: &EavStore, name: &str, properties: &[&str]) -> Entity {
    store
        .entities()
        .create_with_properties(name, properties)
        .unwrap()
}

/// Builds raw `{name, value}` pairs.
pub fn pairs(items: &[(&str, &str)]) -> Vec<PropertyValue> {
    items
        .iter()
        .map(|(name, value)| PropertyValue::new(*name, *value))
        .collect()
}

/// Creates an instance of `entity` from `(name, value)` pairs.
pub fn instance(store: &EavStore, entity: &str, items: &[(&str, &str)]) -> Instance {
    store
        .create_instance(entity, &pairs(items), ValidationMode::Lenient)
        .unwrap()
}

pub fn ids(instances: &[Instance]) -> Vec<InstanceId> {
    instances.iter().map(|i| i.id).collect()
}

/// Row count of one of the four tables.
pub fn table_count(store: &EavStore, table: &str) -> usize {
    match table {
        "entities" => store.entities().count().unwrap(),
        "properties" => store.properties().count().unwrap(),
        "instances" => store.instances().count().unwrap(),
        "instance_data" => store
            .instances()
            .list()
            .unwrap()
            .iter()
            .map(|i| i.data.len())
            .sum(),
        other => panic!("unknown table {other}"),
    }
}
