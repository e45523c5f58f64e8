use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EntityId, EntityRef, InstanceDataId, InstanceId, PropertyId, PropertyRef};

/// One concrete record of an entity, with every value fully resolved down
/// to its property and that property's entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub entity: EntityRef,
    pub data: Vec<InstanceData>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Instance {
    pub fn entity_id(&self) -> EntityId {
        self.entity.id
    }

    /// Returns the value stored for the named property, if any.
    pub fn value(&self, property_name: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|d| d.property.name == property_name)
            .map(|d| d.value.as_str())
    }

    /// Returns the value stored for the given property id, if any.
    pub fn value_of(&self, property_id: PropertyId) -> Option<&str> {
        self.data
            .iter()
            .find(|d| d.property.id == property_id)
            .map(|d| d.value.as_str())
    }

    /// All `(property name, value)` pairs of this instance.
    pub fn values(&self) -> BTreeMap<&str, &str> {
        self.data
            .iter()
            .map(|d| (d.property.name.as_str(), d.value.as_str()))
            .collect()
    }
}

/// The value bound to one (instance, property) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceData {
    pub id: InstanceDataId,
    pub instance_id: InstanceId,
    pub property: PropertyRef,
    pub value: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InstanceData {
    pub fn property_id(&self) -> PropertyId {
        self.property.id
    }
}
