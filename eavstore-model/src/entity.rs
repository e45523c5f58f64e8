use serde::{Deserialize, Serialize};

use crate::{EntityId, Instance, Property};

/// A user-defined record type.
///
/// Entities are always materialized together with their property
/// definitions, so callers never need a second round-trip to learn which
/// attributes an entity accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub properties: Vec<Property>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity {
    /// Looks up one of this entity's properties by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of all properties, in storage order.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// The `{id, name}` pair embedded in nested views.
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Minimal entity reference carried inside instances and instance data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}

/// An entity together with every instance of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDetail {
    #[serde(flatten)]
    pub entity: Entity,
    pub instances: Vec<Instance>,
}
