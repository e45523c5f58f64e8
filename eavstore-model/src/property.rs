use serde::{Deserialize, Serialize};

use crate::{EntityId, EntityRef, PropertyId};

/// A named attribute defined on one entity.
///
/// Names are unique per entity but not globally: two entities may each
/// define `color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub entity_id: EntityId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Property as it appears inside a resolved instance-data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub id: PropertyId,
    pub name: String,
    pub entity: EntityRef,
}

/// A property with its owning entity embedded.
///
/// Lookups embed the `{id, name}` [`EntityRef`]; writes embed the full
/// [`Entity`](crate::Entity) so the caller sees the sibling properties too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDetail<E = EntityRef> {
    #[serde(flatten)]
    pub property: Property,
    pub entity: E,
}
