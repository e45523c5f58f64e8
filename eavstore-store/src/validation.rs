//! Resolution of caller-supplied `{name, value}` pairs against an entity.
//!
//! [`ValidatedProperties`] is only built by
//! [`PropertyStore`](crate::PropertyStore) validation, and it remembers the
//! entity it was resolved against. The instance store refuses a map resolved
//! for a different entity, so every stored value belongs to a property of
//! the instance's own entity.

use std::collections::BTreeMap;

use eavstore_model::{EntityId, PropertyId};

use crate::{StoreError, StoreResult};

/// How unresolvable property names are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Drop unknown names and report them on the result.
    #[default]
    Lenient,
    /// Fail on the first batch containing any unknown name.
    Strict,
}

/// Property values keyed by property id, all belonging to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProperties {
    entity_id: EntityId,
    values: BTreeMap<PropertyId, String>,
    unresolved: Vec<String>,
}

impl ValidatedProperties {
    pub(crate) fn new(
        entity_id: EntityId,
        values: BTreeMap<PropertyId, String>,
        unresolved: Vec<String>,
    ) -> Self {
        Self {
            entity_id,
            values,
            unresolved,
        }
    }

    /// The entity every property in this map belongs to.
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, property_id: PropertyId) -> Option<&str> {
        self.values.get(&property_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &str)> {
        self.values.iter().map(|(id, v)| (*id, v.as_str()))
    }

    /// Names that did not match any property of the entity.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Turns an empty map into [`StoreError::NoValidProperties`].
    pub fn require_any(self) -> StoreResult<Self> {
        if self.is_empty() {
            Err(StoreError::NoValidProperties)
        } else {
            Ok(self)
        }
    }
}
