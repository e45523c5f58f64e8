//! Core EAV model for EAVStore.
//!
//! Defines the plain data types every layer shares:
//! - [`Entity`]: a user-defined record type, with its property definitions
//! - [`Property`]: a named attribute owned by exactly one entity
//! - [`Instance`]: one record of an entity, with its values resolved
//! - [`InstanceData`]: the value bound to one (instance, property) pair
//! - [`PropertyValue`]: a raw `{name, value}` pair used for writes and queries
//!
//! These types are produced by the store layer and serialized as-is by the
//! HTTP layer. They carry no behaviour beyond small lookup helpers.

mod entity;
mod ids;
mod instance;
mod property;
mod value;

pub use entity::{Entity, EntityDetail, EntityRef};
pub use ids::{EntityId, InstanceDataId, InstanceId, PropertyId};
pub use instance::{Instance, InstanceData};
pub use property::{Property, PropertyDetail, PropertyRef};
pub use value::PropertyValue;
