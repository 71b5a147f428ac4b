use crate::{model::ModelError, value::Value};
use std::{any::Any, fmt::Debug, sync::Arc};

///
/// Entity
///
/// Object produced by an entity shape node. Implementations use interior
/// mutability for their navigation slots so fixup can run through shared
/// handles.
///

pub trait Entity: Any + Debug + Send + Sync {
    /// Path of the entity type, matched against navigation metadata.
    fn entity_path(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a materialized entity.
pub type EntityRef = Arc<dyn Entity>;

/// Downcast an entity handle to its concrete type.
#[must_use]
pub fn downcast<T: Entity>(entity: &EntityRef) -> Option<&T> {
    entity.as_any().downcast_ref::<T>()
}

/// Identity comparison between two handles (same instance).
#[must_use]
pub fn same_entity(left: &EntityRef, right: &EntityRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}

///
/// EntityConstructor
///
/// Builds one entity from the values of its bound columns, in binding order.
///

pub trait EntityConstructor: Send + Sync {
    fn construct(&self, values: Vec<Value>) -> Result<EntityRef, ModelError>;
}

impl<F> EntityConstructor for F
where
    F: Fn(Vec<Value>) -> Result<EntityRef, ModelError> + Send + Sync,
{
    fn construct(&self, values: Vec<Value>) -> Result<EntityRef, ModelError> {
        self(values)
    }
}
