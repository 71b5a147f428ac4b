//! Runtime entity model used by stitching.
//!
//! Entities are shared-ownership handles (`EntityRef`). Navigations carry the
//! accessor closures resolved once when a shape plan is built; nothing here
//! looks members up per row.

pub mod entity;
pub mod navigation;
pub mod record;


use thiserror::Error as ThisError;

// re-exports
pub use entity::{Entity, EntityConstructor, EntityRef, downcast, same_entity};
pub use navigation::{Navigation, NavigationAccessor, NavigationKind};
pub use record::{Record, RecordNavigation};

///
/// ModelError
///
/// Failures raised by entity constructors and navigation accessors.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("entity '{entity_path}' expects {expected} values, found {found}")]
    Arity {
        entity_path: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("entity '{entity_path}' could not be constructed: {message}")]
    Construct {
        entity_path: &'static str,
        message: String,
    },

    #[error("navigation '{navigation}' cannot be applied to entity '{entity_path}'")]
    EntityTypeMismatch {
        navigation: &'static str,
        entity_path: &'static str,
    },

    #[error("navigation '{navigation}' is a {actual} navigation on '{entity_path}'")]
    SlotKindMismatch {
        navigation: &'static str,
        entity_path: &'static str,
        actual: NavigationKind,
    },
}
