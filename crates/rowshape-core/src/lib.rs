//! Core runtime for rowshape: turns an ordered stream of join-flattened rows
//! into typed object graphs through a compiled shape plan, in blocking or
//! suspending mode.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod enumerator;
pub mod error;
pub mod materialize;
pub mod model;
pub mod obs;
pub mod options;
pub mod shape;
pub mod source;
pub mod tracking;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains the vocabulary needed to build a plan and run it.
/// Errors and diagnostics stay in their modules.
///

pub mod prelude {
    pub use crate::{
        enumerator::{AsyncShapedQuery, EnumeratorState, ShapedQuery},
        materialize::Materialized,
        model::{Entity, EntityRef, Navigation, Record, RecordNavigation},
        options::MaterializeOptions,
        shape::{EntityShape, KeySelector, ShapeNode, ShapePlan, ValueBinding},
        source::{AsyncRowSource, RowSource},
        value::{KeyTuple, Value, ValueKind},
    };
}
