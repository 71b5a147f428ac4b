//! Shape-tree evaluation against the current row.
//!
//! `Materializer` walks a `ShapeNode` tree: value and entity nodes read the
//! current row and never advance; include nodes evaluate their owner and
//! then stitch related rows onto it, which may consume further rows.

mod coordinator;
mod reader;
mod stitch;


use crate::{
    error::MaterializeError,
    model::EntityRef,
    shape::{EntityShape, ShapeNode},
    source::{RowAccess, RowColumns},
    tracking::ChangeTracker,
    value::Value,
};
use futures::future::BoxFuture;

// re-exports
pub use coordinator::ResultCoordinator;
pub use reader::{ColumnReadError, ColumnReadReason, read_key, read_value};

///
/// Materialized
///
/// Result of evaluating one shape node on one row.
///

#[derive(Clone, Debug)]
pub enum Materialized {
    /// Entity node whose null key read NULL (outer join without a match).
    Null,
    Value(Value),
    Entity(EntityRef),
}

impl Materialized {
    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Null | Self::Value(_) => None,
        }
    }

    #[must_use]
    pub fn into_entity(self) -> Option<EntityRef> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Null | Self::Value(_) => None,
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Null | Self::Entity(_) => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

///
/// Materializer
///
/// Stateless evaluator for one enumeration. Mutable state lives in the
/// `ResultCoordinator` passed down the tree.
///

#[derive(Clone, Copy)]
pub(crate) struct Materializer<'t> {
    detailed_errors: bool,
    tracker: Option<&'t dyn ChangeTracker>,
}

impl<'t> Materializer<'t> {
    pub(crate) const fn new(detailed_errors: bool, tracker: Option<&'t dyn ChangeTracker>) -> Self {
        Self {
            detailed_errors,
            tracker,
        }
    }

    /// Evaluate `node` on the current row.
    ///
    /// Boxed so include nodes can recurse; the same future drives both the
    /// blocking and the suspending enumerator.
    pub(crate) fn materialize<'f>(
        &'f self,
        node: &'f ShapeNode,
        access: &'f mut dyn RowAccess,
        coordinator: &'f mut ResultCoordinator,
    ) -> BoxFuture<'f, Result<Materialized, MaterializeError>> {
        Box::pin(async move {
            match node {
                ShapeNode::Value(binding) => {
                    let value = read_value(access.columns(), binding, self.detailed_errors)?;

                    Ok(Materialized::Value(value))
                }
                ShapeNode::Entity(shape) => self.construct(access.columns(), shape),
                ShapeNode::ReferenceInclude(include) => {
                    let owner = self.materialize(&include.owner, access, coordinator).await?;
                    self.stitch_reference(include, owner.as_entity(), access, coordinator)
                        .await?;

                    Ok(owner)
                }
                ShapeNode::CollectionInclude(include) => {
                    let owner = self.materialize(&include.owner, access, coordinator).await?;
                    self.stitch_collection(include, owner.as_entity(), access, coordinator)
                        .await?;

                    Ok(owner)
                }
            }
        })
    }

    /// Build one entity from the current row. Never advances.
    fn construct(
        &self,
        row: &dyn RowColumns,
        shape: &EntityShape,
    ) -> Result<Materialized, MaterializeError> {
        if let Some(key) = shape.null_key.and_then(|index| shape.bindings.get(index)) {
            let is_null = row.is_null(key.column).map_err(|err| ColumnReadError {
                column: key.column,
                target: key.target,
                reason: ColumnReadReason::Source(err),
            })?;

            if is_null {
                return Ok(Materialized::Null);
            }
        }

        let values = shape
            .bindings
            .iter()
            .map(|binding| read_value(row, binding, self.detailed_errors))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Materialized::Entity(shape.constructor.construct(values)?))
    }
}
