use crate::{
    model::NavigationKind,
    shape::{ShapeFingerprint, ShapeNode, explain, fingerprint, validate},
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// PlanError
///
/// Structural problems in a shape tree, raised once when the plan is
/// compiled or when an enumeration binds it to a cursor.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    /// A plan column index is past the end of the opened cursor.
    #[error("plan reads column {column} but the cursor has {column_count} columns")]
    ColumnOutOfRange { column: usize, column_count: usize },

    /// A collection include has no outer or inner key columns.
    #[error("collection include '{navigation}' has an empty {side} key")]
    EmptyKeySelector {
        navigation: String,
        side: &'static str,
    },

    /// An include is applied to an owner whose evaluation already consumed
    /// rows for a collection, so it would read the wrong row.
    #[error("include '{navigation}' is applied after a collection include on the same owner")]
    IncludeAfterCollection { navigation: String },

    #[error("include '{navigation}' owner does not produce an entity")]
    IncludeOwnerNotEntity { navigation: String },

    #[error("include '{navigation}' related node does not produce an entity")]
    IncludeRelatedNotEntity { navigation: String },

    #[error("inverse '{inverse}' of '{navigation}' does not point back at the owner")]
    InverseMismatch { navigation: String, inverse: String },

    #[error("navigation '{navigation}' is a {found}, expected a {expected}")]
    NavigationKindMismatch {
        navigation: String,
        expected: NavigationKind,
        found: NavigationKind,
    },

    #[error("navigation '{navigation}' is not declared on owner entity '{owner}'")]
    NavigationOwnerMismatch { navigation: String, owner: String },

    #[error("navigation '{navigation}' targets a different entity than '{related}'")]
    NavigationTargetMismatch { navigation: String, related: String },

    #[error("entity '{entity_path}' null key {index} is out of range ({bindings} bindings)")]
    NullKeyOutOfRange {
        entity_path: String,
        index: usize,
        bindings: usize,
    },

    /// Tracked materialization was requested without a change tracker.
    #[error("tracked materialization requires a change tracker")]
    TrackerRequired,
}

///
/// ShapePlan
///
/// Compiled, immutable shape tree. Cloning shares the tree, so one plan can
/// serve many concurrent enumerations.
///

#[derive(Clone, Debug)]
pub struct ShapePlan {
    inner: Arc<PlanInner>,
}

#[derive(Debug)]
struct PlanInner {
    root: ShapeNode,
    fingerprint: ShapeFingerprint,
    required_columns: usize,
}

impl ShapePlan {
    /// Validate `root` and freeze it into a reusable plan.
    pub fn compile(root: ShapeNode) -> Result<Self, PlanError> {
        validate::validate_node(&root)?;

        let required_columns = validate::max_column(&root).map_or(0, |column| column + 1);
        let fingerprint = fingerprint::fingerprint(&root);

        Ok(Self {
            inner: Arc::new(PlanInner {
                root,
                fingerprint,
                required_columns,
            }),
        })
    }

    #[must_use]
    pub fn root(&self) -> &ShapeNode {
        &self.inner.root
    }

    #[must_use]
    pub fn fingerprint(&self) -> ShapeFingerprint {
        self.inner.fingerprint
    }

    /// Minimum cursor width this plan reads from.
    #[must_use]
    pub fn required_columns(&self) -> usize {
        self.inner.required_columns
    }

    /// Check every bound column against an opened cursor's width.
    pub fn validate_columns(&self, column_count: usize) -> Result<(), PlanError> {
        if self.inner.required_columns > column_count {
            return Err(PlanError::ColumnOutOfRange {
                column: self.inner.required_columns - 1,
                column_count,
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn explain(&self) -> String {
        explain::render(&self.inner.root)
    }
}
