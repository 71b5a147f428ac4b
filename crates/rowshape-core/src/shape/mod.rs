//! Shape plans: the immutable description of how row columns become objects.
//!
//! A `ShapeNode` tree is built once per distinct query shape by the planner
//! that produced the row source, compiled into a `ShapePlan`, and then shared
//! read-only by every enumeration of that shape.

mod convert;
mod explain;
mod fingerprint;
mod plan;
mod validate;


use crate::{
    model::{EntityConstructor, Navigation},
    value::{TargetType, ValueKind},
};
use std::{fmt, sync::Arc};

// re-exports
pub use convert::{BoolFromInt, ConvertError, FnConverter, ValueConverter};
pub use fingerprint::ShapeFingerprint;
pub use plan::{PlanError, ShapePlan};

///
/// ValueBinding
///
/// One scalar leaf: the column it reads, whether the column may be NULL,
/// the optional provider converter, and the logical target type.
///

#[derive(Clone)]
pub struct ValueBinding {
    pub column: usize,
    pub nullable: bool,
    pub converter: Option<Arc<dyn ValueConverter>>,
    pub target: TargetType,
}

impl ValueBinding {
    /// Non-nullable column read directly as `kind`.
    #[must_use]
    pub const fn new(column: usize, kind: ValueKind) -> Self {
        Self {
            column,
            nullable: false,
            converter: None,
            target: TargetType::required(kind),
        }
    }

    /// Nullable column whose NULL surfaces as `Value::Null`.
    #[must_use]
    pub const fn optional(column: usize, kind: ValueKind) -> Self {
        Self {
            column,
            nullable: true,
            converter: None,
            target: TargetType::nullable(kind),
        }
    }

    /// Nullable column; NULL yields the target's default value.
    #[must_use]
    pub const fn nullable_column(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Kind the cursor is asked to produce for this column.
    #[must_use]
    pub fn provider_kind(&self) -> ValueKind {
        self.converter
            .as_ref()
            .map_or(self.target.kind, |converter| converter.provider_kind())
    }
}

impl fmt::Debug for ValueBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueBinding")
            .field("column", &self.column)
            .field("nullable", &self.nullable)
            .field("converter", &self.converter.as_ref().map(|c| c.provider_kind()))
            .field("target", &self.target)
            .finish()
    }
}

///
/// KeySelector
///
/// Columns that make up an outer or inner key tuple.
///

#[derive(Clone, Debug)]
pub struct KeySelector {
    pub columns: Vec<ValueBinding>,
}

impl KeySelector {
    #[must_use]
    pub const fn new(columns: Vec<ValueBinding>) -> Self {
        Self { columns }
    }

    /// Single-column key.
    #[must_use]
    pub fn column(column: usize, kind: ValueKind) -> Self {
        Self::new(vec![ValueBinding::new(column, kind)])
    }

    /// Single nullable column key (the related side of an outer join).
    #[must_use]
    pub fn optional_column(column: usize, kind: ValueKind) -> Self {
        Self::new(vec![ValueBinding::optional(column, kind)])
    }
}

///
/// EntityShape
///
/// Builds one entity per row from its bound columns. Column indices are
/// fixed when the plan is built. When `null_key` names a binding whose
/// column reads NULL, the node yields no entity (outer join without match).
///

#[derive(Clone)]
pub struct EntityShape {
    pub entity_path: &'static str,
    pub bindings: Vec<ValueBinding>,
    pub constructor: Arc<dyn EntityConstructor>,
    pub null_key: Option<usize>,
}

impl EntityShape {
    #[must_use]
    pub fn new(
        entity_path: &'static str,
        bindings: Vec<ValueBinding>,
        constructor: Arc<dyn EntityConstructor>,
    ) -> Self {
        Self {
            entity_path,
            bindings,
            constructor,
            null_key: None,
        }
    }

    /// Yield no entity when the binding at `index` reads NULL.
    #[must_use]
    pub const fn null_when(mut self, index: usize) -> Self {
        self.null_key = Some(index);
        self
    }
}

impl fmt::Debug for EntityShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityShape")
            .field("entity_path", &self.entity_path)
            .field("bindings", &self.bindings)
            .field("null_key", &self.null_key)
            .finish_non_exhaustive()
    }
}

///
/// ReferenceInclude
///

#[derive(Clone, Debug)]
pub struct ReferenceInclude {
    pub owner: Box<ShapeNode>,
    pub related: Box<ShapeNode>,
    pub navigation: Navigation,
    pub inverse: Option<Navigation>,
}

///
/// CollectionInclude
///
/// Related rows for one owner are contiguous in the stream and sorted by
/// `(outer_key, inner_key)`. That ordering comes from the upstream planner
/// and is an unchecked precondition here.
///

#[derive(Clone, Debug)]
pub struct CollectionInclude {
    pub owner: Box<ShapeNode>,
    pub related: Box<ShapeNode>,
    pub navigation: Navigation,
    pub inverse: Option<Navigation>,
    pub outer_key: KeySelector,
    pub inner_key: KeySelector,
}

///
/// ShapeNode
///
/// Evaluating an include node evaluates its owner, stitches the related
/// side onto it, and yields the owner.
///

#[derive(Clone, Debug)]
pub enum ShapeNode {
    Value(ValueBinding),
    Entity(EntityShape),
    ReferenceInclude(ReferenceInclude),
    CollectionInclude(CollectionInclude),
}

impl ShapeNode {
    #[must_use]
    pub const fn value(binding: ValueBinding) -> Self {
        Self::Value(binding)
    }

    #[must_use]
    pub const fn entity(shape: EntityShape) -> Self {
        Self::Entity(shape)
    }

    /// Wrap `self` as the owner of a one-to-one include.
    #[must_use]
    pub fn include_reference(
        self,
        related: Self,
        navigation: Navigation,
        inverse: Option<Navigation>,
    ) -> Self {
        Self::ReferenceInclude(ReferenceInclude {
            owner: Box::new(self),
            related: Box::new(related),
            navigation,
            inverse,
        })
    }

    /// Wrap `self` as the owner of a one-to-many include.
    #[must_use]
    pub fn include_collection(
        self,
        related: Self,
        navigation: Navigation,
        inverse: Option<Navigation>,
        outer_key: KeySelector,
        inner_key: KeySelector,
    ) -> Self {
        Self::CollectionInclude(CollectionInclude {
            owner: Box::new(self),
            related: Box::new(related),
            navigation,
            inverse,
            outer_key,
            inner_key,
        })
    }

    /// Entity path this node yields, following include owners.
    #[must_use]
    pub fn entity_path(&self) -> Option<&'static str> {
        match self {
            Self::Value(_) => None,
            Self::Entity(shape) => Some(shape.entity_path),
            Self::ReferenceInclude(include) => include.owner.entity_path(),
            Self::CollectionInclude(include) => include.owner.entity_path(),
        }
    }
}
