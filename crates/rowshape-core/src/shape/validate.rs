use crate::{
    model::{Navigation, NavigationKind},
    shape::{EntityShape, KeySelector, PlanError, ShapeNode, ValueBinding},
};

/// Walk the tree and reject shapes the stitcher cannot evaluate.
pub(super) fn validate_node(node: &ShapeNode) -> Result<(), PlanError> {
    match node {
        ShapeNode::Value(_) => Ok(()),
        ShapeNode::Entity(shape) => validate_entity(shape),
        ShapeNode::ReferenceInclude(include) => {
            validate_include(
                &include.owner,
                &include.related,
                &include.navigation,
                include.inverse.as_ref(),
                NavigationKind::Reference,
            )?;

            validate_node(&include.owner)?;
            validate_node(&include.related)
        }
        ShapeNode::CollectionInclude(include) => {
            validate_include(
                &include.owner,
                &include.related,
                &include.navigation,
                include.inverse.as_ref(),
                NavigationKind::Collection,
            )?;
            validate_key(&include.navigation, &include.outer_key, "outer")?;
            validate_key(&include.navigation, &include.inner_key, "inner")?;

            validate_node(&include.owner)?;
            validate_node(&include.related)
        }
    }
}

fn validate_entity(shape: &EntityShape) -> Result<(), PlanError> {
    match shape.null_key {
        Some(index) if index >= shape.bindings.len() => Err(PlanError::NullKeyOutOfRange {
            entity_path: shape.entity_path.to_string(),
            index,
            bindings: shape.bindings.len(),
        }),
        _ => Ok(()),
    }
}

fn validate_include(
    owner: &ShapeNode,
    related: &ShapeNode,
    navigation: &Navigation,
    inverse: Option<&Navigation>,
    expected: NavigationKind,
) -> Result<(), PlanError> {
    let name = navigation.to_string();

    if navigation.kind() != expected {
        return Err(PlanError::NavigationKindMismatch {
            navigation: name,
            expected,
            found: navigation.kind(),
        });
    }

    let owner_path = owner
        .entity_path()
        .ok_or_else(|| PlanError::IncludeOwnerNotEntity {
            navigation: name.clone(),
        })?;
    let related_path = related
        .entity_path()
        .ok_or_else(|| PlanError::IncludeRelatedNotEntity {
            navigation: name.clone(),
        })?;

    if navigation.declaring_entity() != owner_path {
        return Err(PlanError::NavigationOwnerMismatch {
            navigation: name,
            owner: owner_path.to_string(),
        });
    }
    if navigation.target_entity() != related_path {
        return Err(PlanError::NavigationTargetMismatch {
            navigation: name,
            related: related_path.to_string(),
        });
    }

    if let Some(inverse) = inverse
        && (inverse.declaring_entity() != related_path || inverse.target_entity() != owner_path)
    {
        return Err(PlanError::InverseMismatch {
            navigation: name,
            inverse: inverse.to_string(),
        });
    }

    // The owner is evaluated first on the current row; if it already ran a
    // collection loop the cursor has moved on.
    if consumes_rows(owner) {
        return Err(PlanError::IncludeAfterCollection { navigation: name });
    }

    Ok(())
}

fn validate_key(
    navigation: &Navigation,
    key: &KeySelector,
    side: &'static str,
) -> Result<(), PlanError> {
    if key.columns.is_empty() {
        return Err(PlanError::EmptyKeySelector {
            navigation: navigation.to_string(),
            side,
        });
    }

    Ok(())
}

/// Whether evaluating `node` may advance the cursor.
fn consumes_rows(node: &ShapeNode) -> bool {
    match node {
        ShapeNode::Value(_) | ShapeNode::Entity(_) => false,
        ShapeNode::ReferenceInclude(include) => {
            consumes_rows(&include.owner) || consumes_rows(&include.related)
        }
        ShapeNode::CollectionInclude(_) => true,
    }
}

/// Highest column index any binding in the tree reads.
pub(super) fn max_column(node: &ShapeNode) -> Option<usize> {
    match node {
        ShapeNode::Value(binding) => Some(binding.column),
        ShapeNode::Entity(shape) => max_binding(&shape.bindings),
        ShapeNode::ReferenceInclude(include) => {
            max_column(&include.owner).max(max_column(&include.related))
        }
        ShapeNode::CollectionInclude(include) => max_column(&include.owner)
            .max(max_column(&include.related))
            .max(max_binding(&include.outer_key.columns))
            .max(max_binding(&include.inner_key.columns)),
    }
}

fn max_binding(bindings: &[ValueBinding]) -> Option<usize> {
    bindings.iter().map(|binding| binding.column).max()
}
