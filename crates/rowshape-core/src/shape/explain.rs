use crate::{
    model::Navigation,
    shape::{EntityShape, KeySelector, ShapeNode, ValueBinding},
};
use std::fmt::Write as _;

/// Render a shape tree as indented text, one node per line.
pub(super) fn render(root: &ShapeNode) -> String {
    let mut out = String::new();
    render_node(&mut out, root, 0, "");

    out
}

fn render_node(out: &mut String, node: &ShapeNode, depth: usize, label: &str) {
    indent(out, depth);
    out.push_str(label);

    match node {
        ShapeNode::Value(binding) => {
            out.push_str("value ");
            push_binding(out, binding);
            out.push('\n');
        }
        ShapeNode::Entity(shape) => {
            push_entity(out, shape);
            out.push('\n');
        }
        ShapeNode::ReferenceInclude(include) => {
            out.push_str("include reference ");
            push_navigation(out, &include.navigation, include.inverse.as_ref());
            out.push('\n');
            render_node(out, &include.owner, depth + 1, "owner: ");
            render_node(out, &include.related, depth + 1, "related: ");
        }
        ShapeNode::CollectionInclude(include) => {
            out.push_str("include collection ");
            push_navigation(out, &include.navigation, include.inverse.as_ref());
            out.push_str(" outer=");
            push_key(out, &include.outer_key);
            out.push_str(" inner=");
            push_key(out, &include.inner_key);
            out.push('\n');
            render_node(out, &include.owner, depth + 1, "owner: ");
            render_node(out, &include.related, depth + 1, "related: ");
        }
    }
}

fn push_entity(out: &mut String, shape: &EntityShape) {
    let _ = write!(out, "entity {} [", shape.entity_path);
    for (index, binding) in shape.bindings.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        push_binding(out, binding);
    }
    out.push(']');

    if let Some(column) = shape
        .null_key
        .and_then(|index| shape.bindings.get(index))
        .map(|binding| binding.column)
    {
        let _ = write!(out, " null_when=#{column}");
    }
}

fn push_binding(out: &mut String, binding: &ValueBinding) {
    let _ = write!(out, "#{}:{}", binding.column, binding.target);
    if binding.nullable && !binding.target.nullable {
        out.push_str(" default_on_null");
    }
    if let Some(converter) = &binding.converter {
        let _ = write!(out, " via {}", converter.provider_kind());
    }
}

fn push_navigation(out: &mut String, navigation: &Navigation, inverse: Option<&Navigation>) {
    let _ = write!(out, "{navigation} -> {}", navigation.target_entity());
    if let Some(inverse) = inverse {
        let _ = write!(out, " inverse={inverse}");
    }
}

fn push_key(out: &mut String, key: &KeySelector) {
    out.push('(');
    for (index, binding) in key.columns.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        push_binding(out, binding);
    }
    out.push(')');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
