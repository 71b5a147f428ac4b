//! Deterministic shape fingerprinting.
#![allow(clippy::cast_possible_truncation)]

use crate::{
    model::Navigation,
    shape::{EntityShape, KeySelector, ShapeNode, ValueBinding},
};
use sha2::{Digest, Sha256};
use std::fmt;

///
/// ShapeFingerprint
///
/// Stable identity of a compiled shape plan. Two plans with the same
/// fingerprint read the same columns into the same structure, so callers
/// may cache one plan per fingerprint.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShapeFingerprint([u8; 32]);

impl ShapeFingerprint {
    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ShapeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

/// Compute the fingerprint of a shape tree.
pub(super) fn fingerprint(root: &ShapeNode) -> ShapeFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(b"shapefp:v1");
    hash_node(&mut hasher, root);

    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);

    ShapeFingerprint(out)
}

fn hash_node(hasher: &mut Sha256, node: &ShapeNode) {
    match node {
        ShapeNode::Value(binding) => {
            write_tag(hasher, 0x10);
            hash_binding(hasher, binding);
        }
        ShapeNode::Entity(shape) => {
            write_tag(hasher, 0x11);
            hash_entity(hasher, shape);
        }
        ShapeNode::ReferenceInclude(include) => {
            write_tag(hasher, 0x12);
            hash_node(hasher, &include.owner);
            hash_node(hasher, &include.related);
            hash_navigation(hasher, &include.navigation);
            hash_inverse(hasher, include.inverse.as_ref());
        }
        ShapeNode::CollectionInclude(include) => {
            write_tag(hasher, 0x13);
            hash_node(hasher, &include.owner);
            hash_node(hasher, &include.related);
            hash_navigation(hasher, &include.navigation);
            hash_inverse(hasher, include.inverse.as_ref());
            hash_key(hasher, &include.outer_key);
            hash_key(hasher, &include.inner_key);
        }
    }
}

fn hash_entity(hasher: &mut Sha256, shape: &EntityShape) {
    write_str(hasher, shape.entity_path);
    write_u32(hasher, shape.bindings.len() as u32);
    for binding in &shape.bindings {
        hash_binding(hasher, binding);
    }

    match shape.null_key {
        Some(index) => {
            write_tag(hasher, 0x01);
            write_u32(hasher, index as u32);
        }
        None => write_tag(hasher, 0x00),
    }
}

fn hash_binding(hasher: &mut Sha256, binding: &ValueBinding) {
    write_u32(hasher, binding.column as u32);
    write_tag(hasher, u8::from(binding.nullable));
    write_tag(hasher, binding.target.kind.tag());
    write_tag(hasher, u8::from(binding.target.nullable));

    // Converter identity is opaque; only its provider kind is hashed.
    match &binding.converter {
        Some(converter) => {
            write_tag(hasher, 0x01);
            write_tag(hasher, converter.provider_kind().tag());
        }
        None => write_tag(hasher, 0x00),
    }
}

fn hash_navigation(hasher: &mut Sha256, navigation: &Navigation) {
    write_str(hasher, navigation.declaring_entity());
    write_str(hasher, navigation.name());
    write_str(hasher, navigation.target_entity());
    write_tag(hasher, navigation.kind().tag());
}

fn hash_inverse(hasher: &mut Sha256, inverse: Option<&Navigation>) {
    match inverse {
        Some(navigation) => {
            write_tag(hasher, 0x01);
            hash_navigation(hasher, navigation);
        }
        None => write_tag(hasher, 0x00),
    }
}

fn hash_key(hasher: &mut Sha256, key: &KeySelector) {
    write_u32(hasher, key.columns.len() as u32);
    for binding in &key.columns {
        hash_binding(hasher, binding);
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u32(hasher: &mut Sha256, value: u32) {
    hasher.update(value.to_be_bytes());
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}
