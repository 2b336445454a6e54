//! Shared document model.
//!
//! The target representation every PAGE schema version converges to: a
//! flat, ordered list of elements (regions, lines, baselines, text) tied
//! back to their source regions through group references.

mod document;
mod element;

pub use document::{Creator, Document, SHARED_FORMAT_VERSION};
pub use element::{
    Element, ElementId, ElementKind, Group, GroupRef, MetadataMap, MetadataTarget,
};
