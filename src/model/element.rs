//! Flat content elements of the shared document.

use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to documents, elements and groups.
pub type MetadataMap = serde_json::Map<String, serde_json::Value>;

/// Handle of an element in [`Document::content`](super::Document).
///
/// Ids are sequential in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

/// Opaque reference binding elements that came from one source region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRef(pub usize);

/// A single flattened element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Position in the content list
    pub id: ElementId,

    /// What the element is
    #[serde(flatten)]
    pub kind: ElementKind,

    /// Group the element belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,

    /// Passthrough metadata
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub content_metadata: MetadataMap,
}

impl Element {
    /// The element's polygon, if it carries geometry.
    pub fn polygon(&self) -> Option<&Polygon> {
        match &self.kind {
            ElementKind::Region { polygon, .. }
            | ElementKind::Line { polygon }
            | ElementKind::Baseline { polygon } => Some(polygon),
            ElementKind::Text { .. } => None,
        }
    }

    /// The element's text, if it is a text element.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Whether this is a region element.
    pub fn is_region(&self) -> bool {
        matches!(self.kind, ElementKind::Region { .. })
    }
}

/// Element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// A typed page region
    Region {
        /// Region boundary
        polygon: Polygon,
        /// Region type (`text`, `image`, ...)
        region_type: String,
        /// Optional finer classification
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region_subtype: Option<String>,
    },

    /// A text line boundary
    Line {
        /// Line boundary
        polygon: Polygon,
    },

    /// A text line baseline
    Baseline {
        /// Baseline polyline
        polygon: Polygon,
    },

    /// A transcription
    Text {
        /// The transcribed text
        content: String,
    },
}

/// A group of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group reference
    pub id: GroupRef,

    /// The region element the group was opened for, if it had geometry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<ElementId>,

    /// Metadata describing the group as a whole
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub content_metadata: MetadataMap,
}

/// Where content metadata is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataTarget {
    /// A single element
    Element(ElementId),
    /// A whole group
    Group(GroupRef),
}

impl From<ElementId> for MetadataTarget {
    fn from(id: ElementId) -> Self {
        MetadataTarget::Element(id)
    }
}

impl From<GroupRef> for MetadataTarget {
    fn from(group: GroupRef) -> Self {
        MetadataTarget::Group(group)
    }
}
