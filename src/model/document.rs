//! Document-level types of the shared document format.

use super::element::{Element, ElementId, ElementKind, Group, GroupRef, MetadataMap, MetadataTarget};
use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};

/// Version of the shared document format written by this crate.
pub const SHARED_FORMAT_VERSION: &str = "1.0";

/// A converted document in the shared format.
///
/// Content is a flat list in traversal order; regions that had nested
/// content are tied together through [`GroupRef`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Shared format version
    pub version: String,

    /// Page image filename
    pub filename: String,

    /// Page image size as `(height, width)` in pixels
    pub original_image_size: (u32, u32),

    /// Tools that produced this document
    #[serde(rename = "creator")]
    pub creators: Vec<Creator>,

    /// Document-level metadata
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub metadata: MetadataMap,

    /// Flattened content
    pub content: Vec<Element>,

    /// Groups referenced by content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

/// A tool that created or touched the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Tool name
    pub name: String,

    /// Date of creation, as recorded by the tool
    pub date: String,
}

impl Document {
    /// Create an empty document for a page image of the given `(height, width)`.
    pub fn empty(filename: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            version: SHARED_FORMAT_VERSION.to_string(),
            filename: filename.into(),
            original_image_size: size,
            creators: Vec::new(),
            metadata: MetadataMap::new(),
            content: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Record a creator.
    pub fn add_creator(&mut self, name: impl Into<String>, date: impl Into<String>) {
        self.creators.push(Creator {
            name: name.into(),
            date: date.into(),
        });
    }

    /// Merge entries into the document metadata.
    pub fn add_metadata(&mut self, metadata: MetadataMap) {
        self.metadata.extend(metadata);
    }

    /// Append a region element.
    pub fn add_region(
        &mut self,
        polygon: Polygon,
        region_type: impl Into<String>,
        region_subtype: Option<String>,
    ) -> ElementId {
        self.push(
            ElementKind::Region {
                polygon,
                region_type: region_type.into(),
                region_subtype,
            },
            None,
        )
    }

    /// Append a text line polygon.
    pub fn add_line_polygon(&mut self, polygon: Polygon, group: Option<GroupRef>) -> ElementId {
        self.push(ElementKind::Line { polygon }, group)
    }

    /// Append a baseline.
    pub fn add_baseline(&mut self, polygon: Polygon, group: Option<GroupRef>) -> ElementId {
        self.push(ElementKind::Baseline { polygon }, group)
    }

    /// Append a text element.
    pub fn add_text(&mut self, content: impl Into<String>, group: Option<GroupRef>) -> ElementId {
        self.push(
            ElementKind::Text {
                content: content.into(),
            },
            group,
        )
    }

    /// Open a new group anchored at `element` and put the element in it.
    pub fn add_group(&mut self, element: ElementId) -> GroupRef {
        let group = self.open_group(Some(element));
        self.join_group(element, group);
        group
    }

    /// Open a group that has no anchor element.
    pub fn new_group(&mut self) -> GroupRef {
        self.open_group(None)
    }

    /// Put an existing element into a group.
    pub fn join_group(&mut self, element: ElementId, group: GroupRef) {
        if let Some(el) = self.content.get_mut(element.0) {
            el.group = Some(group);
        }
    }

    /// Merge content metadata into an element or group.
    ///
    /// Unknown targets are ignored.
    pub fn add_content_metadata(&mut self, metadata: MetadataMap, target: impl Into<MetadataTarget>) {
        match target.into() {
            MetadataTarget::Element(id) => {
                if let Some(el) = self.content.get_mut(id.0) {
                    el.content_metadata.extend(metadata);
                }
            }
            MetadataTarget::Group(group) => {
                if let Some(g) = self.groups.get_mut(group.0) {
                    g.content_metadata.extend(metadata);
                }
            }
        }
    }

    /// Merge metadata under `key` inside a group's metadata.
    ///
    /// Groups shared by a region subtree hold one entry per contributing
    /// region; entries already stored under `key` are kept.
    pub fn add_group_entry(&mut self, group: GroupRef, key: &str, metadata: MetadataMap) {
        let Some(g) = self.groups.get_mut(group.0) else {
            return;
        };
        let slot = g
            .content_metadata
            .entry(key.to_string())
            .or_insert_with(|| serde_json::Value::Object(MetadataMap::new()));
        match slot {
            serde_json::Value::Object(entry) => entry.extend(metadata),
            other => *other = serde_json::Value::Object(metadata),
        }
    }

    /// The most recently appended element.
    pub fn last_element(&self) -> Option<&Element> {
        self.content.last()
    }

    /// Get an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.content.get(id.0)
    }

    /// Get a group by reference.
    pub fn group(&self, group: GroupRef) -> Option<&Group> {
        self.groups.get(group.0)
    }

    /// Elements belonging to a group, in content order.
    pub fn group_members(&self, group: GroupRef) -> impl Iterator<Item = &Element> {
        self.content.iter().filter(move |el| el.group == Some(group))
    }

    /// Region elements of the given type.
    pub fn regions_of_type<'a>(&'a self, region_type: &'a str) -> impl Iterator<Item = &'a Element> {
        self.content.iter().filter(move |el| {
            matches!(&el.kind, ElementKind::Region { region_type: t, .. } if t == region_type)
        })
    }

    /// Check if the document has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Serialize into a JSON value tree.
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn push(&mut self, kind: ElementKind, group: Option<GroupRef>) -> ElementId {
        let id = ElementId(self.content.len());
        self.content.push(Element {
            id,
            kind,
            group,
            content_metadata: MetadataMap::new(),
        });
        id
    }

    fn open_group(&mut self, region: Option<ElementId>) -> GroupRef {
        let id = GroupRef(self.groups.len());
        self.groups.push(Group {
            id,
            region,
            content_metadata: MetadataMap::new(),
        });
        id
    }
}
