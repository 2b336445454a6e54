//! XML binding layer.
//!
//! Each supported PAGE version gets an owned, typed tree built from a
//! [`roxmltree`] document. Binding never validates structure beyond what it
//! needs to build the tree; that is the job of [`crate::schema`].

pub mod page2017;
pub mod presence;

use crate::convert::Warning;
use crate::error::{Error, Result};
use roxmltree::Node;
use std::str::FromStr;

/// How strictly the binding layer treats deviations from the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingMode {
    /// Reject wrong namespaces, missing required children and unparseable
    /// attribute values.
    #[default]
    Strict,

    /// Match elements by local name only and drop unparseable values with a
    /// warning.
    Relaxed,
}

impl BindingMode {
    /// Check if this is the relaxed mode.
    pub fn is_relaxed(&self) -> bool {
        matches!(self, BindingMode::Relaxed)
    }
}

/// Decode document bytes and parse them into an XML tree.
pub(crate) fn parse_xml(bytes: &[u8]) -> Result<roxmltree::Document<'_>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedXml(format!("document is not valid UTF-8: {}", e)))?;
    roxmltree::Document::parse(text).map_err(|e| Error::MalformedXml(e.to_string()))
}

/// Reads typed values off XML nodes for one version namespace.
pub(crate) struct Binder<'w> {
    mode: BindingMode,
    namespace: &'static str,
    warnings: &'w mut Vec<Warning>,
}

impl<'w> Binder<'w> {
    pub(crate) fn new(
        mode: BindingMode,
        namespace: &'static str,
        warnings: &'w mut Vec<Warning>,
    ) -> Self {
        Self {
            mode,
            namespace,
            warnings,
        }
    }

    /// Check the root element and return it.
    pub(crate) fn root<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
        name: &str,
    ) -> Result<Node<'a, 'input>> {
        let root = doc.root_element();
        let tag = root.tag_name();
        if tag.name() != name {
            return Err(Error::Binding(format!(
                "expected root element <{}>, found <{}>",
                name,
                tag.name()
            )));
        }
        if !self.mode.is_relaxed() && tag.namespace() != Some(self.namespace) {
            return Err(Error::Binding(format!(
                "root element <{}> is in namespace [{}], expected [{}]",
                name,
                tag.namespace().unwrap_or(""),
                self.namespace
            )));
        }
        Ok(root)
    }

    /// Whether an element belongs to the bound namespace. Always true when relaxed.
    pub(crate) fn in_namespace(&self, node: &Node<'_, '_>) -> bool {
        self.mode.is_relaxed() || node.tag_name().namespace() == Some(self.namespace)
    }

    fn matches(&self, node: &Node<'_, '_>, name: &str) -> bool {
        node.is_element() && node.tag_name().name() == name && self.in_namespace(node)
    }

    /// Child elements with the given local name, in document order.
    pub(crate) fn children<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        name: &'static str,
    ) -> impl Iterator<Item = Node<'a, 'input>> {
        let relaxed = self.mode.is_relaxed();
        let namespace = self.namespace;
        node.children().filter(move |n| {
            n.is_element()
                && n.tag_name().name() == name
                && (relaxed || n.tag_name().namespace() == Some(namespace))
        })
    }

    /// First child element with the given local name.
    pub(crate) fn child<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        name: &str,
    ) -> Option<Node<'a, 'input>> {
        node.children().find(|n| self.matches(n, name))
    }

    /// A child the schema requires.
    ///
    /// Strict mode fails when it is missing; relaxed mode records a warning.
    pub(crate) fn required_child<'a, 'input>(
        &mut self,
        node: Node<'a, 'input>,
        name: &str,
    ) -> Result<Option<Node<'a, 'input>>> {
        match self.child(node, name) {
            Some(child) => Ok(Some(child)),
            None => {
                let message = format!(
                    "<{}> is missing required child <{}>",
                    node.tag_name().name(),
                    name
                );
                self.reject(name, message)?;
                Ok(None)
            }
        }
    }

    /// An attribute the schema requires.
    pub(crate) fn required_attr(&mut self, node: Node<'_, '_>, name: &str) -> Result<Option<String>> {
        match node.attribute(name) {
            Some(value) => Ok(Some(value.to_string())),
            None => {
                let message = format!(
                    "<{}> is missing required attribute {}",
                    node.tag_name().name(),
                    name
                );
                self.reject(name, message)?;
                Ok(None)
            }
        }
    }

    /// Raw attribute value.
    pub(crate) fn attr(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        node.attribute(name).map(str::to_string)
    }

    /// Attribute value parsed into `T`.
    pub(crate) fn attr_parse<T: FromStr>(
        &mut self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                self.reject_value(node, name, raw)?;
                Ok(None)
            }
        }
    }

    /// Attribute value read as an XML Schema boolean.
    pub(crate) fn attr_bool(&mut self, node: Node<'_, '_>, name: &str) -> Result<Option<bool>> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        match raw.trim() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => {
                self.reject_value(node, name, raw)?;
                Ok(None)
            }
        }
    }

    /// Concatenated character data of an element.
    pub(crate) fn text(&self, node: Node<'_, '_>) -> String {
        node.children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }

    /// Text of the first child element with the given name.
    pub(crate) fn child_text(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        self.child(node, name).map(|n| self.text(n))
    }

    /// Record a binding-level warning.
    pub(crate) fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let warning = Warning::new(field, message);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn reject_value(&mut self, node: Node<'_, '_>, name: &str, raw: &str) -> Result<()> {
        let message = format!(
            "<{}> attribute {} has invalid value [{}]",
            node.tag_name().name(),
            name,
            raw
        );
        self.reject(name, message)
    }

    fn reject(&mut self, field: &str, message: String) -> Result<()> {
        if self.mode.is_relaxed() {
            self.warn(field, message);
            Ok(())
        } else {
            Err(Error::Binding(message))
        }
    }
}
