//! Mapping context shared by all version mappers.

use crate::error::Result;
use crate::model::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable problem found during conversion.
///
/// Warnings never stop a conversion; they record what the shared document
/// does not carry over from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Source element or attribute the warning is about
    pub field: String,

    /// What was skipped and why
    pub message: String,
}

impl Warning {
    /// Create a new warning.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Per-conversion state threaded through binding and mapping.
#[derive(Debug, Default)]
pub struct MapContext {
    warnings: Vec<Warning>,
}

impl MapContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a warning.
    pub fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let warning = Warning::new(field, message);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn warnings_mut(&mut self) -> &mut Vec<Warning> {
        &mut self.warnings
    }

    /// Consume the context, returning its warnings.
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// Maps one version's typed tree into the shared document.
///
/// The three phases run in order over the same tree, threading the document
/// being built from one to the next.
pub trait RegionMapper {
    /// The version's typed document tree.
    type Tree;

    /// Create the document: page image, dimensions and creators.
    fn initialize(&self, tree: &Self::Tree, ctx: &mut MapContext) -> Result<Document>;

    /// Attach document and page level metadata.
    fn add_metadata(
        &self,
        tree: &Self::Tree,
        doc: Document,
        ctx: &mut MapContext,
    ) -> Result<Document>;

    /// Map page frames and the region hierarchy.
    fn add_regions(
        &self,
        tree: &Self::Tree,
        doc: Document,
        ctx: &mut MapContext,
    ) -> Result<Document>;

    /// Run all three phases.
    fn map(&self, tree: &Self::Tree, ctx: &mut MapContext) -> Result<Document> {
        let doc = self.initialize(tree, ctx)?;
        let doc = self.add_metadata(tree, doc, ctx)?;
        self.add_regions(tree, doc, ctx)
    }
}
