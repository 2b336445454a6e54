//! # unpage
//!
//! PAGE-XML to shared JSON document conversion for Rust.
//!
//! This library detects which PAGE content schema version a document
//! conforms to, binds it to that version's typed tree and flattens its
//! region hierarchy into one versioned JSON document model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unpage::{convert_file, render, JsonFormat};
//!
//! fn main() -> unpage::Result<()> {
//!     let doc = convert_file("page.xml")?;
//!     println!("{}", render::to_json(&doc, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Version detection**: ordered XSD validation, newest schema first
//! - **Full region mapping**: all 13 PAGE region kinds, nested to any depth
//! - **Lossless passthrough**: unmapped attributes kept as metadata
//! - **Collected warnings**: every dropped construct is reported
//! - **Parallel batches**: Uses Rayon to convert many files at once
//! - **Output sinks**: JSON files, JSON-lines stores, directory watching

pub mod binding;
pub mod convert;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod render;
pub mod schema;
pub mod sink;
pub mod watch;

// Re-export commonly used types
pub use binding::BindingMode;
pub use convert::{
    ConvertOptions, ConvertResult, PageVersion, RegionMapper, VersionChain, VersionHandler,
    Warning,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_page_xml, PageFormat};
pub use error::{Error, Result};
pub use geometry::{parse_points, Point, Polygon};
pub use model::{Creator, Document, Element, ElementId, ElementKind, GroupRef, MetadataMap};
pub use render::JsonFormat;
pub use schema::{validate_against_schema, Schema, ValidationResult};
pub use sink::{log_document, write_json_file, DocumentStore, JsonLinesStore, MemoryStore};
pub use watch::{DirectoryWatcher, PollReport, WatchOptions};

use chrono::NaiveDate;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Convert a PAGE-XML file with the bundled schemas.
///
/// # Example
///
/// ```no_run
/// use unpage::convert_file;
///
/// let doc = convert_file("page.xml").unwrap();
/// println!("Elements: {}", doc.content.len());
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Unpage::new().convert_file(path).map(|r| r.document)
}

/// Convert PAGE-XML bytes with the bundled schemas.
///
/// # Example
///
/// ```no_run
/// use unpage::convert_bytes;
///
/// let data = std::fs::read("page.xml").unwrap();
/// let doc = convert_bytes(&data).unwrap();
/// ```
pub fn convert_bytes(data: &[u8]) -> Result<Document> {
    Unpage::new().convert_bytes(data, "<bytes>").map(|r| r.document)
}

/// Convert a PAGE-XML file to JSON.
///
/// # Example
///
/// ```no_run
/// use unpage::{to_json, JsonFormat};
///
/// let json = to_json("page.xml", JsonFormat::Pretty).unwrap();
/// std::fs::write("page.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = convert_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for converting PAGE-XML documents.
///
/// # Example
///
/// ```no_run
/// use unpage::{PageVersion, Unpage};
///
/// let result = Unpage::new()
///     .with_schema_dir("./schemas")
///     .force_version(PageVersion::Page2017)
///     .with_tool_name("archive-import")
///     .convert_file("page.xml")?;
/// for warning in &result.warnings {
///     println!("{}", warning);
/// }
/// # Ok::<(), unpage::Error>(())
/// ```
#[derive(Clone)]
pub struct Unpage {
    chain: Arc<VersionChain>,
    options: ConvertOptions,
}

impl Unpage {
    /// Create a new Unpage builder using the bundled schemas.
    pub fn new() -> Self {
        let options = ConvertOptions::default();
        Self {
            chain: Arc::new(VersionChain::with_defaults(&options.schema_dir)),
            options,
        }
    }

    /// Read version schemas from `dir`.
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_schema_dir(dir);
        self.chain = Arc::new(VersionChain::with_defaults(&self.options.schema_dir));
        self
    }

    /// Use a custom version chain.
    pub fn with_chain(mut self, chain: VersionChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }

    /// Skip detection and convert as `version`.
    pub fn force_version(mut self, version: PageVersion) -> Self {
        self.options = self.options.with_forced_version(version);
        self
    }

    /// Set the creator date recorded for conversions.
    pub fn with_conversion_date(mut self, date: NaiveDate) -> Self {
        self.options = self.options.with_conversion_date(date);
        self
    }

    /// Set the creator name recorded for conversions.
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.options = self.options.with_tool_name(name);
        self
    }

    /// Current conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// The version chain in use.
    pub fn chain(&self) -> &VersionChain {
        &self.chain
    }

    /// Convert a file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<ConvertResult> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        self.convert_bytes(&data, &path.display().to_string())
    }

    /// Convert bytes; `source` names the input in logs and errors.
    pub fn convert_bytes(&self, data: &[u8], source: &str) -> Result<ConvertResult> {
        self.chain.dispatch(data, source, &self.options)
    }

    /// Convert several files in parallel.
    ///
    /// Each file is converted in isolation; results keep the input order.
    pub fn convert_many<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<ConvertResult>> {
        paths.par_iter().map(|p| self.convert_file(p)).collect()
    }
}

impl Default for Unpage {
    fn default() -> Self {
        Self::new()
    }
}
