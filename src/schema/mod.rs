//! XML Schema validation.
//!
//! A compiler and validator for the subset of XSD 1.0 used by the PAGE
//! content schemas: global elements, named and anonymous complex types with
//! sequence/choice/all/any content, complex content extension, simple content,
//! and simple types restricted by enumeration, pattern and range facets.
//! Identity constraints are not enforced.
//!
//! # Example
//!
//! ```no_run
//! use unpage::schema::Schema;
//!
//! fn main() -> unpage::Result<()> {
//!     let schema = Schema::load("schemas/pagecontent-2017-07-15.xsd")?;
//!     let result = schema.validate(&std::fs::read("page.xml")?)?;
//!     if !result.ok {
//!         println!("invalid: {}", result.diagnostic.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

mod builtins;
mod compile;
mod components;
mod validate;

use crate::binding::parse_xml;
use crate::error::{Error, Result};
use compile::Components;
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use validate::Validator;

/// The XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the document conforms to the schema
    pub ok: bool,

    /// First validation error, when `ok` is false
    pub diagnostic: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        Self {
            ok: true,
            diagnostic: None,
        }
    }

    /// A failing result with its diagnostic.
    pub fn invalid(diagnostic: impl Into<String>) -> Self {
        Self {
            ok: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// A compiled XML schema.
pub struct Schema {
    path: PathBuf,
    components: Components,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("path", &self.path)
            .field("target_namespace", &self.components.target_namespace)
            .finish()
    }
}

impl Schema {
    /// Read and compile the XSD file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::SchemaLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_xsd(&text, path)
    }

    /// Compile XSD text; `path` is only used for diagnostics.
    pub fn from_xsd(text: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let load_error = |reason: String| Error::SchemaLoad {
            path: path.clone(),
            reason,
        };

        let doc = roxmltree::Document::parse(text).map_err(|e| load_error(e.to_string()))?;
        let components = compile::compile(&doc).map_err(load_error)?;

        log::debug!(
            "Compiled schema {} ({} global elements, {} complex types, {} simple types)",
            path.display(),
            components.elements.len(),
            components.complex_types.len(),
            components.simple_types.len()
        );

        Ok(Self { path, components })
    }

    /// Path the schema was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The schema's target namespace.
    pub fn target_namespace(&self) -> Option<&str> {
        self.components.target_namespace.as_deref()
    }

    /// Validate document bytes.
    ///
    /// Fails with [`Error::MalformedXml`] when the bytes are not well-formed
    /// XML; a schema mismatch is reported through the result.
    pub fn validate(&self, bytes: &[u8]) -> Result<ValidationResult> {
        let doc = parse_xml(bytes)?;
        Ok(self.validate_document(&doc))
    }

    /// Validate an already parsed document.
    pub fn validate_document(&self, doc: &roxmltree::Document<'_>) -> ValidationResult {
        match Validator::new(&self.components).validate_document(doc) {
            Ok(()) => ValidationResult::valid(),
            Err(diagnostic) => ValidationResult::invalid(diagnostic),
        }
    }
}

/// Load the schema at `schema_path` and validate `bytes` against it.
pub fn validate_against_schema(bytes: &[u8], schema_path: impl AsRef<Path>) -> Result<ValidationResult> {
    Schema::load(schema_path)?.validate(bytes)
}

/// A schema compiled on first use and shared afterwards.
#[derive(Debug)]
pub struct SchemaCache {
    path: PathBuf,
    cell: OnceCell<Schema>,
}

impl SchemaCache {
    /// Create a cache for the schema at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Path of the cached schema.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the compiled schema, loading it on first access.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn get(&self) -> Result<&Schema> {
        self.cell.get_or_try_init(|| Schema::load(&self.path))
    }

    /// Whether the schema has been compiled.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
