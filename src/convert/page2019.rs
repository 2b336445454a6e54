//! PAGE 2019-07-15: recognized, not yet mapped.

use super::{ConvertOptions, MapContext, PageVersion, VersionHandler};
use crate::binding::BindingMode;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::schema::{SchemaCache, ValidationResult};
use std::path::Path;

pub(crate) const NAMESPACE: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15";

/// Handler for PAGE 2019-07-15 documents.
///
/// Documents are validated so that they are not mistaken for an older
/// version, but converting them fails with [`Error::VersionNotImplemented`].
#[derive(Debug)]
pub struct Page2019Handler {
    schema: SchemaCache,
}

impl Page2019Handler {
    /// Create a handler reading its XSD from `schema_dir`.
    pub fn new(schema_dir: impl AsRef<Path>) -> Self {
        Self::with_schema_path(
            schema_dir
                .as_ref()
                .join(PageVersion::Page2019.schema_file()),
        )
    }

    /// Create a handler validating against a specific XSD.
    pub fn with_schema_path(path: impl AsRef<Path>) -> Self {
        Self {
            schema: SchemaCache::new(path.as_ref()),
        }
    }
}

impl VersionHandler for Page2019Handler {
    fn version(&self) -> PageVersion {
        PageVersion::Page2019
    }

    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn schema_path(&self) -> &Path {
        self.schema.path()
    }

    fn validate(&self, bytes: &[u8]) -> Result<ValidationResult> {
        self.schema.get()?.validate(bytes)
    }

    fn convert(
        &self,
        _bytes: &[u8],
        _mode: BindingMode,
        _options: &ConvertOptions,
        _ctx: &mut MapContext,
    ) -> Result<Document> {
        log::warn!("PAGE {} documents cannot be converted yet", PageVersion::Page2019);
        Err(Error::VersionNotImplemented(PageVersion::Page2019.to_string()))
    }
}
