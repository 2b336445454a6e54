//! Version dispatch for PAGE-XML conversion.
//!
//! Every supported PAGE schema version registers a [`VersionHandler`] in a
//! [`VersionChain`]. The chain tries handlers in order: the first whose
//! schema validates the document binds and maps it into a shared
//! [`Document`].
//!
//! # Example
//!
//! ```no_run
//! use unpage::convert::{ConvertOptions, VersionChain};
//!
//! fn main() -> unpage::Result<()> {
//!     let chain = VersionChain::with_defaults("schemas");
//!     let bytes = std::fs::read("page.xml")?;
//!
//!     let result = chain.dispatch(&bytes, "page.xml", &ConvertOptions::default())?;
//!     println!("PAGE {} with {} elements", result.version, result.document.content.len());
//!     Ok(())
//! }
//! ```

mod context;
mod page2017;
mod page2019;

pub use context::{MapContext, RegionMapper, Warning};
pub use page2017::{Page2017Handler, Page2017Mapper};
pub use page2019::Page2019Handler;

use crate::binding::BindingMode;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::schema::ValidationResult;
use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Creator name recorded for this converter.
pub const DEFAULT_TOOL_NAME: &str = "shared-file-converter";

/// Directory holding the bundled XSD files.
pub fn default_schema_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("schemas")
}

/// A PAGE content schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageVersion {
    /// `2019-07-15`
    Page2019,

    /// `2017-07-15`
    Page2017,
}

impl PageVersion {
    /// All known versions, newest first.
    pub const ALL: [PageVersion; 2] = [PageVersion::Page2019, PageVersion::Page2017];

    /// Date label of the version.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageVersion::Page2019 => "2019-07-15",
            PageVersion::Page2017 => "2017-07-15",
        }
    }

    /// Namespace of the version's root element.
    pub fn namespace(&self) -> &'static str {
        match self {
            PageVersion::Page2019 => page2019::NAMESPACE,
            PageVersion::Page2017 => crate::binding::page2017::NAMESPACE,
        }
    }

    /// File name of the version's bundled XSD.
    pub fn schema_file(&self) -> String {
        format!("pagecontent-{}.xsd", self.as_str())
    }

    /// Find the version owning a namespace.
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.namespace() == namespace)
    }
}

impl fmt::Display for PageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2019-07-15" | "page2019" | "2019" => Ok(PageVersion::Page2019),
            "2017-07-15" | "page2017" | "2017" => Ok(PageVersion::Page2017),
            _ => Err(Error::UnknownVersion(s.to_string())),
        }
    }
}

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Skip validation and bind as this version
    pub forced_version: Option<PageVersion>,

    /// Creator name recorded for the conversion
    pub tool_name: String,

    /// Creator date recorded for the conversion (today when unset)
    pub conversion_date: Option<NaiveDate>,

    /// Directory holding the version XSD files
    pub schema_dir: PathBuf,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            forced_version: None,
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            conversion_date: None,
            schema_dir: default_schema_dir(),
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a schema version.
    pub fn with_forced_version(mut self, version: PageVersion) -> Self {
        self.forced_version = Some(version);
        self
    }

    /// Set the creator name recorded for the conversion.
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    /// Set the creator date recorded for the conversion.
    pub fn with_conversion_date(mut self, date: NaiveDate) -> Self {
        self.conversion_date = Some(date);
        self
    }

    /// Set the schema directory.
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = dir.into();
        self
    }

    /// The conversion date as `YYYY-MM-DD`.
    pub fn conversion_date_string(&self) -> String {
        self.conversion_date
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Result of converting one document.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The shared document
    pub document: Document,

    /// Version the document was converted as
    pub version: PageVersion,

    /// Whether the version was forced rather than detected
    pub forced: bool,

    /// Lossy-conversion warnings, in the order they occurred
    pub warnings: Vec<Warning>,
}

/// One schema version: its validator, binding and mapper.
pub trait VersionHandler: Send + Sync {
    /// Version handled.
    fn version(&self) -> PageVersion;

    /// Namespace of the root element.
    fn namespace(&self) -> &str;

    /// Path of the XSD this handler validates against.
    fn schema_path(&self) -> &Path;

    /// Validate document bytes against this version's schema.
    fn validate(&self, bytes: &[u8]) -> Result<ValidationResult>;

    /// Bind and map the document.
    fn convert(
        &self,
        bytes: &[u8],
        mode: BindingMode,
        options: &ConvertOptions,
        ctx: &mut MapContext,
    ) -> Result<Document>;
}

/// Ordered list of version handlers.
///
/// Earlier handlers take priority: when a document validates against
/// several schemas, the first registered one is used.
pub struct VersionChain {
    handlers: Vec<Arc<dyn VersionHandler>>,
}

impl VersionChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Create a chain with all built-in versions, newest first.
    pub fn with_defaults(schema_dir: impl AsRef<Path>) -> Self {
        let schema_dir = schema_dir.as_ref();
        let mut chain = Self::new();
        chain.register(Arc::new(Page2019Handler::new(schema_dir)));
        chain.register(Arc::new(Page2017Handler::new(schema_dir)));
        chain
    }

    /// Append a handler with the lowest priority so far.
    pub fn register(&mut self, handler: Arc<dyn VersionHandler>) {
        self.handlers.push(handler);
    }

    /// Get the first handler for a version.
    pub fn get_by_version(&self, version: PageVersion) -> Option<Arc<dyn VersionHandler>> {
        self.handlers
            .iter()
            .find(|h| h.version() == version)
            .cloned()
    }

    /// Registered versions in chain order.
    pub fn versions(&self) -> Vec<PageVersion> {
        self.handlers.iter().map(|h| h.version()).collect()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Convert a document with the first matching handler.
    ///
    /// `source` names the input in logs and errors. With a forced version,
    /// validation is skipped and a strict binding failure is retried once
    /// in relaxed mode.
    pub fn dispatch(
        &self,
        bytes: &[u8],
        source: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        if let Some(version) = options.forced_version {
            let handler = self
                .get_by_version(version)
                .ok_or_else(|| Error::UnknownVersion(version.to_string()))?;
            return self.convert_forced(handler.as_ref(), bytes, source, options);
        }

        let mut attempted = Vec::with_capacity(self.handlers.len());
        for handler in &self.handlers {
            let version = handler.version();
            attempted.push(version.to_string());

            let validation = handler.validate(bytes)?;
            if !validation.ok {
                log::debug!(
                    "{} is not valid PAGE {}: {}",
                    source,
                    version,
                    validation.diagnostic.as_deref().unwrap_or("no diagnostic")
                );
                continue;
            }

            log::info!("{} validated against PAGE {}", source, version);
            let mut ctx = MapContext::new();
            let document = handler.convert(bytes, BindingMode::Strict, options, &mut ctx)?;
            return Ok(ConvertResult {
                document,
                version,
                forced: false,
                warnings: ctx.into_warnings(),
            });
        }

        log::error!(
            "{} matches no registered schema (attempted: {})",
            source,
            attempted.join(", ")
        );
        Err(Error::UnrecognizedSchema {
            path: source.to_string(),
            attempted,
        })
    }

    fn convert_forced(
        &self,
        handler: &dyn VersionHandler,
        bytes: &[u8],
        source: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let version = handler.version();
        log::info!("Converting {} as forced PAGE {}", source, version);

        let mut ctx = MapContext::new();
        let document = match handler.convert(bytes, BindingMode::Strict, options, &mut ctx) {
            Err(Error::Binding(reason)) => {
                ctx.warn(
                    "binding",
                    format!("strict binding as PAGE {} failed ({}); retrying relaxed", version, reason),
                );
                handler.convert(bytes, BindingMode::Relaxed, options, &mut ctx)?
            }
            other => other?,
        };

        Ok(ConvertResult {
            document,
            version,
            forced: true,
            warnings: ctx.into_warnings(),
        })
    }
}

impl Default for VersionChain {
    fn default() -> Self {
        Self::with_defaults(default_schema_dir())
    }
}
