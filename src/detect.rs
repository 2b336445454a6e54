//! PAGE-XML format sniffing.
//!
//! Looks only at the root element; whether the document actually conforms
//! to a version is decided by schema validation in [`crate::convert`].

use crate::binding::parse_xml;
use crate::convert::PageVersion;
use crate::error::Result;
use std::path::Path;

/// Root element name of PAGE content documents.
const PAGE_ROOT: &str = "PcGts";

/// What the root element of a document claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFormat {
    /// Root element local name
    pub root: String,
    /// Root element namespace
    pub namespace: Option<String>,
    /// PAGE version owning the namespace, if known
    pub version: Option<PageVersion>,
}

impl PageFormat {
    /// Whether the root is a `PcGts` element of a known version.
    pub fn is_page(&self) -> bool {
        self.root == PAGE_ROOT && self.version.is_some()
    }
}

impl std::fmt::Display for PageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.version, &self.namespace) {
            (Some(version), _) if self.root == PAGE_ROOT => write!(f, "PAGE {}", version),
            (_, Some(ns)) => write!(f, "<{}> in namespace {}", self.root, ns),
            (_, None) => write!(f, "<{}> without namespace", self.root),
        }
    }
}

/// Detect the format of a file.
///
/// # Example
/// ```no_run
/// use unpage::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("page.xml").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PageFormat> {
    let data = std::fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect the format of document bytes.
///
/// Fails with [`Error::MalformedXml`](crate::Error::MalformedXml) when the
/// bytes are not well-formed XML.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PageFormat> {
    let doc = parse_xml(data)?;
    let root = doc.root_element().tag_name();
    let namespace = root.namespace().map(str::to_string);
    let version = namespace.as_deref().and_then(PageVersion::from_namespace);

    Ok(PageFormat {
        root: root.name().to_string(),
        namespace,
        version,
    })
}

/// Check if a file looks like PAGE-XML.
pub fn is_page_xml<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok_and(|f| f.is_page())
}

/// Check if bytes look like PAGE-XML.
pub fn is_page_xml_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok_and(|f| f.is_page())
}
