//! Error types for unpage library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unpage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PAGE-XML conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An XSD file is missing or could not be compiled.
    #[error("Failed to load schema {}: {reason}", path.display())]
    SchemaLoad {
        /// Path of the schema file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// The input is not well-formed XML.
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// No registered schema version validated the document.
    #[error("No registered schema matches {path} (attempted: {})", attempted.join(", "))]
    UnrecognizedSchema {
        /// Source path (or a label for in-memory input)
        path: String,
        /// Versions tried, in chain order
        attempted: Vec<String>,
    },

    /// The document could not be bound to the version's object tree.
    #[error("Binding error: {0}")]
    Binding(String),

    /// The page element lacks its pixel width or height.
    #[error("Page is missing imageWidth/imageHeight")]
    MissingPageDimensions,

    /// The schema version is registered but has no mapper yet.
    #[error("Schema version {0} is recognized but not implemented")]
    VersionNotImplemented(String),

    /// A forced version name did not name a registered version.
    #[error("Unknown schema version: {0}")]
    UnknownVersion(String),

    /// Output files must carry the `.json` extension.
    #[error("Output file {} must have the extension [.json], but it is: [{extension}]", path.display())]
    InvalidOutputExtension {
        /// Rejected path
        path: PathBuf,
        /// The extension found (empty if none)
        extension: String,
    },

    /// Error during JSON rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error writing to a document store.
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error rejects only the current document.
    ///
    /// Callers processing many files keep going after these; every other
    /// error points at a configuration problem.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedXml(_)
                | Error::UnrecognizedSchema { .. }
                | Error::Binding(_)
                | Error::MissingPageDimensions
                | Error::VersionNotImplemented(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingPageDimensions;
        assert_eq!(err.to_string(), "Page is missing imageWidth/imageHeight");

        let err = Error::UnrecognizedSchema {
            path: "scan.xml".to_string(),
            attempted: vec!["2019-07-15".to_string(), "2017-07-15".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No registered schema matches scan.xml (attempted: 2019-07-15, 2017-07-15)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_document_errors() {
        assert!(Error::MissingPageDimensions.is_document_error());
        assert!(Error::Binding("x".into()).is_document_error());
        assert!(!Error::SchemaLoad {
            path: PathBuf::from("a.xsd"),
            reason: "missing".into()
        }
        .is_document_error());
        assert!(!Error::InvalidOutputExtension {
            path: PathBuf::from("a.txt"),
            extension: "txt".into()
        }
        .is_document_error());
    }
}
