//! JSON file output.

use crate::error::{Error, Result};
use crate::model::Document;
use crate::render::{to_json, JsonFormat};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `doc` as JSON to `path`, returning the path actually written.
///
/// The path must end in `.json`. An existing file is never overwritten:
/// the document goes to `name (1).json`, `name (2).json`, ... instead.
pub fn write_json_file(path: impl AsRef<Path>, doc: &Document, format: JsonFormat) -> Result<PathBuf> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !extension.eq_ignore_ascii_case("json") {
        return Err(Error::InvalidOutputExtension {
            path: path.to_path_buf(),
            extension,
        });
    }

    let json = to_json(doc, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut attempt = 0u32;
    loop {
        let candidate = numbered(path, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())?;
                log::info!("Wrote {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("{} exists, trying the next name", candidate.display());
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// `path` itself for attempt 0, else `stem (n).ext`.
fn numbered(path: &Path, attempt: u32) -> PathBuf {
    if attempt == 0 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{} ({}).{}", stem, attempt, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_names() {
        let path = Path::new("out/page.json");
        assert_eq!(numbered(path, 0), PathBuf::from("out/page.json"));
        assert_eq!(numbered(path, 1), PathBuf::from("out/page (1).json"));
        assert_eq!(numbered(path, 12), PathBuf::from("out/page (12).json"));
    }

    #[test]
    fn test_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::empty("page.png", (1, 1));

        for name in ["page.txt", "page"] {
            let path = dir.path().join(name);
            let err = write_json_file(&path, &doc, JsonFormat::Pretty).unwrap_err();
            assert!(matches!(err, Error::InvalidOutputExtension { .. }));
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/page.json");
        let doc = Document::empty("page.png", (1, 1));
        let written = write_json_file(&path, &doc, JsonFormat::Compact).unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }
}
