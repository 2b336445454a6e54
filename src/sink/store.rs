//! Document stores.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A collection documents can be inserted into.
pub trait DocumentStore: Send {
    /// Insert one document.
    fn insert_one(&mut self, document: &Value) -> Result<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn insert_one(&mut self, document: &Value) -> Result<()> {
        (**self).insert_one(document)
    }
}

/// A store keeping documents in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored documents in insertion order.
    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn insert_one(&mut self, document: &Value) -> Result<()> {
        self.documents.push(document.clone());
        Ok(())
    }
}

/// A store appending one compact JSON document per line to a file.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesStore {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::Store(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonLinesStore {
    fn insert_one(&mut self, document: &Value) -> Result<()> {
        let store_error = |e: std::io::Error| Error::Store(format!("{}: {}", self.path.display(), e));
        let line = serde_json::to_string(document)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush())
            .map_err(store_error)?;
        log::debug!("Appended document to {}", self.path.display());
        Ok(())
    }
}
