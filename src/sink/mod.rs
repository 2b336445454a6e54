//! Output sinks for converted documents.
//!
//! A converted [`Document`] can be written to a JSON file, logged, or
//! inserted into a [`DocumentStore`].

mod file;
mod store;

pub use file::write_json_file;
pub use store::{DocumentStore, JsonLinesStore, MemoryStore};

use crate::error::Result;
use crate::model::Document;
use crate::render::{to_json, JsonFormat};

/// Log the pretty-printed document at info level.
pub fn log_document(doc: &Document) -> Result<()> {
    let json = to_json(doc, JsonFormat::Pretty)?;
    log::info!("Converted {}:\n{}", doc.filename, json);
    Ok(())
}
