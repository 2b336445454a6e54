//! Rendering of shared documents.

mod json;

pub use json::{to_json, JsonFormat};
