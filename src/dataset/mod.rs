//! Batch dataset building from a replay manifest

pub mod manifest;
pub mod service;

pub use manifest::{load_manifest, parse_manifest, ManifestError, ReplayJob};
pub use service::{BatchReport, DatasetBuilder};
