//! Signature memory, the memoizing extractor, and persistence.

pub mod config;
pub mod error;
pub mod extractor;
pub mod json_bridge;
pub mod memory;
pub mod schema;
pub mod store;

pub use config::ExtractorConfig;
pub use error::{Result, StoreError};
pub use extractor::{ExtractOptions, SignatureExtractor, canonical_key};
pub use json_bridge::{ExportEntry, ExportMetadata, MemoryExport};
pub use memory::{MemoryStats, SignatureMatch, SignatureMemory, StoreOutcome};
pub use store::SignatureStore;
