use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sig_core::{AlexanderModule, ModuleSignature, now_timestamp};

use crate::error::{Result, StoreError};
use crate::memory::SignatureMemory;

/// One exported signature: the flat projection, without module internals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub hash: u32,
    pub primes: Vec<u64>,
    pub fingerprint: Vec<f64>,
    pub polynomial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub created: String,
    pub total_entries: usize,
}

/// Durable layout of a [`SignatureMemory`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryExport {
    pub entries: Vec<ExportEntry>,
    pub metadata: ExportMetadata,
}

impl SignatureMemory {
    pub fn to_export(&self) -> MemoryExport {
        let entries: Vec<ExportEntry> = self
            .signatures()
            .iter()
            .map(|s| ExportEntry {
                hash: s.hash(),
                primes: s.primes().to_vec(),
                fingerprint: s.fingerprint().to_vec(),
                polynomial: s.alexander_polynomial().to_string(),
            })
            .collect();
        MemoryExport {
            metadata: ExportMetadata {
                created: now_timestamp(),
                total_entries: entries.len(),
            },
            entries,
        }
    }

    /// Rebuild a memory from an export. Each entry is re-derived from its
    /// primes through `factory`; exported fingerprints are not trusted.
    pub fn from_export<F>(export: &MemoryExport, factory: F) -> Result<Self>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let memory = Self::new();
        memory.import_export(export, factory)?;
        Ok(memory)
    }

    /// Store every entry of `export` into this memory. Returns how many
    /// were new.
    pub fn import_export<F>(&self, export: &MemoryExport, factory: F) -> Result<usize>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let mut stored = 0;
        for entry in &export.entries {
            let signature = ModuleSignature::new(factory(&entry.primes)?);
            if signature.hash() != entry.hash {
                tracing::warn!(
                    exported = entry.hash,
                    derived = signature.hash(),
                    "re-derived hash differs from export"
                );
            }
            if self.store(Arc::new(signature)).is_stored() {
                stored += 1;
            }
        }
        tracing::info!(entries = export.entries.len(), stored, "imported signatures");
        Ok(stored)
    }

    pub fn export_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_export())
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    pub fn import_json_str<F>(&self, json: &str, factory: F) -> Result<usize>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let export: MemoryExport = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        self.import_export(&export, factory)
    }

    pub fn import_json_file<F>(&self, path: &Path, factory: F) -> Result<usize>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json, factory)
    }

    /// Fresh memory populated from a JSON export.
    pub fn from_json<F>(json: &str, factory: F) -> Result<Self>
    where
        F: Fn(&[u64]) -> sig_core::Result<AlexanderModule>,
    {
        let memory = Self::new();
        memory.import_json_str(json, factory)?;
        Ok(memory)
    }
}
