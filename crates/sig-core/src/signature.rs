use serde::{Deserialize, Serialize};

use crate::alexander::{AlexanderModule, Signature};
use crate::error::{Result, SignatureError};
use crate::time::now_timestamp;

/// Flattened view of a signature for storage and export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: u32,
    pub primes: Vec<u64>,
    pub fingerprint: Vec<f64>,
    pub polynomial: String,
    pub created: String,
}

/// Read-only view over a module's signature with a numeric fingerprint
/// for similarity search.
#[derive(Debug)]
pub struct ModuleSignature {
    module: AlexanderModule,
    fingerprint: Vec<f64>,
}

impl ModuleSignature {
    /// Forces the module's signature so every derived field is fixed.
    pub fn new(module: AlexanderModule) -> Self {
        let fingerprint = module
            .signature()
            .characteristic_values
            .iter()
            .map(|v| v.abs)
            .collect();
        Self {
            module,
            fingerprint,
        }
    }

    pub fn from_primes(primes: &[u64]) -> Result<Self> {
        AlexanderModule::new(primes).map(Self::new)
    }

    pub fn module(&self) -> &AlexanderModule {
        &self.module
    }

    pub fn signature(&self) -> &Signature {
        self.module.signature()
    }

    pub fn hash(&self) -> u32 {
        self.signature().hash
    }

    pub fn primes(&self) -> &[u64] {
        self.module.primes()
    }

    pub fn alexander_polynomial(&self) -> &str {
        &self.signature().alexander_polynomial
    }

    /// Circle magnitudes in sample order.
    pub fn fingerprint(&self) -> &[f64] {
        &self.fingerprint
    }

    /// Euclidean distance between fingerprints.
    ///
    /// Every signature carries the same number of samples, so a length
    /// mismatch only arises from inconsistent signature data.
    pub fn distance_to(&self, other: &ModuleSignature) -> Result<f64> {
        let (a, b) = (self.fingerprint(), other.fingerprint());
        if a.len() != b.len() {
            return Err(SignatureError::FingerprintMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        Ok(a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt())
    }

    pub fn is_equivalent_to(&self, other: &ModuleSignature, tolerance: f64) -> bool {
        AlexanderModule::equivalent_signatures(self.signature(), other.signature(), tolerance)
    }

    pub fn to_memory_entry(&self) -> MemoryEntry {
        MemoryEntry {
            key: self.hash(),
            primes: self.primes().to_vec(),
            fingerprint: self.fingerprint.clone(),
            polynomial: self.alexander_polynomial().to_string(),
            created: now_timestamp(),
        }
    }
}
