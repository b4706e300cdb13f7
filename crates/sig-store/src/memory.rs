use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sig_core::{MemoryEntry, ModuleSignature};

/// Result of [`SignatureMemory::store`]. A duplicate is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored { hash: u32 },
    AlreadyPresent { hash: u32 },
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    pub fn hash(&self) -> u32 {
        match *self {
            Self::Stored { hash } | Self::AlreadyPresent { hash } => hash,
        }
    }
}

/// A stored signature and its fingerprint distance to a query.
#[derive(Clone, Debug)]
pub struct SignatureMatch {
    pub signature: Arc<ModuleSignature>,
    pub distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_signatures: usize,
    pub indexed_primes: usize,
    pub index_entries: usize,
}

#[derive(Default)]
struct MemoryInner {
    by_hash: HashMap<u32, Arc<ModuleSignature>>,
    /// Hashes in insertion order, for deterministic scans.
    order: Vec<u32>,
    by_prime: HashMap<u64, Vec<u32>>,
}

impl MemoryInner {
    fn in_order(&self) -> impl Iterator<Item = &Arc<ModuleSignature>> {
        self.order.iter().filter_map(|h| self.by_hash.get(h))
    }
}

/// Hash-keyed signature store with a secondary index by prime.
///
/// Grows only through [`store`](Self::store), which never overwrites; the
/// only removal is [`clear`](Self::clear). Internally locked, so a shared
/// `Arc<SignatureMemory>` can be used from several threads.
#[derive(Default)]
pub struct SignatureMemory {
    inner: RwLock<MemoryInner>,
}

impl SignatureMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the hash is already present. The check and the insert
    /// happen under one write lock.
    pub fn store(&self, signature: Arc<ModuleSignature>) -> StoreOutcome {
        let hash = signature.hash();
        let mut inner = self.inner.write();
        if inner.by_hash.contains_key(&hash) {
            tracing::debug!(hash, "signature already stored");
            return StoreOutcome::AlreadyPresent { hash };
        }

        for &p in signature.primes() {
            inner.by_prime.entry(p).or_default().push(hash);
        }
        inner.order.push(hash);
        inner.by_hash.insert(hash, signature);
        tracing::debug!(hash, total = inner.order.len(), "stored signature");
        StoreOutcome::Stored { hash }
    }

    pub fn get(&self, hash: u32) -> Option<Arc<ModuleSignature>> {
        self.inner.read().by_hash.get(&hash).cloned()
    }

    pub fn has(&self, hash: u32) -> bool {
        self.inner.read().by_hash.contains_key(&hash)
    }

    /// Signatures containing `prime`, in insertion order.
    pub fn find_by_prime(&self, prime: u64) -> Vec<Arc<ModuleSignature>> {
        let inner = self.inner.read();
        inner
            .by_prime
            .get(&prime)
            .map(|hashes| {
                hashes
                    .iter()
                    .filter_map(|h| inner.by_hash.get(h).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `top_k` nearest signatures by fingerprint distance, nearest
    /// first. Signatures whose fingerprints cannot be compared are skipped.
    pub fn find_closest(&self, query: &ModuleSignature, top_k: usize) -> Vec<SignatureMatch> {
        let inner = self.inner.read();
        let mut matches: Vec<SignatureMatch> = inner
            .in_order()
            .filter_map(|candidate| {
                query
                    .distance_to(candidate)
                    .ok()
                    .map(|distance| SignatureMatch {
                        signature: Arc::clone(candidate),
                        distance,
                    })
            })
            .collect();
        tracing::debug!(scanned = inner.order.len(), comparable = matches.len(), "closest scan");

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        matches
    }

    /// All stored signatures equivalent to `query` within `tolerance`.
    pub fn find_equivalent(&self, query: &ModuleSignature, tolerance: f64) -> Vec<Arc<ModuleSignature>> {
        self.inner
            .read()
            .in_order()
            .filter(|candidate| query.is_equivalent_to(candidate, tolerance))
            .cloned()
            .collect()
    }

    /// Every stored signature, in insertion order.
    pub fn signatures(&self) -> Vec<Arc<ModuleSignature>> {
        self.inner.read().in_order().cloned().collect()
    }

    pub fn entries(&self) -> Vec<MemoryEntry> {
        self.inner
            .read()
            .in_order()
            .map(|s| s.to_memory_entry())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MemoryStats {
        let inner = self.inner.read();
        MemoryStats {
            total_signatures: inner.order.len(),
            indexed_primes: inner.by_prime.len(),
            index_entries: inner.by_prime.values().map(Vec::len).sum(),
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.by_hash.clear();
        inner.order.clear();
        inner.by_prime.clear();
    }
}
