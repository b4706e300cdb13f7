use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sig_core::{AlexanderModule, ModuleSignature};

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::memory::{SignatureMatch, SignatureMemory};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Persist the signature into the backing memory.
    pub store: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { store: true }
    }
}

impl ExtractOptions {
    pub fn no_store() -> Self {
        Self { store: false }
    }
}

type Slot = Arc<Mutex<Option<Arc<ModuleSignature>>>>;

/// Cache key for a prime list: ascending order, comma-joined.
/// Duplicates and non-primes are kept as given.
pub fn canonical_key(primes: &[u64]) -> String {
    let mut sorted = primes.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute-or-fetch facade over [`SignatureMemory`].
///
/// At most one module is built per canonical key for the lifetime of the
/// extractor, including under concurrent misses: each key has its own slot
/// lock, and the map lock is held only long enough to find the slot.
pub struct SignatureExtractor {
    config: ExtractorConfig,
    cache: Mutex<HashMap<String, Slot>>,
    memory: Arc<SignatureMemory>,
}

impl Default for SignatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureExtractor {
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self::with_config_and_memory(config, Arc::new(SignatureMemory::new()))
    }

    pub fn with_memory(memory: Arc<SignatureMemory>) -> Self {
        Self::with_config_and_memory(ExtractorConfig::default(), memory)
    }

    pub fn with_config_and_memory(config: ExtractorConfig, memory: Arc<SignatureMemory>) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
            memory,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<SignatureMemory> {
        &self.memory
    }

    /// Cached signature for `primes`, computing it on first use.
    ///
    /// Any ordering of the same list returns the same `Arc`. Only the call
    /// that computes the signature stores it, and only when
    /// `options.store` is set; a cache hit never touches memory. Invalid or
    /// oversized prime sets fail and leave nothing cached.
    pub fn extract(&self, primes: &[u64], options: ExtractOptions) -> Result<Arc<ModuleSignature>> {
        let key = canonical_key(primes);
        let slot = self.slot(&key);
        let mut cached = slot.lock();

        if let Some(signature) = cached.as_ref() {
            tracing::debug!(key = %key, "extractor cache hit");
            return Ok(Arc::clone(signature));
        }

        tracing::debug!(key = %key, "extractor cache miss");
        let module = match AlexanderModule::with_options(primes, self.config.module_options()) {
            Ok(module) => module,
            Err(e) => {
                drop(cached);
                self.release_empty_slot(&key, &slot);
                return Err(e.into());
            }
        };
        let signature = Arc::new(ModuleSignature::new(module));
        *cached = Some(Arc::clone(&signature));

        if options.store {
            self.memory.store(Arc::clone(&signature));
        }
        Ok(signature)
    }

    pub fn extract_batch<I, P>(&self, prime_sets: I) -> Result<Vec<Arc<ModuleSignature>>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u64]>,
    {
        prime_sets
            .into_iter()
            .map(|primes| self.extract(primes.as_ref(), ExtractOptions::default()))
            .collect()
    }

    /// Nearest stored signatures to `primes`. The query itself is not stored.
    /// `top_k` falls back to the configured default.
    pub fn find_resonant(&self, primes: &[u64], top_k: Option<usize>) -> Result<Vec<SignatureMatch>> {
        let query = self.extract(primes, ExtractOptions::no_store())?;
        Ok(self
            .memory
            .find_closest(&query, top_k.unwrap_or(self.config.top_k)))
    }

    /// Stored signatures equivalent to `primes` at the configured tolerance.
    pub fn find_equivalent(&self, primes: &[u64]) -> Result<Vec<Arc<ModuleSignature>>> {
        let query = self.extract(primes, ExtractOptions::no_store())?;
        Ok(self.memory.find_equivalent(&query, self.config.tolerance))
    }

    /// The single nearest stored signature, if any.
    pub fn get_alignment_target(&self, primes: &[u64]) -> Result<Option<SignatureMatch>> {
        Ok(self.find_resonant(primes, Some(1))?.into_iter().next())
    }

    /// Drop the local cache. The backing memory is untouched.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of keys with a computed signature.
    pub fn cache_len(&self) -> usize {
        self.cache
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    fn slot(&self, key: &str) -> Slot {
        let mut cache = self.cache.lock();
        Arc::clone(cache.entry(key.to_string()).or_default())
    }

    /// Drop `key` after a failed computation, unless another caller has
    /// since filled, replaced or started computing its slot.
    fn release_empty_slot(&self, key: &str, slot: &Slot) {
        let mut cache = self.cache.lock();
        let removable = cache.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_some_and(|c| c.is_none())
        });
        if removable {
            cache.remove(key);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.cache.lock().len()
    }
}
