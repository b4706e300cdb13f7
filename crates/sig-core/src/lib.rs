//! Content-addressable signatures for finite sets of primes.
//!
//! A prime set becomes an [`AlexanderModule`]: a palindromic Laurent
//! polynomial built from Legendre-symbol signs over subsets, a tower of
//! Fitting ideals, and a signature of twelve unit-circle samples folded into
//! a 32-bit hash. [`ModuleSignature`] exposes the samples as a fingerprint
//! for distance search.
//!
//! Zero I/O. The algorithm is fixed and reproducible; it makes no claim to
//! match any external definition of these invariants.

pub mod alexander;
pub mod arith;
pub mod constants;
pub mod crowell;
pub mod error;
pub mod fitting;
pub mod laurent;
pub mod serde_compat;
pub mod signature;
pub mod time;

pub use alexander::{AlexanderModule, CharacteristicValue, ModuleOptions, ModuleStats, Signature};
pub use constants::{
    CIRCLE_SAMPLES, DEFAULT_ELL, DEFAULT_FIELD, EQUIVALENCE_TOLERANCE, MAX_PRIMES, MAX_PRIMES_CEILING,
};
pub use crowell::{CrowellSequence, GroupData};
pub use error::{Result, SignatureError};
pub use fitting::{CircleZero, FittingIdeal, FittingSummary};
pub use laurent::{CircleValue, Coefficient, LaurentPolynomial};
pub use serde_compat::ModuleRecord;
pub use signature::{MemoryEntry, ModuleSignature};
pub use time::{format_unix_millis, now_timestamp};

/// Module with default options.
pub fn create_alexander_module(primes: &[u64]) -> Result<AlexanderModule> {
    AlexanderModule::new(primes)
}

/// Signature with default options.
pub fn extract_signature(primes: &[u64]) -> Result<ModuleSignature> {
    ModuleSignature::from_primes(primes)
}
