/// Number of unit-circle samples in every signature.
pub const CIRCLE_SAMPLES: usize = 12;

/// Default ℓ for a module when the caller does not supply one.
pub const DEFAULT_ELL: u64 = 2;

/// Informational field tag attached to modules built with default options.
pub const DEFAULT_FIELD: &str = "Q";

/// Largest distinct prime count accepted by default.
/// The Alexander coefficient pass enumerates all 2^r subsets.
pub const MAX_PRIMES: usize = 24;

/// Hard bound on distinct primes, whatever the configured limit.
/// Keeps the 2^r sign table addressable and allocatable.
pub const MAX_PRIMES_CEILING: usize = 30;

/// Default tolerance for signature equivalence on circle magnitudes.
pub const EQUIVALENCE_TOLERANCE: f64 = 0.01;

/// Minimum-modulus threshold below which a circle sample counts as a zero.
pub const CIRCLE_ZERO_THRESHOLD: f64 = 0.1;

/// Number of Fitting degrees summarized in the signature metadata (0..=3).
pub const SIGNATURE_FITTING_DEGREES: usize = 4;

/// Multiplier of the 32-bit signature hash fold.
pub const HASH_MULTIPLIER: i32 = 31;
