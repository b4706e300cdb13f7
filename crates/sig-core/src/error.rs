use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignatureError {
    /// Prime set empty after filtering, or a malformed option such as ℓ < 2.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fingerprint length mismatch: {left} vs {right}")]
    FingerprintMismatch { left: usize, right: usize },

    #[error("malformed module record: {0}")]
    MalformedRecord(String),

    #[error("prime set too large: {count} distinct primes exceeds limit of {limit}")]
    ResourceLimit { count: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, SignatureError>;
