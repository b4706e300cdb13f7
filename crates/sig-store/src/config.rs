use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sig_core::{DEFAULT_ELL, DEFAULT_FIELD, EQUIVALENCE_TOLERANCE, MAX_PRIMES, ModuleOptions};

use crate::error::Result;

/// Default result count for resonance queries.
pub const DEFAULT_TOP_K: usize = 5;

/// Extractor settings, loadable from TOML. Missing keys take defaults.
///
/// ```toml
/// ell = 3
/// field = "Q"
/// max_primes = 16
/// tolerance = 0.01
/// top_k = 5
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub ell: u64,
    pub field: String,
    /// Distinct-prime bound; larger sets fail with a resource-limit error.
    /// Clamped to `sig_core::MAX_PRIMES_CEILING`.
    pub max_primes: usize,
    /// Circle-magnitude tolerance for equivalence search.
    pub tolerance: f64,
    pub top_k: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ell: DEFAULT_ELL,
            field: DEFAULT_FIELD.to_string(),
            max_primes: MAX_PRIMES,
            tolerance: EQUIVALENCE_TOLERANCE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl ExtractorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn module_options(&self) -> ModuleOptions {
        ModuleOptions {
            ell: self.ell,
            field: self.field.clone(),
            max_primes: self.max_primes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ExtractorConfig::from_toml_str("").unwrap(), ExtractorConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ExtractorConfig::from_toml_str("ell = 3\nmax_primes = 10\n").unwrap();
        assert_eq!(config.ell, 3);
        assert_eq!(config.max_primes, 10);
        assert_eq!(config.field, DEFAULT_FIELD);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_module_options() {
        let config = ExtractorConfig {
            ell: 5,
            field: "F_5".to_string(),
            ..ExtractorConfig::default()
        };
        let options = config.module_options();
        assert_eq!(options.ell, 5);
        assert_eq!(options.field, "F_5");
        assert_eq!(options.max_primes, MAX_PRIMES);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ExtractorConfig::from_toml_str("ell = \"two\""),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extractor.toml");
        fs::write(&path, "tolerance = 0.5\ntop_k = 2\n").unwrap();
        let config = ExtractorConfig::load(&path).unwrap();
        assert_eq!(config.tolerance, 0.5);
        assert_eq!(config.top_k, 2);
    }
}
