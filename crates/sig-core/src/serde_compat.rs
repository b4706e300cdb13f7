//! JSON wire format for a single module.
//!
//! Only `primes`, `ell` and `field` are inputs. The polynomial and signature
//! are written for readers but recomputed on import, so a stale payload can
//! never produce a stale hash.

use serde::{Deserialize, Serialize};

use crate::alexander::{AlexanderModule, ModuleOptions, Signature};
use crate::constants::{DEFAULT_ELL, DEFAULT_FIELD};
use crate::error::{Result, SignatureError};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub primes: Vec<u64>,
    #[serde(default = "default_ell")]
    pub ell: u64,
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default)]
    pub alexander_polynomial: String,
    #[serde(default)]
    pub signature: Option<Signature>,
}

fn default_ell() -> u64 {
    DEFAULT_ELL
}

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

impl ModuleRecord {
    pub fn from_module(module: &AlexanderModule) -> Self {
        let signature = module.signature().clone();
        Self {
            primes: module.primes().to_vec(),
            ell: module.ell(),
            field: module.field().to_string(),
            alexander_polynomial: signature.alexander_polynomial.clone(),
            signature: Some(signature),
        }
    }

    /// Rebuild a fresh module from the inputs, ignoring derived fields.
    pub fn into_module(self) -> Result<AlexanderModule> {
        AlexanderModule::with_options(
            &self.primes,
            ModuleOptions {
                ell: self.ell,
                field: self.field,
                ..ModuleOptions::default()
            },
        )
    }
}

impl AlexanderModule {
    pub fn to_record(&self) -> ModuleRecord {
        ModuleRecord::from_module(self)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_record())
            .map_err(|e| SignatureError::MalformedRecord(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: ModuleRecord = serde_json::from_str(json)
            .map_err(|e| SignatureError::MalformedRecord(e.to_string()))?;
        record.into_module()
    }
}
