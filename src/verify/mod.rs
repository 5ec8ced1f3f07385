// Verification subsystem: checksum parsing, candidate prioritization,
// hash computation, and concurrent method orchestration

pub mod orchestrator;
pub mod parser;
pub mod priority;
pub mod verifier;

pub use orchestrator::{
    ChecksumDownloader, ConfigUpdate, MethodResult, VerificationContext,
    execute_all_verification_methods,
};
pub use verifier::Verifier;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hash algorithms supported for artifact verification.
///
/// Serialized uppercase ("SHA256") to match the cache record format;
/// lowercase spellings are accepted on load for config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashAlgorithm {
    #[serde(alias = "sha256")]
    Sha256,
    #[serde(alias = "sha512")]
    Sha512,
}

impl HashAlgorithm {
    /// Lowercase prefix used in `algo:hex` hash strings.
    pub fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Canonical uppercase name, as stored in cache records.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Parse an algorithm name ("sha256", "SHA-512", ...), case-insensitive.
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.trim().replace('-', "").to_lowercase().as_str() {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Expected hex digest length for this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by the verification subsystem.
///
/// Per-method failures (hash mismatch against one source, a target missing
/// from a checksum list) are recorded as failed `MethodResult`s and do not
/// surface here; these variants are for data-format errors and the final
/// install-aborting decision.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid base64 hash: {0}")]
    InvalidBase64(String),

    #[error("Hash mismatch for {filename}: expected {expected}, computed {computed}")]
    HashMismatch {
        filename: String,
        expected: String,
        computed: String,
    },

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Verification failed for {filename}: {details}")]
    NoMethodPassed { filename: String, details: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
