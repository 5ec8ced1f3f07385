// Artifact verifier: streaming hash computation and digest comparison

use crate::verify::{HashAlgorithm, VerifyError, parser};
use sha2::{Digest, Sha256, Sha512};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Verifier bound to one local artifact file.
pub struct Verifier {
    path: PathBuf,
    default_algorithm: HashAlgorithm,
}

impl Verifier {
    pub fn new(path: impl Into<PathBuf>, default_algorithm: HashAlgorithm) -> Self {
        Self {
            path: path.into(),
            default_algorithm,
        }
    }

    #[allow(dead_code)] // Part of the verifier's public surface
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Compute the file's hash under the named algorithm, streaming through
    /// a fixed-size buffer. Artifacts run to hundreds of megabytes, so the
    /// file is never held in memory at once.
    pub async fn compute_hash(&self, algorithm: HashAlgorithm) -> Result<String, VerifyError> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        let mut buf = vec![0u8; READ_BUF_SIZE];

        let hash_hex = match algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                loop {
                    let n = file.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode(hasher.finalize())
            }
            HashAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                loop {
                    let n = file.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode(hasher.finalize())
            }
        };

        Ok(hash_hex)
    }

    /// Verify the file against an expected digest string.
    ///
    /// The expected value may carry an `algo:` prefix ("sha256:<hex>"),
    /// which selects the algorithm; a bare hex digest is compared as
    /// SHA-256. Comparison is case-insensitive on the hex. Returns the
    /// computed hash on success.
    pub async fn verify_digest(&self, expected: &str) -> Result<String, VerifyError> {
        let (algorithm, expected_hex) = split_digest(expected, self.default_algorithm)?;
        let computed = self.compute_hash(algorithm).await?;

        if computed.eq_ignore_ascii_case(expected_hex.trim()) {
            Ok(computed)
        } else {
            Err(VerifyError::HashMismatch {
                filename: self.file_name(),
                expected: expected_hex.to_lowercase(),
                computed,
            })
        }
    }

    /// Infer the hash algorithm from a checksum filename suffix.
    pub fn detect_hash_type_from_filename(name: &str) -> Option<HashAlgorithm> {
        let lower = name.to_lowercase();
        if lower.ends_with(".sha512") || lower.ends_with(".sha512sum") {
            Some(HashAlgorithm::Sha512)
        } else if lower.ends_with(".sha256") || lower.ends_with(".sha256sum") {
            Some(HashAlgorithm::Sha256)
        } else {
            None
        }
    }

    /// Algorithm for a checksum filename, falling back to the configured
    /// default when the suffix is inconclusive.
    pub fn hash_type_for(&self, name: &str) -> HashAlgorithm {
        Self::detect_hash_type_from_filename(name).unwrap_or(self.default_algorithm)
    }

    /// Look up the expected hash for `target` in checksum file content.
    ///
    /// Absence of the target is an expected, recoverable outcome at this
    /// layer and maps to None; only corrupt data (malformed base64 in a
    /// YAML manifest) is an error.
    pub fn parse_checksum_file(
        &self,
        content: &str,
        target: &str,
        algorithm: HashAlgorithm,
    ) -> Result<Option<String>, VerifyError> {
        parser::find_hash(content, target, algorithm, parser::detect_format(content))
    }
}

/// Split an expected digest into (algorithm, hex), honoring an optional
/// `algo:` prefix.
fn split_digest(
    expected: &str,
    default_algorithm: HashAlgorithm,
) -> Result<(HashAlgorithm, &str), VerifyError> {
    match expected.split_once(':') {
        Some((prefix, hex)) => {
            let algorithm = HashAlgorithm::parse_name(prefix)
                .ok_or_else(|| VerifyError::UnsupportedAlgorithm(prefix.to_string()))?;
            Ok((algorithm, hex))
        }
        None => Ok((default_algorithm, expected)),
    }
}
