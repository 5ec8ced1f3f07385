// Verification orchestrator: concurrent method fan-out and result merging

use crate::cache::{ChecksumFileResult, ReleaseCacheManager};
use crate::config::Config;
use crate::constants::{METHOD_CHECKSUM_FILE, METHOD_DIGEST};
use crate::github::Asset;
use crate::release::ChecksumFileInfo;
use crate::ui::ProgressReporter;
use crate::verify::{HashAlgorithm, VerifyError, Verifier, parser, priority};
use async_trait::async_trait;
use futures::future::{BoxFuture, join_all};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Download collaborator for checksum file content.
#[async_trait]
pub trait ChecksumDownloader: Send + Sync {
    async fn download_checksum_file(&self, url: &str) -> anyhow::Result<String>;
}

/// Outcome of one verification method invocation. Immutable once produced.
#[derive(Debug, Clone)]
pub struct MethodResult {
    pub passed: bool,
    /// Expected hash (or algorithm-prefixed descriptor) the method compared
    /// against.
    pub hash: String,
    pub details: String,
    pub computed_hash: Option<String>,
    pub url: Option<String>,
    pub hash_type: Option<HashAlgorithm>,
}

impl MethodResult {
    fn failed(details: String) -> Self {
        Self {
            passed: false,
            hash: String::new(),
            details,
            computed_hash: None,
            url: None,
            hash_type: None,
        }
    }
}

/// Typed app-state fragment produced by a verification run.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// The release API digest matched the artifact.
    pub digest: bool,
    /// Name of the checksum file that verified the artifact.
    pub checksum_file: Option<String>,
}

/// Working state for one artifact's verification run.
///
/// Created per verification call, populated by the orchestrator, and read
/// by the caller once the run completes.
#[derive(Debug)]
pub struct VerificationContext {
    pub app_name: String,
    pub file_path: PathBuf,
    pub asset: Asset,
    pub owner: String,
    pub repo: String,
    pub tag_name: String,
    pub checksum_files: Vec<ChecksumFileInfo>,
    pub has_digest: bool,
    pub verification_methods: BTreeMap<&'static str, MethodResult>,
    pub updated_config: ConfigUpdate,
}

impl VerificationContext {
    pub fn new(
        app_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
        asset: Asset,
        owner: impl Into<String>,
        repo: impl Into<String>,
        tag_name: impl Into<String>,
        checksum_files: Vec<ChecksumFileInfo>,
    ) -> Self {
        let has_digest = asset.digest.is_some();
        Self {
            app_name: app_name.into(),
            file_path: file_path.into(),
            asset,
            owner: owner.into(),
            repo: repo.into(),
            tag_name: tag_name.into(),
            checksum_files,
            has_digest,
            verification_methods: BTreeMap::new(),
            updated_config: ConfigUpdate::default(),
        }
    }

    /// Any one passing method is sufficient evidence of integrity.
    pub fn overall_passed(&self) -> bool {
        self.verification_methods.values().any(|m| m.passed)
    }

    /// Whether any verification method could be attempted at all.
    pub fn attempted(&self) -> bool {
        !self.verification_methods.is_empty()
    }

    /// Human-readable summary of every method's outcome.
    pub fn failure_details(&self) -> String {
        self.verification_methods
            .iter()
            .map(|(key, result)| format!("{}: {}", key, result.details))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The install-aborting error for a run where no method passed.
    pub fn failure(&self) -> VerifyError {
        VerifyError::NoMethodPassed {
            filename: self.asset.name.clone(),
            details: self.failure_details(),
        }
    }
}

enum MethodOutcome {
    Digest(MethodResult),
    ChecksumFile {
        filename: String,
        result: MethodResult,
        to_store: Option<ChecksumFileResult>,
    },
}

/// Run every applicable verification method for the context's artifact.
///
/// The digest check and the single best checksum-file check run
/// concurrently and independently; neither failure aborts the other.
/// Task errors are converted to failed `MethodResult`s at the join
/// boundary, so nothing raises across it. Results, the typed config
/// fragment, and (on a fresh checksum-file pass) the persisted cache
/// entry are merged deterministically after all tasks complete.
pub async fn execute_all_verification_methods(
    ctx: &mut VerificationContext,
    downloader: &dyn ChecksumDownloader,
    cache: &ReleaseCacheManager,
    config: &Config,
    reporter: &dyn ProgressReporter,
) {
    debug!("Running verification methods for {}", ctx.app_name);

    let mut tasks: Vec<BoxFuture<'_, (&'static str, anyhow::Result<Option<MethodOutcome>>)>> =
        Vec::new();

    if ctx.has_digest && let Some(digest) = ctx.asset.digest.clone() {
        // A bare digest with no algorithm prefix is compared as SHA-256.
        let verifier = Verifier::new(&ctx.file_path, HashAlgorithm::Sha256);
        reporter.task_start(METHOD_DIGEST);
        tasks.push(Box::pin(async move {
            let outcome = run_digest_method(&verifier, &digest)
                .await
                .map(|r| Some(MethodOutcome::Digest(r)));
            (METHOD_DIGEST, outcome)
        }));
    }

    // Only the single highest-priority candidate is ever fetched; the
    // rest would be redundant downloads.
    let best = if ctx.checksum_files.is_empty() {
        None
    } else {
        Some(priority::prioritize(&ctx.checksum_files, &ctx.asset.name).swap_remove(0))
    };

    if let Some(info) = best {
        reporter.task_start(METHOD_CHECKSUM_FILE);
        let target = ctx.asset.name.clone();
        let path = ctx.file_path.clone();
        let owner = ctx.owner.clone();
        let repo = ctx.repo.clone();
        let tag = ctx.tag_name.clone();
        let default_algorithm = config.default_algorithm;
        tasks.push(Box::pin(async move {
            let outcome = run_checksum_file_method(
                &info,
                &target,
                &path,
                &owner,
                &repo,
                &tag,
                downloader,
                cache,
                default_algorithm,
            )
            .await
            .map(|(result, to_store)| {
                Some(MethodOutcome::ChecksumFile {
                    filename: info.filename.clone(),
                    result,
                    to_store,
                })
            });
            (METHOD_CHECKSUM_FILE, outcome)
        }));
    }

    // Join-all semantics: every task completes regardless of siblings.
    let outcomes = join_all(tasks).await;

    let mut pending_store: Option<ChecksumFileResult> = None;
    for (key, outcome) in outcomes {
        match outcome {
            // Verifier unavailable for this method; nothing to record.
            Ok(None) => {}
            Ok(Some(MethodOutcome::Digest(result))) => {
                reporter.task_finish(key, result.passed);
                if result.passed {
                    ctx.updated_config.digest = true;
                }
                ctx.verification_methods.insert(key, result);
            }
            Ok(Some(MethodOutcome::ChecksumFile {
                filename,
                result,
                to_store,
            })) => {
                reporter.task_finish(key, result.passed);
                if result.passed {
                    ctx.updated_config.checksum_file = Some(filename);
                    pending_store = to_store;
                }
                ctx.verification_methods.insert(key, result);
            }
            Err(e) => {
                reporter.task_finish(key, false);
                ctx.verification_methods
                    .insert(key, MethodResult::failed(e.to_string()));
            }
        }
    }

    // Verification already succeeded independent of caching, so a failed
    // cache write is logged and swallowed.
    if let Some(result) = pending_store
        && !cache
            .store_checksum_file(&ctx.owner, &ctx.repo, &ctx.tag_name, &result)
            .await
    {
        warn!(
            "No cache entry for {}/{}@{}; verified checksum data not persisted",
            ctx.owner, ctx.repo, ctx.tag_name
        );
    }
}

async fn run_digest_method(verifier: &Verifier, digest: &str) -> anyhow::Result<MethodResult> {
    let hash_type = digest
        .split_once(':')
        .and_then(|(prefix, _)| HashAlgorithm::parse_name(prefix))
        .unwrap_or(HashAlgorithm::Sha256);

    match verifier.verify_digest(digest).await {
        Ok(computed) => Ok(MethodResult {
            passed: true,
            hash: digest.to_string(),
            details: format!("Release API digest matched ({})", hash_type),
            computed_hash: Some(computed),
            url: None,
            hash_type: Some(hash_type),
        }),
        Err(VerifyError::HashMismatch {
            filename,
            expected,
            computed,
        }) => Ok(MethodResult {
            passed: false,
            hash: digest.to_string(),
            details: format!(
                "Hash mismatch for {}: expected {}, computed {}",
                filename, expected, computed
            ),
            computed_hash: Some(computed),
            url: None,
            hash_type: Some(hash_type),
        }),
        Err(e) => Err(e.into()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_checksum_file_method(
    info: &ChecksumFileInfo,
    target: &str,
    path: &Path,
    owner: &str,
    repo: &str,
    tag: &str,
    downloader: &dyn ChecksumDownloader,
    cache: &ReleaseCacheManager,
    default_algorithm: HashAlgorithm,
) -> anyhow::Result<(MethodResult, Option<ChecksumFileResult>)> {
    let verifier = Verifier::new(path, default_algorithm);
    let algorithm_hint = verifier.hash_type_for(&info.filename);

    // Reuse previously verified checksum data for this release when the
    // cache has it; otherwise download and parse the file in full.
    let cached = cache
        .get_checksum_files(owner, repo, tag)
        .await
        .and_then(|files| {
            files
                .into_iter()
                .find(|f| f.source == info.url || f.filename == info.filename)
        });

    let (algorithm, expected, full_parse) = match cached {
        Some(found) => {
            debug!("Using cached checksum data from {}", found.filename);
            let expected = found.hashes.get(target).cloned();
            (found.algorithm, expected, None)
        }
        None => {
            let content = downloader.download_checksum_file(&info.url).await?;
            let expected = verifier.parse_checksum_file(&content, target, algorithm_hint)?;
            let parsed = parser::parse_all(&content, info.format, algorithm_hint)?;
            (parsed.algorithm, expected, Some(parsed.hashes))
        }
    };

    let Some(expected) = expected else {
        return Ok((
            MethodResult {
                passed: false,
                hash: String::new(),
                details: format!("{} does not list {}", info.filename, target),
                computed_hash: None,
                url: Some(info.url.clone()),
                hash_type: Some(algorithm),
            },
            None,
        ));
    };
    let expected = expected.to_lowercase();

    let computed = verifier.compute_hash(algorithm).await?;
    let passed = computed.eq_ignore_ascii_case(&expected);
    let details = if passed {
        format!("{} matched entry in {}", algorithm, info.filename)
    } else {
        format!(
            "Hash mismatch for {}: expected {}, computed {}",
            target, expected, computed
        )
    };

    // Only a fully parsed, hash-confirmed file is ever persisted.
    let to_store = match full_parse {
        Some(hashes) if passed => Some(ChecksumFileResult {
            source: info.url.clone(),
            filename: info.filename.clone(),
            algorithm,
            hashes,
        }),
        _ => None,
    };

    Ok((
        MethodResult {
            passed,
            hash: expected,
            details,
            computed_hash: Some(computed),
            url: Some(info.url.clone()),
            hash_type: Some(algorithm),
        },
        to_store,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheType;
    use crate::github::Release;
    use crate::release::ChecksumFormat;
    use crate::ui::NoopReporter;
    use std::io::Write;
    use std::sync::Mutex;

    // SHA-256 of "hello world"
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const WRONG_SHA256: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    struct MockDownloader {
        responses: BTreeMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockDownloader {
        fn new(responses: Vec<(&str, String)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(url, content)| (url.to_string(), content))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChecksumDownloader for MockDownloader {
        async fn download_checksum_file(&self, url: &str) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unexpected download: {}", url))
        }
    }

    fn artifact_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file
    }

    fn asset(digest: Option<&str>) -> Asset {
        Asset {
            name: "app.AppImage".to_string(),
            size: 11,
            digest: digest.map(String::from),
            browser_download_url: "https://example.com/app.AppImage".to_string(),
        }
    }

    fn checksum_info(filename: &str, format: ChecksumFormat) -> ChecksumFileInfo {
        ChecksumFileInfo {
            filename: filename.to_string(),
            url: format!("https://example.com/{}", filename),
            format,
        }
    }

    fn context(
        file: &tempfile::NamedTempFile,
        digest: Option<&str>,
        checksum_files: Vec<ChecksumFileInfo>,
    ) -> VerificationContext {
        VerificationContext::new(
            "app",
            file.path(),
            asset(digest),
            "owner",
            "repo",
            "v1.0.0",
            checksum_files,
        )
    }

    async fn seeded_cache(dir: &Path) -> ReleaseCacheManager {
        let manager = ReleaseCacheManager::new(dir, 24);
        let release = Release {
            owner: "owner".to_string(),
            repo: "repo".to_string(),
            version: "1.0.0".to_string(),
            prerelease: false,
            original_tag_name: "v1.0.0".to_string(),
            assets: vec![asset(None)],
        };
        manager
            .save_release_data(&release, CacheType::Latest)
            .await
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn test_scenario_digest_passes() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![]);
        let digest = format!("sha256:{}", HELLO_SHA256);
        let mut ctx = context(&file, Some(&digest), vec![]);

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        assert!(ctx.verification_methods[METHOD_DIGEST].passed);
        assert!(ctx.updated_config.digest);
        assert!(ctx.overall_passed());
        assert_eq!(downloader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scenario_checksum_file_passes_and_caches() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![(
            "https://example.com/SHA256SUMS.txt",
            format!("{}  app.AppImage\n", HELLO_SHA256),
        )]);
        let mut ctx = context(
            &file,
            None,
            vec![checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional)],
        );

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        assert!(ctx.verification_methods[METHOD_CHECKSUM_FILE].passed);
        assert_eq!(
            ctx.updated_config.checksum_file.as_deref(),
            Some("SHA256SUMS.txt")
        );
        assert!(ctx.overall_passed());

        let files = cache
            .get_checksum_files("owner", "repo", "v1.0.0")
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].algorithm, HashAlgorithm::Sha256);
        assert_eq!(files[0].hashes["app.AppImage"], HELLO_SHA256);
    }

    #[tokio::test]
    async fn test_scenario_digest_fails_checksum_file_passes() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![(
            "https://example.com/SHA256SUMS.txt",
            format!("{}  app.AppImage\n", HELLO_SHA256),
        )]);
        let digest = format!("sha256:{}", WRONG_SHA256);
        let mut ctx = context(
            &file,
            Some(&digest),
            vec![checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional)],
        );

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        let digest_result = &ctx.verification_methods[METHOD_DIGEST];
        assert!(!digest_result.passed);
        assert!(digest_result.details.contains("expected"));
        assert!(digest_result.details.contains(WRONG_SHA256));
        assert!(ctx.verification_methods[METHOD_CHECKSUM_FILE].passed);
        assert!(ctx.overall_passed());
        assert!(!ctx.updated_config.digest);
    }

    #[tokio::test]
    async fn test_scenario_only_best_candidate_downloaded() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![(
            "https://example.com/app.AppImage.DIGEST",
            format!("{}  app.AppImage\n", HELLO_SHA256),
        )]);
        let mut ctx = context(
            &file,
            None,
            vec![
                checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional),
                checksum_info("app.AppImage.DIGEST", ChecksumFormat::Traditional),
            ],
        );

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        assert!(ctx.overall_passed());
        let calls = downloader.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["https://example.com/app.AppImage.DIGEST"]);
    }

    #[tokio::test]
    async fn test_idempotent_rerun_skips_download() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![(
            "https://example.com/SHA256SUMS.txt",
            format!("{}  app.AppImage\n", HELLO_SHA256),
        )]);
        let candidates = vec![checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional)];

        let mut first = context(&file, None, candidates.clone());
        execute_all_verification_methods(
            &mut first,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;
        assert!(first.overall_passed());
        assert_eq!(downloader.call_count(), 1);

        let mut second = context(&file, None, candidates);
        execute_all_verification_methods(
            &mut second,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;
        assert!(second.overall_passed());
        // Checksum data came from the cache this time
        assert_eq!(downloader.call_count(), 1);
    }

    #[tokio::test]
    async fn test_download_error_becomes_failed_result() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        // No response registered: the downloader errors
        let downloader = MockDownloader::new(vec![]);
        let mut ctx = context(
            &file,
            None,
            vec![checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional)],
        );

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        let result = &ctx.verification_methods[METHOD_CHECKSUM_FILE];
        assert!(!result.passed);
        assert!(result.details.contains("unexpected download"));
        assert!(!ctx.overall_passed());
        assert!(ctx.attempted());
    }

    #[tokio::test]
    async fn test_target_missing_from_checksum_file() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![(
            "https://example.com/SHA256SUMS.txt",
            format!("{}  other.AppImage\n", HELLO_SHA256),
        )]);
        let mut ctx = context(
            &file,
            None,
            vec![checksum_info("SHA256SUMS.txt", ChecksumFormat::Traditional)],
        );

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        let result = &ctx.verification_methods[METHOD_CHECKSUM_FILE];
        assert!(!result.passed);
        assert!(result.details.contains("does not list"));
        // Nothing persisted for a failed lookup
        assert!(
            cache
                .get_checksum_files("owner", "repo", "v1.0.0")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_no_methods_available() {
        let file = artifact_file();
        let dir = tempfile::tempdir().unwrap();
        let cache = seeded_cache(dir.path()).await;
        let downloader = MockDownloader::new(vec![]);
        let mut ctx = context(&file, None, vec![]);

        execute_all_verification_methods(
            &mut ctx,
            &downloader,
            &cache,
            &Config::default(),
            &NoopReporter,
        )
        .await;

        assert!(!ctx.attempted());
        assert!(!ctx.overall_passed());
    }
}
