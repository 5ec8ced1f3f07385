// Release cache: per-repo JSON records with TTL and persisted checksum data

use crate::github::Release;
use crate::verify::HashAlgorithm;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Partition for cached release lookups, so a prerelease fetch never
/// shadows a stable one for the same repo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Stable,
    Prerelease,
    Latest,
}

impl CacheType {
    pub const ALL: [CacheType; 3] = [CacheType::Stable, CacheType::Prerelease, CacheType::Latest];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Stable => "stable",
            CacheType::Prerelease => "prerelease",
            CacheType::Latest => "latest",
        }
    }
}

/// Parsed, verified contents of one checksum file, persisted for reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumFileResult {
    /// URL the checksum file was downloaded from.
    pub source: String,
    pub filename: String,
    pub algorithm: HashAlgorithm,
    /// Filename -> lowercase hex hash.
    pub hashes: BTreeMap<String, String>,
}

/// Release data as stored on disk.
///
/// `checksum_files` stays absent (not an empty list) for records written
/// before any checksum file was verified, so callers can distinguish
/// "never checked" from "checked, found nothing".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRelease {
    #[serde(flatten)]
    pub release: Release,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_files: Option<Vec<ChecksumFileResult>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub cached_at: DateTime<Utc>,
    pub ttl_hours: u64,
    pub release_data: CachedRelease,
}

impl CacheRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.cached_at + Duration::hours(self.ttl_hours as i64) < now
    }
}

/// Classification of every cache file on disk.
#[derive(Debug, Default, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub expired: usize,
    pub corrupted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Manages the on-disk release cache directory.
///
/// Infrastructure failures (unreadable files, corrupt JSON, write errors)
/// are logged and degraded to cache-miss behavior; they never propagate
/// into the user-facing operation.
pub struct ReleaseCacheManager {
    cache_dir: PathBuf,
    ttl_hours: u64,
}

impl ReleaseCacheManager {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl_hours,
        }
    }

    fn entry_path(&self, owner: &str, repo: &str, cache_type: CacheType) -> PathBuf {
        self.cache_dir
            .join(format!("{}_{}_{}.json", owner, repo, cache_type.as_str()))
    }

    async fn read_record(&self, path: &Path) -> Option<CacheRecord> {
        let text = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str(&text) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Corrupted cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn write_record(&self, path: &Path, record: &CacheRecord) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let text = serde_json::to_string_pretty(record)?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    /// Cache a fetched release. Checksum data already persisted for the
    /// same tag is carried over; a new tag drops it.
    pub async fn save_release_data(
        &self,
        release: &Release,
        cache_type: CacheType,
    ) -> anyhow::Result<()> {
        let path = self.entry_path(&release.owner, &release.repo, cache_type);

        let checksum_files = match self.read_record(&path).await {
            Some(existing)
                if existing.release_data.release.original_tag_name == release.original_tag_name =>
            {
                existing.release_data.checksum_files
            }
            _ => None,
        };

        let record = CacheRecord {
            cached_at: Utc::now(),
            ttl_hours: self.ttl_hours,
            release_data: CachedRelease {
                release: release.clone(),
                checksum_files,
            },
        };
        self.write_record(&path, &record).await
    }

    /// Load a cached release if present and not past its TTL.
    pub async fn get_cached_release(
        &self,
        owner: &str,
        repo: &str,
        cache_type: CacheType,
    ) -> Option<CachedRelease> {
        let path = self.entry_path(owner, repo, cache_type);
        let record = self.read_record(&path).await?;
        if record.is_expired(Utc::now()) {
            debug!("Cache entry {} is expired", path.display());
            return None;
        }
        Some(record.release_data)
    }

    /// Checksum files previously verified for `(owner, repo, tag)`,
    /// regardless of record freshness: hash data for a published tag does
    /// not change.
    pub async fn get_checksum_files(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Option<Vec<ChecksumFileResult>> {
        for cache_type in CacheType::ALL {
            let path = self.entry_path(owner, repo, cache_type);
            if let Some(record) = self.read_record(&path).await
                && record.release_data.release.original_tag_name == tag
                && let Some(files) = record.release_data.checksum_files
            {
                return Some(files);
            }
        }
        None
    }

    /// Persist verified checksum-file contents into the cached release
    /// record for `(owner, repo, tag)`.
    ///
    /// Strictly additive: returns false without creating anything when no
    /// cache entry exists for that release. An existing entry with the same
    /// source URL is overwritten.
    pub async fn store_checksum_file(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        result: &ChecksumFileResult,
    ) -> bool {
        let mut updated = false;

        for cache_type in CacheType::ALL {
            let path = self.entry_path(owner, repo, cache_type);
            let Some(mut record) = self.read_record(&path).await else {
                continue;
            };
            if record.release_data.release.original_tag_name != tag {
                continue;
            }

            let files = record.release_data.checksum_files.get_or_insert_with(Vec::new);
            if let Some(existing) = files.iter_mut().find(|f| f.source == result.source) {
                *existing = result.clone();
            } else {
                files.push(result.clone());
            }

            match self.write_record(&path, &record).await {
                Ok(()) => updated = true,
                Err(e) => warn!("Failed to update cache entry {}: {}", path.display(), e),
            }
        }

        updated
    }

    async fn cache_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Remove entries older than the threshold, along with files that no
    /// longer parse as JSON. Returns the number of files removed.
    pub async fn cleanup_expired_cache(&self, max_age_days: u64) -> usize {
        let files = match self.cache_files().await {
            Ok(files) => files,
            Err(_) => return 0,
        };

        let cutoff = Utc::now() - Duration::days(max_age_days as i64);
        let mut removed = 0;

        for path in files {
            let stale = match self.read_record(&path).await {
                Some(record) => record.cached_at < cutoff,
                // Unparseable records are corrupted, not fatal
                None => true,
            };
            if stale {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Failed to remove cache entry {}: {}", path.display(), e),
                }
            }
        }

        removed
    }

    /// Classify every cache file as fresh, expired, or corrupted. Never
    /// fails; directory-level I/O errors are captured in the stats.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        let files = match self.cache_files().await {
            Ok(files) => files,
            Err(e) if e.downcast_ref::<std::io::Error>().map(|io| io.kind())
                == Some(std::io::ErrorKind::NotFound) =>
            {
                return stats;
            }
            Err(e) => {
                stats.error = Some(e.to_string());
                return stats;
            }
        };

        let now = Utc::now();
        for path in files {
            stats.total += 1;
            match self.read_record(&path).await {
                Some(record) if record.is_expired(now) => stats.expired += 1,
                Some(_) => stats.fresh += 1,
                None => stats.corrupted += 1,
            }
        }

        stats
    }

    /// Delete cache entries for one repository, or all entries. Missing
    /// files are not an error. Returns the number of files removed.
    pub async fn clear_cache(&self, owner: Option<&str>, repo: Option<&str>) -> usize {
        let targets: Vec<PathBuf> = match (owner, repo) {
            (Some(owner), Some(repo)) => CacheType::ALL
                .iter()
                .map(|t| self.entry_path(owner, repo, *t))
                .collect(),
            _ => self.cache_files().await.unwrap_or_default(),
        };

        let mut removed = 0;
        for path in targets {
            if tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        removed
    }
}
