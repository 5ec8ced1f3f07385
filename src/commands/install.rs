// Install command: resolve a release, download, verify, and place the app

use crate::cache::{CacheType, ReleaseCacheManager};
use crate::config::{self, Config};
use crate::github::{self, Release};
use crate::http::{self, HttpChecksumDownloader};
use crate::release::{detect_checksum_assets, select_asset_for_platform, select_release};
use crate::state::{AppState, VerificationRecord};
use crate::ui;
use crate::verify::{
    HashAlgorithm, VerificationContext, Verifier, execute_all_verification_methods,
};
use chrono::Utc;
use log::{debug, warn};
use std::path::Path;

pub async fn install(spec: String, name: Option<String>) -> anyhow::Result<()> {
    let (owner, repo, tag) = github::parse_repo_spec(&spec)?;
    let config = Config::load();
    let cache = ReleaseCacheManager::new(config::cache_dir(), config.ttl_hours);

    let app_name = name.unwrap_or_else(|| repo.to_lowercase());

    let pb = ui::spinner(&format!("Resolving {}/{}...", owner, repo));
    let release = match resolve_release(&owner, &repo, tag.as_deref(), &cache).await {
        Ok(release) => {
            ui::finish_spinner_resolved(&pb, &format!("{}/{}", owner, repo), &release.version);
            release
        }
        Err(e) => {
            ui::finish_spinner_error(&pb, &format!("{}/{}", owner, repo));
            return Err(e);
        }
    };

    if release.prerelease && tag.is_none() {
        ui::warning(&format!(
            "No stable release found for {}/{}; using prerelease {}",
            owner, repo, release.version
        ));
    }

    install_release(&app_name, &release, &config, &cache).await
}

/// Resolve the release to install, consulting the cache before the API.
pub async fn resolve_release(
    owner: &str,
    repo: &str,
    tag: Option<&str>,
    cache: &ReleaseCacheManager,
) -> anyhow::Result<Release> {
    match tag {
        Some(tag) => {
            for cache_type in [CacheType::Stable, CacheType::Prerelease] {
                if let Some(cached) = cache.get_cached_release(owner, repo, cache_type).await
                    && select_release(std::slice::from_ref(&cached.release), Some(tag)).is_some()
                {
                    debug!("Using cached release for {}/{}@{}", owner, repo, tag);
                    return Ok(cached.release);
                }
            }

            let release = github::fetch_release_by_tag(owner, repo, tag).await?;
            let cache_type = if release.prerelease {
                CacheType::Prerelease
            } else {
                CacheType::Stable
            };
            if let Err(e) = cache.save_release_data(&release, cache_type).await {
                warn!("Failed to cache release data: {}", e);
            }
            Ok(release)
        }
        None => {
            if let Some(cached) = cache.get_cached_release(owner, repo, CacheType::Latest).await {
                debug!("Using cached latest release for {}/{}", owner, repo);
                return Ok(cached.release);
            }

            let releases = github::fetch_releases(owner, repo).await?;
            let release = select_release(&releases, None).cloned().ok_or_else(|| {
                anyhow::anyhow!("No releases found for '{}/{}'", owner, repo)
            })?;
            if let Err(e) = cache.save_release_data(&release, CacheType::Latest).await {
                warn!("Failed to cache release data: {}", e);
            }
            Ok(release)
        }
    }
}

/// Download, verify, and place one release. Shared by install and update.
pub async fn install_release(
    app_name: &str,
    release: &Release,
    config: &Config,
    cache: &ReleaseCacheManager,
) -> anyhow::Result<()> {
    let asset = select_asset_for_platform(&release.assets, std::env::consts::ARCH)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No AppImage asset found in release '{}' for '{}/{}'",
                release.original_tag_name,
                release.owner,
                release.repo
            )
        })?
        .clone();

    let staging_path = config::downloads_dir().join(&asset.name);
    http::download_to_path(&asset.browser_download_url, &staging_path, asset.size).await?;

    let checksum_files = detect_checksum_assets(release, config.strict_checksum_detection);
    let mut ctx = VerificationContext::new(
        app_name,
        &staging_path,
        asset.clone(),
        &release.owner,
        &release.repo,
        &release.original_tag_name,
        checksum_files,
    );
    execute_all_verification_methods(
        &mut ctx,
        &HttpChecksumDownloader,
        cache,
        config,
        &ui::ConsoleReporter,
    )
    .await;

    if ctx.attempted() && !ctx.overall_passed() {
        for (key, method) in &ctx.verification_methods {
            debug!(
                "{}: expected={} computed={}",
                key,
                method.hash,
                method.computed_hash.as_deref().unwrap_or("-")
            );
        }
        // Failed verification must leave nothing behind.
        if let Err(e) = tokio::fs::remove_file(&staging_path).await {
            warn!("Failed to remove unverified download: {}", e);
        }
        return Err(ctx.failure().into());
    }
    if !ctx.attempted() {
        ui::warning(&format!(
            "No verification data available for {}; installing unverified",
            asset.name
        ));
    } else if let Some(file) = &ctx.updated_config.checksum_file {
        ui::dim(&format!("  verified against {}", file));
    } else if ctx.updated_config.digest {
        ui::dim("  verified against release API digest");
    }

    // Record the artifact hash for later health checks
    let sha256 = Verifier::new(&staging_path, config.default_algorithm)
        .compute_hash(HashAlgorithm::Sha256)
        .await?;

    tokio::fs::create_dir_all(config::apps_dir()).await?;
    let target_path = config::apps_dir().join(&asset.name);
    place_artifact(&staging_path, &target_path).await?;
    make_executable(&target_path)?;

    // Drop the old binary when an update changed the filename
    if let Ok(previous) = AppState::load(app_name)
        && previous.appimage != asset.name
    {
        let old_path = config::apps_dir().join(&previous.appimage);
        if let Err(e) = std::fs::remove_file(&old_path) {
            debug!("Previous AppImage already gone: {}", e);
        }
    }

    let state = AppState {
        name: app_name.to_string(),
        owner: release.owner.clone(),
        repo: release.repo.clone(),
        version: release.version.clone(),
        original_tag_name: release.original_tag_name.clone(),
        appimage: asset.name.clone(),
        sha256,
        installed_at: Utc::now(),
        verification: VerificationRecord::from_context(&ctx),
    };
    state.save()?;

    ui::success(&format!("Installed {} {}", app_name, release.version));
    Ok(())
}

/// Move the verified artifact into place; falls back to copy+remove when
/// the rename crosses filesystems.
async fn place_artifact(staging: &Path, target: &Path) -> anyhow::Result<()> {
    if tokio::fs::rename(staging, target).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(staging, target).await?;
    tokio::fs::remove_file(staging).await?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
