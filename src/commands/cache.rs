// Cache command: stats, cleanup, and clearing of the release cache

use crate::cache::ReleaseCacheManager;
use crate::config::{self, Config};
use crate::github::parse_repo_spec;
use crate::ui;

fn manager() -> ReleaseCacheManager {
    ReleaseCacheManager::new(config::cache_dir(), Config::load().ttl_hours)
}

pub async fn stats() -> anyhow::Result<()> {
    let stats = manager().get_cache_stats().await;

    ui::header("Release cache");
    ui::line(&format!("  total:     {}", stats.total));
    ui::line(&format!("  fresh:     {}", stats.fresh));
    ui::line(&format!("  expired:   {}", stats.expired));
    ui::line(&format!("  corrupted: {}", stats.corrupted));
    if let Some(error) = &stats.error {
        ui::warning(&format!("cache directory error: {}", error));
    }
    Ok(())
}

pub async fn clean(days: u64) -> anyhow::Result<()> {
    let removed = manager().cleanup_expired_cache(days).await;
    ui::success(&format!("Removed {} cache entr{}", removed, plural_y(removed)));
    Ok(())
}

pub async fn clear(target: Option<String>) -> anyhow::Result<()> {
    let removed = match target {
        Some(spec) => {
            let (owner, repo, _) = parse_repo_spec(&spec)?;
            manager().clear_cache(Some(&owner), Some(&repo)).await
        }
        None => manager().clear_cache(None, None).await,
    };
    ui::success(&format!("Removed {} cache entr{}", removed, plural_y(removed)));
    Ok(())
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}
