// Update command: refresh installed apps to their latest releases

use crate::cache::ReleaseCacheManager;
use crate::commands::install::{install_release, resolve_release};
use crate::config::{self, Config};
use crate::release::is_newer_version;
use crate::state::AppState;
use crate::ui;

pub async fn update(names: Vec<String>) -> anyhow::Result<()> {
    let config = Config::load();
    let cache = ReleaseCacheManager::new(config::cache_dir(), config.ttl_hours);

    let apps = if names.is_empty() {
        AppState::list()
    } else {
        names
            .iter()
            .map(|name| {
                AppState::load(name)
                    .map_err(|_| anyhow::anyhow!("App '{}' is not installed", name))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    if apps.is_empty() {
        ui::dim("No apps installed.");
        return Ok(());
    }

    let mut updated = 0;
    let mut failed = 0;

    for app in apps {
        let pb = ui::spinner(&format!("Checking {}...", app.name));
        let release = match resolve_release(&app.owner, &app.repo, None, &cache).await {
            Ok(release) => release,
            Err(e) => {
                ui::finish_spinner_error(&pb, &format!("{}: {}", app.name, e));
                failed += 1;
                continue;
            }
        };

        if !is_newer_version(&app.version, &release.version) {
            ui::finish_spinner_resolved(&pb, &app.name, "up to date");
            continue;
        }

        ui::finish_spinner_resolved(
            &pb,
            &app.name,
            &format!("{} -> {}", app.version, release.version),
        );
        install_release(&app.name, &release, &config, &cache).await?;
        updated += 1;
    }

    if failed > 0 {
        anyhow::bail!("Updated {} app(s), {} failed", updated, failed);
    }
    ui::success(&format!("Updated {} app(s)", updated));
    Ok(())
}
