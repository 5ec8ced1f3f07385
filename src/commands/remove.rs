// Remove command for uninstalling an app

use crate::config;
use crate::state::AppState;
use crate::ui;
use log::debug;

pub fn remove(name: String) -> anyhow::Result<()> {
    let state =
        AppState::load(&name).map_err(|_| anyhow::anyhow!("App '{}' is not installed", name))?;

    let appimage_path = config::apps_dir().join(&state.appimage);
    if let Err(e) = std::fs::remove_file(&appimage_path) {
        debug!("AppImage already gone: {}", e);
    }

    AppState::delete(&name)?;
    ui::success(&format!("Removed {}", name));
    Ok(())
}
