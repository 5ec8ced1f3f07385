// List command for showing installed apps

use crate::state::AppState;
use crate::ui;

pub fn list() -> anyhow::Result<()> {
    let apps = AppState::list();

    if apps.is_empty() {
        ui::dim("No apps installed.");
        return Ok(());
    }

    for app in &apps {
        let status = if app.verification.warning().is_some() {
            "unverified"
        } else if app.verification.passed() {
            "verified"
        } else {
            "verification failed"
        };
        ui::line(&format!(
            "{}  {}  {}/{}  ({})",
            app.name, app.version, app.owner, app.repo, status
        ));
    }
    ui::dim(&format!("{} app(s) installed", apps.len()));
    Ok(())
}
