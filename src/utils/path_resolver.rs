use anyhow::Result;
use std::path::PathBuf;

const APP_DIR: &str = "onboarding-wizard";

/// Resolve the application data folder (absolute path).
///
/// Honors `ONBOARDING_STATE_DIR` so tests and packaged deployments can pin
/// the location; otherwise uses the platform-local data dir.
pub fn resolve_state_folder() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ONBOARDING_STATE_DIR") {
        let p = PathBuf::from(dir);
        std::fs::create_dir_all(&p)
            .map_err(|e| anyhow::anyhow!("Failed to create state folder: {}", e))?;
        return Ok(p);
    }

    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to resolve local data directory"))?;
    let state_dir = base.join(APP_DIR).join("state");
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create state folder: {}", e))?;
    Ok(state_dir)
}

/// Resolve log folder (absolute path)
pub fn resolve_log_folder() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ONBOARDING_LOG_DIR") {
        let p = PathBuf::from(dir);
        std::fs::create_dir_all(&p)
            .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
        return Ok(p);
    }

    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to resolve local data directory"))?;
    let log_dir = base.join(APP_DIR).join("logs");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder: {}", e))?;
    Ok(log_dir)
}
