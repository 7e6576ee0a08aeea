use anyhow::{Context, Result};
use gesture_shared::Settings;
use std::fs;
use std::path::Path;

/// Read the settings file; a missing file yields the defaults
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        log::info!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let settings = Settings::from_json(&json)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;
    gesture_detector::validate_settings(&settings.detector)
        .with_context(|| format!("Invalid detector settings in {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let json = settings.to_json()?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Settings saved to {}", path.display());
    Ok(())
}
