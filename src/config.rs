use crate::model::Settings;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tune-remote";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "tune-remote.log";
pub const CONFIG_DIR_ENV: &str = "TUNE_REMOTE_CONFIG_DIR";

pub fn config_root() -> Result<PathBuf> {
    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE")).ok();
    resolve_root(env::var(CONFIG_DIR_ENV).ok(), home)
}

fn resolve_root(override_dir: Option<String>, home: Option<String>) -> Result<PathBuf> {
    if let Some(override_dir) = override_dir {
        return Ok(PathBuf::from(override_dir));
    }
    let home = home.context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn log_path(root: &Path) -> PathBuf {
    root.join(LOG_FILE)
}

pub fn ensure_config_dir(root: &Path) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))
}

/// Reads `settings.json` under `root`; a missing file means defaults.
pub fn load_settings(root: &Path) -> Result<Settings> {
    let path = settings_path(root);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(root: &Path, settings: &Settings) -> Result<()> {
    ensure_config_dir(root)?;
    let path = settings_path(root);
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Writes a default `settings.json` when none exists yet, so there is a file
/// to edit. Returns whether one was written.
pub fn seed_settings(root: &Path) -> Result<bool> {
    if settings_path(root).exists() {
        return Ok(false);
    }
    save_settings(root, &Settings::default())?;
    Ok(true)
}
