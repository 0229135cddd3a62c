use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub copy_to_clipboard: bool,
    pub show_notification: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            copy_to_clipboard: true,
            show_notification: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Store a normalized base URL. An empty value clears the setting.
    pub fn set_base_url(&mut self, url: &str) -> AppResult<()> {
        let normalized = InputValidator::normalize_base_url(url);
        if normalized.is_empty() {
            self.base_url = None;
            return Ok(());
        }

        InputValidator::validate_base_url(&normalized)?;
        self.base_url = Some(normalized);
        Ok(())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub fn get_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("CodiMD Share");

    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

pub fn load_config() -> AppResult<Config> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> AppResult<Config> {
    if config_path.exists() {
        let config_str = fs::read_to_string(config_path)?;
        let mut config: Config = serde_json::from_str(&config_str).unwrap_or_else(|e| {
            log::warn!("Failed to parse config file: {}. Using defaults.", e);
            Config::default()
        });

        // Hand-edited files may hold a bare host
        config.base_url = config
            .base_url
            .as_deref()
            .map(InputValidator::normalize_base_url)
            .filter(|url| !url.is_empty());

        validate_config(&config)?;

        Ok(config)
    } else {
        let default_config = Config::default();
        save_config_to(config_path, &default_config)?;
        Ok(default_config)
    }
}

pub fn save_config(config: &Config) -> AppResult<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(config_path: &Path, config: &Config) -> AppResult<()> {
    validate_config(config)?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Create backup of existing config
    if config_path.exists() {
        let backup_path = config_path.with_extension("json.bak");
        if let Err(e) = fs::copy(config_path, &backup_path) {
            log::warn!("Failed to create config backup: {}", e);
        }
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(config_path, config_str)?;

    log::info!("Configuration saved to {}", config_path.display());
    Ok(())
}

pub fn reset_config_at(config_path: &Path) -> AppResult<Config> {
    if config_path.exists() {
        let backup_path = config_path.with_extension("json.reset_backup");
        fs::copy(config_path, &backup_path)?;
        log::info!("Existing config backed up to {}", backup_path.display());
    }

    let default_config = Config::default();
    save_config_to(config_path, &default_config)?;

    log::info!("Configuration reset to defaults");
    Ok(default_config)
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    if let Some(base_url) = &config.base_url {
        InputValidator::validate_base_url(base_url)?;
    }

    let valid_log_levels = ["off", "error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(AppError::validation("log_level", "Must be a valid log level"));
    }

    Ok(())
}

/// Directory holding spooled uploads.
pub fn get_temp_directory() -> AppResult<PathBuf> {
    let temp_dir = std::env::temp_dir().join("codimd_share");
    fs::create_dir_all(&temp_dir)?;
    Ok(temp_dir)
}

/// Spool files are removed when their outcome is dropped, but a crash can
/// leave some behind; sweep anything older than `max_age`.
pub fn cleanup_stale_spool_files(directory: &Path, max_age: Duration) -> AppResult<usize> {
    if !directory.exists() {
        return Ok(0);
    }

    let cutoff_time = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };

        if modified <= cutoff_time {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to remove stale spool file {}: {}", path.display(), e);
            } else {
                log::debug!("Removed stale spool file: {}", path.display());
                removed += 1;
            }
        }
    }

    Ok(removed)
}
