//! Engine configuration
//!
//! Loaded from a JSON or YAML file (chosen by extension), then overridden by
//! `LAB_QUALITY_*` environment variables. A missing file is created with the
//! defaults.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::collaborators::HttpApi60fCorrector;
use crate::error::{CollaboratorError, ConfigError};

pub const ENV_API60F_URL: &str = "LAB_QUALITY_API60F_URL";
pub const ENV_API60F_TIMEOUT_SECS: &str = "LAB_QUALITY_API60F_TIMEOUT_SECS";
pub const ENV_UTC_OFFSET_MINUTES: &str = "LAB_QUALITY_UTC_OFFSET_MINUTES";
pub const ENV_LOG: &str = "LAB_QUALITY_LOG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Endpoint of the API-60F correction service; hydrometer comparisons are
    /// indeterminate without it
    pub api60f_url: Option<String>,
    pub api60f_timeout_secs: u64,
    /// Offset of the laboratory calendar from UTC
    pub utc_offset_minutes: i32,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api60f_url: None,
            api60f_timeout_secs: 10,
            utc_offset_minutes: 0,
            log_filter: "lab_quality=info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn calendar(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| ConfigError::InvalidValue {
            key: "utc_offset_minutes",
            value: self.utc_offset_minutes.to_string(),
        })
    }

    pub fn api60f_timeout(&self) -> Duration {
        Duration::from_secs(self.api60f_timeout_secs)
    }

    /// Client for the correction service, `None` when no endpoint is configured
    pub fn corrector(&self) -> Result<Option<HttpApi60fCorrector>, CollaboratorError> {
        match self.api60f_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Ok(Some(HttpApi60fCorrector::new(url, self.api60f_timeout())?)),
            None => Ok(None),
        }
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API60F_URL) {
            self.api60f_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(raw) = lookup(ENV_API60F_TIMEOUT_SECS) {
            self.api60f_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_API60F_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_UTC_OFFSET_MINUTES) {
            self.utc_offset_minutes = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_UTC_OFFSET_MINUTES,
                value: raw.clone(),
            })?;
            self.calendar()?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string())),
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, writing defaults first when it does not exist
    pub async fn load(&self) -> Result<EngineConfig> {
        let format = Format::of(&self.path)?;
        if !self.path.exists() {
            let default = EngineConfig::default();
            self.save(&default).await?;
            info!("Wrote default configuration to {}", self.path.display());
            return Ok(default);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let config = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }

    /// File values with environment overrides applied
    pub async fn load_with_env(&self) -> Result<EngineConfig> {
        let mut config = self.load().await?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub async fn save(&self, config: &EngineConfig) -> Result<()> {
        let content = match Format::of(&self.path)? {
            Format::Json => serde_json::to_string_pretty(config)?,
            Format::Yaml => serde_yaml::to_string(config)?,
        };
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_save_load_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(temp_dir.path().join("lab.yaml"));

        let config = EngineConfig {
            api60f_url: Some("http://lab.local/api60f".into()),
            utc_offset_minutes: -300,
            ..Default::default()
        };
        manager.save(&config).await.unwrap();
        assert_eq!(manager.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_config_load_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");
        let manager = ConfigManager::new(path.clone());

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded, EngineConfig::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_partial_json_uses_defaults() {
        let temp_file = NamedTempFile::with_suffix(".json").unwrap();
        std::fs::write(temp_file.path(), r#"{"utc_offset_minutes": 60}"#).unwrap();

        let loaded = ConfigManager::new(temp_file.path()).load().await.unwrap();
        assert_eq!(loaded.utc_offset_minutes, 60);
        assert_eq!(loaded.api60f_timeout_secs, 10);
    }

    #[test]
    fn test_corrector_follows_url() {
        let mut config = EngineConfig::default();
        assert!(config.corrector().unwrap().is_none());

        config.api60f_url = Some("  ".into());
        assert!(config.corrector().unwrap().is_none());

        config.api60f_url = Some(" http://lab.local/api60f ".into());
        let corrector = config.corrector().unwrap().unwrap();
        assert_eq!(corrector.url(), "http://lab.local/api60f");
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let manager = ConfigManager::new("lab.toml");
        assert!(manager.load().await.is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API60F_URL, "http://svc/api60f"),
            (ENV_API60F_TIMEOUT_SECS, "3"),
            (ENV_UTC_OFFSET_MINUTES, "-300"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api60f_url.as_deref(), Some("http://svc/api60f"));
        assert_eq!(config.api60f_timeout(), Duration::from_secs(3));
        assert_eq!(config.calendar().unwrap().local_minus_utc(), -300 * 60);

        let bad = config.apply_overrides(|k| (k == ENV_UTC_OFFSET_MINUTES).then(|| "99999".to_string()));
        assert!(matches!(bad, Err(ConfigError::InvalidValue { .. })));
    }
}
