use std::{fs, path::PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::errors::CliError;

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub realm: Option<String>,
    pub appengine_url: Option<String>,
    pub appengine_token: Option<String>,
    pub realm_management_url: Option<String>,
    pub realm_management_token: Option<String>,
}

/// Fully resolved configuration for the device API commands.
#[derive(Debug, Clone)]
pub struct DeviceApiConfig {
    pub realm: String,
    pub appengine_url: String,
    pub appengine_token: String,
    pub realm_management_url: String,
    pub realm_management_token: String,
}

impl DeviceApiConfig {
    /// Resolve from the config file plus `ASTARTE_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = read_file_config()?;
        apply_env_overrides(&mut cfg);
        Ok(Self {
            realm: require(cfg.realm, "realm", "ASTARTE_REALM")?,
            appengine_url: require(cfg.appengine_url, "appengine_url", "ASTARTE_APPENGINE_URL")?,
            appengine_token: require(
                cfg.appengine_token,
                "appengine_token",
                "ASTARTE_APPENGINE_TOKEN",
            )?,
            realm_management_url: require(
                cfg.realm_management_url,
                "realm_management_url",
                "ASTARTE_REALM_MANAGEMENT_URL",
            )?,
            realm_management_token: require(
                cfg.realm_management_token,
                "realm_management_token",
                "ASTARTE_REALM_MANAGEMENT_TOKEN",
            )?,
        })
    }
}

fn read_file_config() -> Result<FileConfig> {
    let cfg_path = config_file_path();
    debug!(path = ?cfg_path, exists = ?cfg_path.exists(), "config.load.attempt");
    if !cfg_path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(&cfg_path)
        .map_err(|e| CliError::Config(format!("failed to read {}: {e}", cfg_path.display())))?;
    toml::from_str(&content)
        .map_err(|e| CliError::Config(format!("failed to parse {}: {e}", cfg_path.display())).into())
}

fn apply_env_overrides(cfg: &mut FileConfig) {
    let overrides = [
        ("ASTARTE_REALM", &mut cfg.realm),
        ("ASTARTE_APPENGINE_URL", &mut cfg.appengine_url),
        ("ASTARTE_APPENGINE_TOKEN", &mut cfg.appengine_token),
        ("ASTARTE_REALM_MANAGEMENT_URL", &mut cfg.realm_management_url),
        (
            "ASTARTE_REALM_MANAGEMENT_TOKEN",
            &mut cfg.realm_management_token,
        ),
    ];
    for (var, slot) in overrides {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                *slot = Some(value);
            }
        }
    }
}

fn require(value: Option<String>, key: &str, env_var: &str) -> Result<String> {
    value.ok_or_else(|| {
        CliError::Config(format!(
            "missing {key}; set it in {} or via {env_var}",
            config_file_path().display()
        ))
        .into()
    })
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("astartectl")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
