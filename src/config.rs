//! Application configuration.
//!
//! Provides two loading methods:
//! - `default_config()` - The configuration embedded in the binary
//! - `load_config(path)` - A TOML file on disk
//!
//! `resolve_config` picks between them: an explicit path, then
//! `DRONECLEAR_CONFIG`, then `<config dir>/droneclear/config.toml`, then the
//! embedded default. `DRONECLEAR_API_URL` overrides the API base URL last.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::DroneClearError;
use crate::wizard::WizardStep;

/// Default configuration embedded in the binary at compile time.
/// Loaded from `config/droneclear.toml`.
const DEFAULT_CONFIG: &str = include_str!("../config/droneclear.toml");

pub const CONFIG_ENV: &str = "DRONECLEAR_CONFIG";
pub const API_URL_ENV: &str = "DRONECLEAR_API_URL";

// =============================================================================
// CONFIGURATION TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub wizard: WizardSettings,
}

/// REST backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSettings {
    pub steps: Vec<WizardStep>,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("DroneClear/{}", env!("CARGO_PKG_VERSION"))
}

impl AppConfig {
    pub fn validate(&self) -> std::result::Result<(), DroneClearError> {
        if self.wizard.steps.is_empty() {
            return Err(DroneClearError::Config(
                "wizard.steps must list at least one step".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(DroneClearError::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }
        Url::parse(&self.api.base_url).map_err(|e| {
            DroneClearError::Config(format!("api.base_url '{}' is invalid: {}", self.api.base_url, e))
        })?;
        Ok(())
    }
}

/// Load configuration from a TOML file at the given path.
///
/// # Returns
/// * `Ok(AppConfig)` - Parsed and validated configuration
/// * `Err` - If the file cannot be read, the TOML is invalid, or validation fails
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Get the default configuration embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a build-time bug).
pub fn default_config() -> AppConfig {
    toml::from_str(DEFAULT_CONFIG).expect("embedded droneclear.toml must be valid TOML")
}

/// Per-user config file location, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("droneclear").join("config.toml"))
}

/// Resolve configuration from the CLI flag, environment and user config dir.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let api_override = std::env::var(API_URL_ENV).ok();
    resolve_with(explicit, env_path.as_deref(), user_config_path().as_deref(), api_override)
}

/// Resolution with every input passed in.
pub fn resolve_with(
    explicit: Option<&Path>,
    env_path: Option<&Path>,
    user_path: Option<&Path>,
    api_override: Option<String>,
) -> Result<AppConfig> {
    let mut config = if let Some(path) = explicit.or(env_path) {
        info!("Loading config from {}", path.display());
        load_config(path)?
    } else if let Some(path) = user_path.filter(|p| p.is_file()) {
        info!("Loading user config from {}", path.display());
        load_config(path)?
    } else {
        debug!("Using embedded default config");
        default_config()
    };

    if let Some(url) = api_override.filter(|u| !u.trim().is_empty()) {
        debug!("API base URL overridden to {}", url);
        config.api.base_url = url.trim().to_string();
        config.validate()?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Slot;

    #[test]
    fn test_default_config_loads() {
        let config = default_config();
        assert!(config.validate().is_ok(), "Embedded config should validate");
        assert_eq!(config.wizard.steps.len(), 10, "Should have ten wizard steps");
        assert_eq!(config.wizard.steps[0].category, Slot::Frames);
        assert_eq!(
            config.wizard.steps[0].prompt,
            "Start with the foundation. Select a Frame."
        );
        assert_eq!(config.wizard.steps.last().map(|s| s.category), Some(Slot::Batteries));
    }

    #[test]
    fn test_default_stack_step_precedes_fc() {
        let steps = default_config().wizard.steps;
        let stack = steps.iter().position(|s| s.category == Slot::Stacks).unwrap();
        let fc = steps.iter().position(|s| s.category == Slot::FlightControllers).unwrap();
        assert!(stack < fc);
        assert!(steps[stack].optional);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://parts.example.com/"

[[wizard.steps]]
category = "frame"
name = "Frame"
prompt = "Pick a frame"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 15, "Timeout should default");
        assert!(config.api.user_agent.starts_with("DroneClear/"));
        assert_eq!(config.wizard.steps[0].category, Slot::Frames);
    }

    #[test]
    fn test_load_config_rejects_empty_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"http://x/\"\n\n[wizard]\nsteps = []\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_resolve_order_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let missing_user = dir.path().join("nope.toml");

        let config = resolve_with(None, None, Some(&missing_user), None).unwrap();
        assert_eq!(config, default_config(), "Falls back to the embedded default");

        let config = resolve_with(None, None, None, Some("http://10.0.0.5:8000".to_string())).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");

        assert!(resolve_with(Some(&missing_user), None, None, None).is_err(), "Explicit path must exist");
        assert!(resolve_with(None, None, None, Some("::bad::".to_string())).is_err());
    }
}
