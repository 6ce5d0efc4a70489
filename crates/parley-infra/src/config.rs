//! Global configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed. A few deployment-specific values
//! can be overridden from the environment.

use std::path::{Path, PathBuf};

use parley_types::config::GlobalConfig;

pub const ENV_DATA_DIR: &str = "PARLEY_DATA_DIR";
pub const ENV_INFERENCE_URL: &str = "PARLEY_INFERENCE_URL";
pub const ENV_ENRICHMENT_URL: &str = "PARLEY_ENRICHMENT_URL";
pub const ENV_ANALYTICS_KEY: &str = "PARLEY_ANALYTICS_KEY";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
///
/// Environment overrides are applied in every case.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Overlay environment values onto a loaded config. Empty values are ignored.
pub fn apply_env_overrides(
    mut config: GlobalConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> GlobalConfig {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_INFERENCE_URL) {
        config.inference.base_url = url;
    }
    if let Some(url) = get(ENV_ENRICHMENT_URL) {
        config.enrichment.base_url = url;
    }
    if let Some(key) = get(ENV_ANALYTICS_KEY) {
        config.analytics.api_key = Some(key);
    }
    config
}
