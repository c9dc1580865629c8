//! Settings loader: optional TOML file, then environment overrides.
//!
//! The file holds a single `[forge]` table that deserialises into
//! [`ForgeSettings`]. `FORGEFETCH_API_BASE` and `FORGEFETCH_CORS_PROXY`
//! override the file; blank variables are ignored.

use camino::Utf8Path;
use forgefetch::ForgeSettings;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Environment variable overriding the API root.
pub const API_BASE_ENV: &str = "FORGEFETCH_API_BASE";

/// Environment variable overriding the download proxy prefix.
pub const CORS_PROXY_ENV: &str = "FORGEFETCH_CORS_PROXY";

/// Layout of the configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Forge endpoints, proxy, and deadlines.
    pub forge: ForgeSettings,
}

/// Load settings from `path` (when given) and the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a timeout
/// is zero.
pub fn load_settings(path: Option<&Utf8Path>) -> Result<ForgeSettings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Load settings using `lookup` in place of the process environment.
///
/// # Errors
///
/// See [`load_settings`].
pub fn load_settings_with<F>(path: Option<&Utf8Path>, lookup: F) -> Result<ForgeSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => read_config_file(path)?.forge,
        None => ForgeSettings::default(),
    };
    apply_env_overrides_with(&mut settings, lookup);
    validate(&settings)?;
    Ok(settings)
}

fn read_config_file(path: &Utf8Path) -> Result<ConfigFile> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_owned(),
        source,
    })?;
    toml::from_str(&source).map_err(|e| CliError::ConfigParse {
        path: path.to_owned(),
        reason: e.message().to_owned(),
    })
}

/// Patch `settings` with any non-blank override returned by `lookup`.
pub fn apply_env_overrides_with<F>(settings: &mut ForgeSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(api_base) = non_blank(API_BASE_ENV) {
        settings.api_base = api_base.trim().to_owned();
    }
    if let Some(proxy) = non_blank(CORS_PROXY_ENV) {
        settings.cors_proxy = Some(proxy.trim().to_owned());
    }
}

fn validate(settings: &ForgeSettings) -> Result<()> {
    if settings.api_base.trim().is_empty() {
        return Err(CliError::InvalidConfig {
            reason: "api_base must not be empty".to_owned(),
        });
    }
    if settings.metadata_timeout_secs == 0 || settings.download_timeout_secs == 0 {
        return Err(CliError::InvalidConfig {
            reason: "timeouts must be at least one second".to_owned(),
        });
    }
    Ok(())
}
