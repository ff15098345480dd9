//! Configuration loading for wayr.
//!
//! A single optional `config.json`, found by the resolution order
//! (CLI > env > XDG > defaults). Every field has a default, so a missing file
//! or an empty object is a complete configuration. CLI flags override the
//! loaded values in `main`.

use crate::collect::{BackendChoice, DEFAULT_PROC_ROOT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use wayr_common::ColorChoice;

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "wayr";

/// Environment variable naming the config directory.
pub const CONFIG_DIR_ENV: &str = "WAYR_CONFIG_DIR";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value in config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for wayr_common::Error {
    fn from(err: ConfigError) -> Self {
        wayr_common::Error::Config(err.to_string())
    }
}

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WayrConfig {
    /// Snapshot backend; `auto` follows the platform.
    pub backend: BackendChoice,

    /// Process filesystem root for the procfs backend.
    pub proc_root: PathBuf,

    /// When to color the report.
    pub color: ColorChoice,

    /// Look up a man page description for the "What it is" line.
    pub describe: bool,
}

impl Default for WayrConfig {
    fn default() -> Self {
        WayrConfig {
            backend: BackendChoice::Auto,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            color: ColorChoice::Auto,
            describe: true,
        }
    }
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: WayrConfig,
    /// The file read, or None when running on defaults.
    pub path: Option<PathBuf>,
    /// The directory searched.
    pub config_dir: PathBuf,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config directory (highest priority, must exist).
    pub config_dir: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// 1. Explicit `--config` directory
/// 2. `WAYR_CONFIG_DIR`
/// 3. XDG config home (`~/.config/wayr/`)
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let config_dir = resolve_config_dir(options, std::env::var(CONFIG_DIR_ENV).ok())?;
    let path = config_dir.join(CONFIG_FILE_NAME);

    if !path.exists() {
        debug!(dir = %config_dir.display(), "no config file, using defaults");
        return Ok(ResolvedConfig {
            config: WayrConfig::default(),
            path: None,
            config_dir,
        });
    }

    let config = load_config_file(&path)?;
    debug!(path = %path.display(), "config loaded");
    Ok(ResolvedConfig {
        config,
        path: Some(path),
        config_dir,
    })
}

/// Resolve the config directory; `env_dir` is the value of `WAYR_CONFIG_DIR`.
pub fn resolve_config_dir(
    options: &ConfigOptions,
    env_dir: Option<String>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = &options.config_dir {
        if !dir.is_dir() {
            return Err(ConfigError::NotFound { path: dir.clone() });
        }
        return Ok(dir.clone());
    }

    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let xdg_config = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    Ok(xdg_config.join(CONFIG_DIR_NAME))
}

/// Read and validate one config file.
pub fn load_config_file(path: &Path) -> Result<WayrConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let config: WayrConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

    if !config.proc_root.is_absolute() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            message: format!("proc_root must be absolute, got {}", config.proc_root.display()),
        });
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let options = ConfigOptions {
            config_dir: Some(dir.path().to_path_buf()),
        };

        let resolved = load_config(&options).unwrap();
        assert_eq!(resolved.config, WayrConfig::default());
        assert!(resolved.path.is_none());
        assert!(resolved.config.describe);
        assert_eq!(resolved.config.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"backend": "ps", "color": "never"}"#,
        )
        .unwrap();
        let options = ConfigOptions {
            config_dir: Some(dir.path().to_path_buf()),
        };

        let resolved = load_config(&options).unwrap();
        assert_eq!(resolved.config.backend, BackendChoice::Ps);
        assert_eq!(resolved.config.color, ColorChoice::Never);
        assert!(resolved.config.describe);
        assert_eq!(resolved.path, Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ backend: ").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"colour": "never"}"#).unwrap();

        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_relative_proc_root_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"proc_root": "proc"}"#).unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("proc_root must be absolute"));
    }

    #[test]
    fn test_resolution_order() {
        let dir = tempdir().unwrap();
        let explicit = ConfigOptions {
            config_dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(
            resolve_config_dir(&explicit, Some("/etc/wayr".to_string())).unwrap(),
            dir.path()
        );

        let none = ConfigOptions::default();
        assert_eq!(
            resolve_config_dir(&none, Some("/etc/wayr".to_string())).unwrap(),
            PathBuf::from("/etc/wayr")
        );
        assert!(resolve_config_dir(&none, None)
            .unwrap()
            .ends_with(CONFIG_DIR_NAME));
    }

    #[test]
    fn test_missing_explicit_dir_is_not_found() {
        let options = ConfigOptions {
            config_dir: Some(PathBuf::from("/nonexistent/wayr-config")),
        };
        assert!(matches!(
            load_config(&options),
            Err(ConfigError::NotFound { .. })
        ));
    }
}
