//! Configuration Loader
//!
//! Environment-aware loading: a base file, an environment overlay, then
//! `FANOUT__*` environment variables, deserialized into [`AsyncTaskConfig`].

use ::config::{Config, Environment, File, FileFormat, FileSourceFile};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ConfigResult;
use super::AsyncTaskConfig;

const CONFIG_BASENAME: &str = "fanout";
const ENV_PREFIX: &str = "FANOUT";

impl AsyncTaskConfig {
    /// Load configuration from `./config` with environment auto-detection
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Self> {
        let environment = detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load from a specific directory with an explicit environment.
    ///
    /// Missing files are skipped; only the built-in defaults are mandatory.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Self> {
        let config_directory = config_dir.unwrap_or_else(default_config_directory);

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading async task configuration"
        );

        let settings = Config::builder()
            .add_source(file_source(&config_directory, CONFIG_BASENAME))
            .add_source(file_source(
                &config_directory,
                &format!("{CONFIG_BASENAME}.{environment}"),
            ))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AsyncTaskConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            check_interval_ms = config.check_interval_ms,
            max_consecutive_probe_errors = config.max_consecutive_probe_errors,
            dispatch_concurrency = config.dispatch_concurrency,
            "Async task configuration loaded"
        );

        Ok(config)
    }
}

fn file_source(directory: &Path, name: &str) -> File<FileSourceFile, FileFormat> {
    let path = directory.join(format!("{name}.toml"));
    File::new(&path.to_string_lossy(), FileFormat::Toml).required(false)
}

fn default_config_directory() -> PathBuf {
    env::var("FANOUT_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

/// Get current environment from environment variables
pub fn detect_environment() -> String {
    env::var("FANOUT_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}
