//! Configuration management for s3repo
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use s3repo::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! for repo in config.repositories() {
//!     println!("{} -> {:?}", repo.id, repo.baseurl);
//! }
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `S3REPO__<section>__<key>`, e.g. `S3REPO__PLUGIN__DEFAULT_PROFILE=ops`.
//!
//! `DISABLE_YUM_S3` set to any non-empty value turns the plugin off.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/s3repo.toml`.
//! This can be overridden using the `S3REPO_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, HostOptions, OptionalAttributes, PluginConfig, RepoDefinition};
pub use sources::DISABLE_ENV_VAR;
pub use validation::{ALLOWED_SCHEMES, RECOGNIZED_KEYS, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`S3REPO__*`, `DISABLE_YUM_S3`)
    /// 2. TOML file (default: `config/s3repo.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a
    /// repository declares a base URL with a scheme outside the allow-list.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// The disable variable is still honoured.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        sources::apply_disable_flag(&mut config, std::env::var(DISABLE_ENV_VAR).ok().as_deref());
        validation::validate(&config)?;
        Ok(config)
    }
}
