use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "S3REPO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/s3repo.toml";
const ENV_PREFIX: &str = "S3REPO";
const ENV_SEPARATOR: &str = "__";

/// Legacy switch honoured by the host plugin: any non-empty value disables it
pub const DISABLE_ENV_VAR: &str = "DISABLE_YUM_S3";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    apply_disable_flag(&mut config, env::var(DISABLE_ENV_VAR).ok().as_deref());

    Ok(config)
}

/// Fold the legacy disable variable into the explicit plugin setting
pub(crate) fn apply_disable_flag(config: &mut Config, value: Option<&str>) {
    if value.is_some_and(|v| !v.is_empty()) {
        tracing::info!("{} is set, bucket-backed repositories are disabled", DISABLE_ENV_VAR);
        config.plugin.disabled = true;
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // S3REPO__PLUGIN__DEFAULT_PROFILE -> plugin.default_profile
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert!(config.repos.is_empty());
        assert!(!config.plugin.disabled);
        assert!(config.plugin.default_profile.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[plugin]
default_profile = "ops"

[repos.internal]
name = "Internal packages"
baseurl = ["s3://my-bucket/x86_64/"]
region = "eu-west-1"
retries = 4
backoff = 3
delay = 1
gpgcheck = true
gpgkey = ["file:///etc/pki/rpm-gpg/RPM-GPG-KEY-internal"]
metadata_expire = "6h"

[repos.base]
baseurl = ["https://mirror.example.com/el9/BaseOS/x86_64/os/"]
enabled = false
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.plugin.default_profile.as_deref(), Some("ops"));
        assert_eq!(config.repos.len(), 2);

        let internal = &config.repos["internal"];
        assert_eq!(internal.region.as_deref(), Some("eu-west-1"));
        assert_eq!(internal.retries, Some(4));
        assert_eq!(internal.backoff, Some(3));
        assert_eq!(internal.delay, Some(1));
        assert!(internal.gpgcheck);
        assert_eq!(internal.optional.metadata_expire.as_deref(), Some("6h"));

        assert!(!config.repos["base"].enabled);
    }

    #[test]
    fn test_disable_flag_semantics() {
        let mut config = Config::default();
        apply_disable_flag(&mut config, None);
        assert!(!config.plugin.disabled);

        apply_disable_flag(&mut config, Some(""));
        assert!(!config.plugin.disabled);

        apply_disable_flag(&mut config, Some("1"));
        assert!(config.plugin.disabled);
    }
}
