use super::models::{Config, RepoDefinition};
use thiserror::Error;
use url::Url;

/// Base URL schemes a repository may declare
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "s3", "ftp", "file"];

/// Repository keys this crate adds on top of the host's own.
///
/// Listed for host integration only; [`validate`] checks base URL schemes
/// and backoff, other keys pass through unchecked.
pub const RECOGNIZED_KEYS: &[&str] = &["s3_enabled", "region", "profile", "baseurl", "backoff", "delay"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Repository '{repo}' has an unparseable base URL '{url}': {source}")]
    InvalidBaseUrl {
        repo: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Repository '{repo}' uses unsupported scheme '{scheme}' (allowed: http, https, s3, ftp, file)")]
    UnsupportedScheme { repo: String, scheme: String },

    #[error("Repository '{repo}' has backoff factor 0, it must be at least 1")]
    InvalidBackoff { repo: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    for repo in config.repositories() {
        validate_repo(&repo)?;
    }
    Ok(())
}

fn validate_repo(repo: &RepoDefinition) -> Result<(), ValidationError> {
    validate_base_urls(repo)?;

    if repo.backoff == Some(0) {
        return Err(ValidationError::InvalidBackoff {
            repo: repo.id.clone(),
        });
    }

    Ok(())
}

/// Every declared base URL must parse and use an allowed scheme
fn validate_base_urls(repo: &RepoDefinition) -> Result<(), ValidationError> {
    for raw in &repo.baseurl {
        let url = Url::parse(raw).map_err(|source| ValidationError::InvalidBaseUrl {
            repo: repo.id.clone(),
            url: raw.clone(),
            source,
        })?;

        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(ValidationError::UnsupportedScheme {
                repo: repo.id.clone(),
                scheme: url.scheme().to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.repos.insert(
            "internal".to_string(),
            RepoDefinition::new("internal", "s3://my-bucket/x86_64/"),
        );
        config.repos.insert(
            "base".to_string(),
            RepoDefinition::new("base", "https://mirror.example.com/el9/x86_64/"),
        );
        config
    }

    #[test]
    fn test_valid_config() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unsupported_scheme() {
        let mut config = create_test_config();
        config.repos.get_mut("base").unwrap().baseurl = vec!["gopher://mirror/x86_64".to_string()];

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedScheme { ref scheme, .. }) if scheme == "gopher"
        ));
    }

    #[test]
    fn test_unparseable_base_url() {
        let mut config = create_test_config();
        config.repos.get_mut("internal").unwrap().baseurl = vec!["my-bucket/x86_64".to_string()];

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_zero_backoff() {
        let mut config = create_test_config();
        config.repos.get_mut("internal").unwrap().backoff = Some(0);

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidBackoff { .. })));
    }

    #[test]
    fn test_recognized_keys_include_scheme_list_key() {
        assert!(RECOGNIZED_KEYS.contains(&"baseurl"));
        assert!(ALLOWED_SCHEMES.contains(&"s3"));
    }
}
