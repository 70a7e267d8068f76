use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub plugin: PluginConfig,
    #[serde(default)]
    pub repos: BTreeMap<String, RepoDefinition>,
}

/// Plugin-wide settings supplied by the host
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PluginConfig {
    /// Fallback credentials profile for repositories that declare none
    pub default_profile: Option<String>,
    /// When set, no repository is replaced
    #[serde(default)]
    pub disabled: bool,
}

/// A repository as the host package manager declares it.
///
/// Only the keys the adapter consumes are modelled; everything else the host
/// knows about a repository stays with the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepoDefinition {
    /// Filled from the `[repos.<id>]` table key when loaded from a file
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub baseurl: Vec<String>,
    #[serde(default)]
    pub s3_enabled: bool,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub retries: Option<u32>,
    pub backoff: Option<u32>,
    /// Seconds before the first retry
    pub delay: Option<u64>,
    #[serde(default)]
    pub gpgcheck: bool,
    #[serde(default)]
    pub gpgkey: Vec<String>,
    #[serde(default = "default_true")]
    pub enablegroups: bool,
    pub basecachedir: Option<PathBuf>,
    #[serde(flatten)]
    pub optional: OptionalAttributes,
    /// Not supported for bucket-backed repositories
    pub mirrorlist: Option<String>,
}

/// Attributes carried over verbatim when the source repository declares them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OptionalAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_persistdir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_expire: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if_unavailable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepcache: Option<bool>,
}

impl RepoDefinition {
    /// Minimal enabled repository with a single base URL
    pub fn new(id: impl Into<String>, baseurl: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
            baseurl: vec![baseurl.into()],
            s3_enabled: false,
            region: None,
            profile: None,
            retries: None,
            backoff: None,
            delay: None,
            gpgcheck: false,
            gpgkey: Vec::new(),
            enablegroups: true,
            basecachedir: None,
            optional: OptionalAttributes::default(),
            mirrorlist: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Host state handed to the adapter at call time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOptions {
    pub default_profile: Option<String>,
    pub disabled: bool,
}

impl Config {
    /// Repository definitions with ids (and default names) filled from table keys
    pub fn repositories(&self) -> Vec<RepoDefinition> {
        self.repos
            .iter()
            .map(|(id, repo)| {
                let mut repo = repo.clone();
                if repo.id.is_empty() {
                    repo.id = id.clone();
                }
                if repo.name.is_empty() {
                    repo.name = repo.id.clone();
                }
                repo
            })
            .collect()
    }

    /// Host options, with an explicit profile taking precedence over the file
    pub fn host_options(&self, profile_override: Option<&str>) -> HostOptions {
        HostOptions {
            default_profile: profile_override
                .map(str::to_string)
                .or_else(|| self.plugin.default_profile.clone()),
            disabled: self.plugin.disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repositories_fill_ids_and_names() {
        let config: Config = toml::from_str(
            r#"
[repos.internal]
baseurl = ["s3://my-bucket/x86_64/"]

[repos.named]
name = "Named repo"
baseurl = ["https://mirror.example.com/el9/x86_64"]
        "#,
        )
        .unwrap();

        let repos = config.repositories();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].id, "internal");
        assert_eq!(repos[0].name, "internal");
        assert!(repos[0].enabled);
        assert_eq!(repos[1].name, "Named repo");
    }

    #[test]
    fn test_optional_attributes_flatten() {
        let repo: RepoDefinition = toml::from_str(
            r#"
baseurl = ["s3://my-bucket/x86_64/"]
priority = 10
keepcache = true
        "#,
        )
        .unwrap();

        assert_eq!(repo.optional.priority, Some(10));
        assert_eq!(repo.optional.keepcache, Some(true));
        assert_eq!(repo.optional.metadata_expire, None);
        assert!(repo.mirrorlist.is_none());
    }

    #[test]
    fn test_host_options_override() {
        let mut config = Config::default();
        config.plugin.default_profile = Some("from-file".to_string());

        assert_eq!(
            config.host_options(None).default_profile.as_deref(),
            Some("from-file")
        );
        assert_eq!(
            config.host_options(Some("cli")).default_profile.as_deref(),
            Some("cli")
        );
    }
}
