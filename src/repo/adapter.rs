//! Translation of a host repository definition into a bucket-backed one

use super::error::{AdaptError, Result};
use super::S3Repository;
use crate::config::{HostOptions, RepoDefinition};

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_PROFILE: &str = "default";

/// Location of a repository inside its bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    pub bucket: String,
    pub arch: String,
}

impl BucketLocation {
    /// Split `<scheme>://<bucket>[.<suffix>]/<arch>[/]` into bucket and arch.
    ///
    /// Only the last two path segments matter; the host insists on the arch
    /// being part of the base URL even though object keys carry it separately.
    pub fn parse(repo: &str, base_url: &str) -> Result<Self> {
        let malformed = || AdaptError::MalformedBaseUrl {
            repo: repo.to_string(),
            url: base_url.to_string(),
        };

        let trimmed = base_url.strip_suffix('/').unwrap_or(base_url);
        let mut segments = trimmed.rsplit('/');
        let arch = segments.next().ok_or_else(malformed)?;
        let host = segments.next().ok_or_else(malformed)?;
        let bucket = host.split('.').next().unwrap_or_default();

        if bucket.is_empty() || arch.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            bucket: bucket.to_string(),
            arch: arch.to_string(),
        })
    }

    /// Virtual-hosted style endpoint of the bucket
    pub fn base_url(&self) -> String {
        format!("https://{}.s3.amazonaws.com", self.bucket)
    }
}

/// Build a bucket-backed repository from the host's definition.
///
/// # Errors
///
/// Fails when the definition declares a mirror list, has no base URL, or its
/// first base URL does not end in `<bucket>/<arch>`.
pub fn adapt(definition: &RepoDefinition, host: &HostOptions) -> Result<S3Repository> {
    if definition.mirrorlist.as_deref().is_some_and(|m| !m.is_empty()) {
        return Err(AdaptError::UnsupportedAttribute {
            repo: definition.id.clone(),
            attribute: "mirrorlist",
        });
    }

    let first_url = definition
        .baseurl
        .first()
        .ok_or_else(|| AdaptError::MissingBaseUrl {
            repo: definition.id.clone(),
        })?;
    let location = BucketLocation::parse(&definition.id, first_url)?;

    let region = non_empty(definition.region.as_deref()).map(str::to_string);
    let profile = resolve_profile(definition.profile.as_deref(), host);

    let repo = S3Repository::new(definition, location, region, profile);
    tracing::info!(
        repo = %repo.id,
        profile = %repo.profile,
        bucket = %repo.bucket(),
        "Initialized bucket-backed repository"
    );
    Ok(repo)
}

/// Repository profile, then the host default, then `default`
pub fn resolve_profile(declared: Option<&str>, host: &HostOptions) -> String {
    non_empty(declared)
        .or_else(|| non_empty(host.default_profile.as_deref()))
        .unwrap_or(DEFAULT_PROFILE)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(profile: Option<&str>) -> HostOptions {
        HostOptions {
            default_profile: profile.map(str::to_string),
            disabled: false,
        }
    }

    #[test]
    fn test_parse_trailing_slash() {
        let repo = adapt(&RepoDefinition::new("r", "s3://my-bucket/x86_64/"), &host(None)).unwrap();
        assert_eq!(repo.bucket(), "my-bucket");
        assert_eq!(repo.arch(), "x86_64");
        assert_eq!(repo.base_url, "https://my-bucket.s3.amazonaws.com");
    }

    #[test]
    fn test_parse_dotted_host_without_slash() {
        let location = BucketLocation::parse("r", "s3://my-bucket.internal/x86_64").unwrap();
        assert_eq!(location.bucket, "my-bucket");
        assert_eq!(location.arch, "x86_64");
    }

    #[test]
    fn test_https_url_rewritten() {
        let repo = adapt(
            &RepoDefinition::new("r", "https://my-bucket.s3.amazonaws.com/noarch"),
            &host(None),
        )
        .unwrap();
        assert_eq!(repo.bucket(), "my-bucket");
        assert_eq!(repo.arch(), "noarch");
        assert_eq!(repo.base_url, "https://my-bucket.s3.amazonaws.com");
    }

    #[test]
    fn test_only_one_trailing_slash_stripped() {
        let result = BucketLocation::parse("r", "s3://my-bucket/x86_64//");
        assert!(matches!(result, Err(AdaptError::MalformedBaseUrl { .. })));
    }

    #[test]
    fn test_malformed_urls_rejected() {
        for url in ["x86_64", "x86_64/", "s3://x86_64", "/x86_64", ".internal/x86_64"] {
            let result = BucketLocation::parse("r", url);
            assert!(
                matches!(result, Err(AdaptError::MalformedBaseUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_base_url() {
        let mut definition = RepoDefinition::new("r", "s3://my-bucket/x86_64");
        definition.baseurl.clear();

        let result = adapt(&definition, &host(None));
        assert!(matches!(result, Err(AdaptError::MissingBaseUrl { .. })));
    }

    #[test]
    fn test_mirrorlist_rejected() {
        let mut definition = RepoDefinition::new("r", "s3://my-bucket/x86_64");
        definition.mirrorlist = Some("https://mirrors.example.com/list".to_string());

        let result = adapt(&definition, &host(None));
        assert!(matches!(
            result,
            Err(AdaptError::UnsupportedAttribute { attribute: "mirrorlist", .. })
        ));
    }

    #[test]
    fn test_empty_mirrorlist_ignored() {
        let mut definition = RepoDefinition::new("r", "s3://my-bucket/x86_64");
        definition.mirrorlist = Some(String::new());

        assert!(adapt(&definition, &host(None)).is_ok());
    }

    #[test]
    fn test_region_default() {
        let mut definition = RepoDefinition::new("r", "s3://my-bucket/x86_64");
        definition.region = Some(String::new());
        assert_eq!(adapt(&definition, &host(None)).unwrap().region, "us-west-2");

        definition.region = Some("eu-central-1".to_string());
        assert_eq!(adapt(&definition, &host(None)).unwrap().region, "eu-central-1");
    }

    #[test]
    fn test_profile_precedence() {
        assert_eq!(resolve_profile(None, &host(Some("ops"))), "ops");
        assert_eq!(resolve_profile(None, &host(None)), "default");
        assert_eq!(resolve_profile(Some(""), &host(Some(""))), "default");
        assert_eq!(resolve_profile(Some("repo"), &host(Some("ops"))), "repo");
    }

    #[test]
    fn test_optional_attributes_copied() {
        let mut definition = RepoDefinition::new("r", "s3://my-bucket/x86_64");
        definition.optional.priority = Some(5);
        definition.optional.skip_if_unavailable = Some(true);

        let repo = adapt(&definition, &host(None)).unwrap();
        assert_eq!(repo.optional.priority, Some(5));
        assert_eq!(repo.optional.skip_if_unavailable, Some(true));
        assert_eq!(repo.optional.keepcache, None);
    }
}
