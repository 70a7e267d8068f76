//! Pre-setup hook: swap matching host repositories for bucket-backed ones

use super::error::AdaptError;
use super::{S3Repository, adapt};
use crate::config::{HostOptions, RepoDefinition};
use tracing::{info, warn};

const S3_SCHEME: &str = "s3://";

/// A repository after the hook ran
#[derive(Debug)]
pub enum RepoEntry {
    /// Left for the host's ordinary handling
    Plain(RepoDefinition),
    S3(S3Repository),
}

impl RepoEntry {
    pub fn id(&self) -> &str {
        match self {
            RepoEntry::Plain(definition) => &definition.id,
            RepoEntry::S3(repo) => &repo.id,
        }
    }
}

/// Outcome of running the hook over the host's repositories
#[derive(Debug, Default)]
pub struct Replacement {
    pub entries: Vec<RepoEntry>,
    /// Repositories that matched but could not be adapted; they are dropped
    pub rejected: Vec<AdaptError>,
}

impl Replacement {
    pub fn s3_repositories(&self) -> impl Iterator<Item = &S3Repository> {
        self.entries.iter().filter_map(|entry| match entry {
            RepoEntry::S3(repo) => Some(repo),
            RepoEntry::Plain(_) => None,
        })
    }

    pub fn find(&self, id: &str) -> Option<&RepoEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn replaced_count(&self) -> usize {
        self.s3_repositories().count()
    }
}

/// Whether an enabled repository should be served from a bucket
pub fn should_replace(definition: &RepoDefinition) -> bool {
    if !definition.enabled {
        return false;
    }
    match definition.baseurl.first() {
        None => false,
        Some(url) => definition.s3_enabled || url.starts_with(S3_SCHEME),
    }
}

/// Adapt every matching repository.
///
/// A repository that fails to adapt is reported in
/// [`Replacement::rejected`] and left out; the others proceed.
pub fn replace_repositories(definitions: Vec<RepoDefinition>, host: &HostOptions) -> Replacement {
    let mut replacement = Replacement::default();

    if host.disabled {
        info!("Bucket-backed repositories disabled, leaving all repositories untouched");
        replacement.entries = definitions.into_iter().map(RepoEntry::Plain).collect();
        return replacement;
    }

    for definition in definitions {
        if !should_replace(&definition) {
            replacement.entries.push(RepoEntry::Plain(definition));
            continue;
        }

        info!(repo = %definition.name, "Replacing repository with bucket-backed repository");
        match adapt(&definition, host) {
            Ok(repo) => {
                info!(repo = %definition.name, "Replaced repository with bucket-backed repository");
                replacement.entries.push(RepoEntry::S3(repo));
            }
            Err(e) => {
                warn!(repo = %definition.id, error = %e, "Repository rejected");
                replacement.rejected.push(e);
            }
        }
    }

    replacement
}
