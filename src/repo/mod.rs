//! Bucket-backed repositories
//!
//! ## Key Components
//!
//! - [`adapt`] - turns a host [`RepoDefinition`] into an [`S3Repository`]
//! - [`S3Repository`] - adapted repository owning its lazily built [`Grabber`]
//! - [`replace_repositories`] - pre-setup hook deciding which repositories to adapt

mod adapter;
mod error;
mod replace;

pub use adapter::{BucketLocation, DEFAULT_PROFILE, DEFAULT_REGION, adapt, resolve_profile};
pub use error::{AdaptError, Result};
pub use replace::{RepoEntry, Replacement, replace_repositories, should_replace};

use crate::config::{OptionalAttributes, RepoDefinition};
use crate::grabber::{GrabError, Grabber, GrabberSettings};
use crate::storage::{Connector, ProfileConnector};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// A repository whose packages live in an object-storage bucket
#[derive(Debug)]
pub struct S3Repository {
    pub id: String,
    pub name: String,
    /// Declared region, or `us-west-2` for display when none was declared
    pub region: String,
    pub profile: String,
    /// Always `https://<bucket>.s3.amazonaws.com`
    pub base_url: String,
    pub gpgcheck: bool,
    pub gpgkey: Vec<String>,
    pub enablegroups: bool,
    pub enabled: bool,
    pub basecachedir: Option<PathBuf>,
    pub retries: Option<u32>,
    pub backoff: Option<u32>,
    pub delay: Option<u64>,
    pub optional: OptionalAttributes,
    location: BucketLocation,
    declared_region: Option<String>,
    connector: Arc<dyn Connector>,
    grabber: Mutex<Option<Arc<Grabber>>>,
}

impl S3Repository {
    fn new(definition: &RepoDefinition, location: BucketLocation, region: Option<String>, profile: String) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            region: region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string()),
            profile,
            base_url: location.base_url(),
            gpgcheck: definition.gpgcheck,
            gpgkey: definition.gpgkey.clone(),
            enablegroups: definition.enablegroups,
            enabled: true,
            basecachedir: definition.basecachedir.clone(),
            retries: definition.retries,
            backoff: definition.backoff,
            delay: definition.delay,
            optional: definition.optional.clone(),
            location,
            declared_region: region,
            connector: Arc::new(ProfileConnector),
            grabber: Mutex::new(None),
        }
    }

    /// Use a different storage backend for this repository's grabber
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.location.bucket
    }

    pub fn arch(&self) -> &str {
        &self.location.arch
    }

    /// Settings the grabber is built from.
    ///
    /// Only a declared region is passed on; otherwise the client resolves
    /// the bucket's own region.
    pub fn grabber_settings(&self) -> GrabberSettings {
        GrabberSettings::new(
            &self.id,
            &self.profile,
            self.declared_region.as_deref(),
            &self.location,
            self.retries,
            self.backoff,
            self.delay,
        )
    }

    /// The repository's grabber, built on first use and shared afterwards.
    ///
    /// A failed build leaves the slot empty so a later call can try again.
    pub fn grab(&self) -> std::result::Result<Arc<Grabber>, GrabError> {
        let mut slot = self.grabber.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(grabber) = slot.as_ref() {
            return Ok(Arc::clone(grabber));
        }

        let grabber = Arc::new(Grabber::connect(self.grabber_settings(), self.connector.as_ref())?);
        *slot = Some(Arc::clone(&grabber));
        Ok(grabber)
    }
}
