use super::credentials::ProfileCredentials;
use super::{Result, StorageError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use crate::repo::DEFAULT_REGION;
use object_store::aws::{AmazonS3Builder, resolve_bucket_region};
use object_store::{ClientOptions, ObjectStore};
use std::sync::Arc;

/// What a grabber needs a storage client for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    pub bucket: String,
    /// Region the repository declared, if any
    pub region: Option<String>,
    pub profile: String,
}

/// Region the S3 client signs for: the declared one, then the bucket's
/// actual region, then the profile's, then `us-west-2`.
fn pick_region(declared: Option<&str>, bucket_region: Option<String>, profile_region: Option<&str>) -> String {
    declared
        .map(str::to_string)
        .or(bucket_region)
        .or_else(|| profile_region.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Builds the object store a grabber talks to
#[async_trait]
pub trait Connector: std::fmt::Debug + Send + Sync {
    async fn connect(&self, target: &StoreTarget) -> Result<Arc<dyn ObjectStore>>;
}

/// Amazon S3 authenticated with a named AWS profile
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileConnector;

#[async_trait]
impl Connector for ProfileConnector {
    async fn connect(&self, target: &StoreTarget) -> Result<Arc<dyn ObjectStore>> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(&target.profile);
        if let Some(region) = &target.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| StorageError::MissingCredentials {
                profile: target.profile.clone(),
            })?;

        let bucket_region = match target.region {
            Some(_) => None,
            None => match resolve_bucket_region(&target.bucket, &ClientOptions::default()).await {
                Ok(region) => Some(region),
                Err(error) => {
                    tracing::debug!(bucket = %target.bucket, %error, "Could not look up bucket region");
                    None
                }
            },
        };
        let profile_region = sdk_config.region().map(ToString::to_string);
        let region = pick_region(target.region.as_deref(), bucket_region, profile_region.as_deref());

        let store = AmazonS3Builder::new()
            .with_bucket_name(&target.bucket)
            .with_region(&region)
            .with_credentials(Arc::new(ProfileCredentials::new(&target.profile, provider)))
            .build()?;

        tracing::debug!(
            bucket = %target.bucket,
            region = %region,
            profile = %target.profile,
            "Built S3 client"
        );

        Ok(Arc::new(store))
    }
}

/// Hands out an already built store, e.g. an in-memory fixture
#[derive(Debug, Clone)]
pub struct StaticConnector {
    store: Arc<dyn ObjectStore>,
}

impl StaticConnector {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, _target: &StoreTarget) -> Result<Arc<dyn ObjectStore>> {
        Ok(Arc::clone(&self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_region_wins() {
        let region = pick_region(Some("eu-central-1"), Some("ap-south-1".to_string()), Some("us-east-1"));
        assert_eq!(region, "eu-central-1");
    }

    #[test]
    fn test_bucket_region_before_profile_region() {
        assert_eq!(pick_region(None, Some("eu-central-1".to_string()), Some("us-east-1")), "eu-central-1");
        assert_eq!(pick_region(None, None, Some("us-east-1")), "us-east-1");
    }

    #[test]
    fn test_fallback_region() {
        assert_eq!(pick_region(None, None, None), DEFAULT_REGION);
    }

    #[tokio::test]
    async fn test_static_connector_ignores_target() {
        let store: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let target = StoreTarget {
            bucket: "my-bucket".to_string(),
            region: None,
            profile: "default".to_string(),
        };

        let connected = StaticConnector::new(Arc::clone(&store)).connect(&target).await.unwrap();
        assert!(Arc::ptr_eq(&connected, &store));
    }
}
