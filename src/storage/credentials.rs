//! Bridge from AWS profile credentials to object_store's S3 signer

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use object_store::CredentialProvider;
use object_store::aws::AwsCredential;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

/// Refresh this long before the provider says credentials expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

struct Cached {
    credential: Arc<AwsCredential>,
    expires_at: Option<SystemTime>,
}

/// Credentials resolved through the AWS profile chain for one profile
pub struct ProfileCredentials {
    profile: String,
    provider: SharedCredentialsProvider,
    cached: Mutex<Option<Cached>>,
}

impl ProfileCredentials {
    pub fn new(profile: &str, provider: SharedCredentialsProvider) -> Self {
        Self {
            profile: profile.to_string(),
            provider,
            cached: Mutex::new(None),
        }
    }
}

impl std::fmt::Debug for ProfileCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileCredentials")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

fn still_valid(expires_at: Option<SystemTime>) -> bool {
    match expires_at {
        None => true,
        Some(at) => SystemTime::now() + EXPIRY_MARGIN < at,
    }
}

#[async_trait]
impl CredentialProvider for ProfileCredentials {
    type Credential = AwsCredential;

    async fn get_credential(&self) -> object_store::Result<Arc<AwsCredential>> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref().filter(|c| still_valid(c.expires_at)) {
            return Ok(Arc::clone(&entry.credential));
        }

        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| object_store::Error::Generic {
                store: "S3",
                source: Box::new(e),
            })?;

        tracing::debug!(profile = %self.profile, "Resolved credentials");

        let credential = Arc::new(AwsCredential {
            key_id: credentials.access_key_id().to_string(),
            secret_key: credentials.secret_access_key().to_string(),
            token: credentials.session_token().map(str::to_string),
        });
        *cached = Some(Cached {
            credential: Arc::clone(&credential),
            expires_at: credentials.expiry(),
        });

        Ok(credential)
    }
}
