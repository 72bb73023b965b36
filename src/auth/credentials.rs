//! AWS credentials and the sources they are resolved from.
//!
//! Environment and shared-file lookups go through `aws-config`; the resolved
//! keys feed the hand-rolled SigV4 signer.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::environment::{
    EnvironmentVariableCredentialsProvider, EnvironmentVariableRegionProvider,
};
use aws_config::meta::region::ProvideRegion;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::{ProfileFileCredentialsProvider, ProfileFileRegionProvider};
use aws_credential_types::provider::ProvideCredentials;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

use crate::error::{Result, VoxError};

/// Profile name used when none is configured.
pub const DEFAULT_PROFILE: &str = "chinese_support_redux";

/// A resolved AWS credential plus the region requests are scoped to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
}

impl Credential {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            region: region.into(),
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub(crate) fn validate(self) -> Result<Self> {
        if self.access_key_id.trim().is_empty() {
            return Err(VoxError::Credential("access key id is empty".to_string()));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(VoxError::Credential("secret access key is empty".to_string()));
        }
        if self.region.trim().is_empty() {
            return Err(VoxError::Credential("region is empty".to_string()));
        }
        Ok(self)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"..")
            .field("session_token", &self.session_token.as_ref().map(|_| ".."))
            .field("region", &self.region)
            .finish()
    }
}

/// Anything that can produce a [`Credential`].
///
/// Resolution happens once, when a signer is built.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self) -> Result<Credential>;
}

/// Credentials supplied directly by the caller.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credential);

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn resolve(&self) -> Result<Credential> {
        self.0.clone().validate()
    }
}

/// Credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
/// `AWS_SESSION_TOKEN` and `AWS_REGION` / `AWS_DEFAULT_REGION`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    region_override: Option<String>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_override = Some(region.into());
        self
    }

    /// True when both key variables are set.
    pub fn is_present() -> bool {
        std::env::var("AWS_ACCESS_KEY_ID").is_ok() && std::env::var("AWS_SECRET_ACCESS_KEY").is_ok()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn resolve(&self) -> Result<Credential> {
        let keys = EnvironmentVariableCredentialsProvider::new()
            .provide_credentials()
            .await
            .map_err(|e| {
                VoxError::Credential(format!(
                    "no AWS credentials in the environment: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let region = match &self.region_override {
            Some(region) => Some(region.clone()),
            None => env_region().await,
        }
        .ok_or_else(|| {
            VoxError::Credential("no region: set AWS_REGION or AWS_DEFAULT_REGION".to_string())
        })?;

        Credential {
            access_key_id: keys.access_key_id().to_string(),
            secret_access_key: keys.secret_access_key().to_string(),
            session_token: keys.session_token().map(str::to_string),
            region,
        }
        .validate()
    }
}

async fn env_region() -> Option<String> {
    EnvironmentVariableRegionProvider::new()
        .region()
        .await
        .map(|region| region.to_string())
        .filter(|region| !region.trim().is_empty())
}

/// Credentials from a named profile in the shared AWS files.
///
/// Keys, session tokens and profile chains are resolved by `aws-config`. The
/// region comes from an explicit override, then the profile, then the
/// environment. Files left unset fall back to the standard locations,
/// honoring `AWS_SHARED_CREDENTIALS_FILE` and `AWS_CONFIG_FILE`.
#[derive(Debug, Clone)]
pub struct ProfileCredentials {
    profile: String,
    credentials_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    region_override: Option<String>,
}

impl ProfileCredentials {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            credentials_file: None,
            config_file: None,
            region_override: None,
        }
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_files(self, credentials_file: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        self.with_credentials_file(credentials_file)
            .with_config_file(config_file)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_override = Some(region.into());
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn credentials_file(&self) -> Option<&Path> {
        self.credentials_file.as_deref()
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    fn profile_files(&self) -> ProfileFiles {
        let mut files = ProfileFiles::builder();
        files = match &self.credentials_file {
            Some(path) => files.with_file(ProfileFileKind::Credentials, path),
            None => files.include_default_credentials_file(true),
        };
        files = match &self.config_file {
            Some(path) => files.with_file(ProfileFileKind::Config, path),
            None => files.include_default_config_file(true),
        };
        files.build()
    }

    async fn region(&self, files: ProfileFiles) -> Option<String> {
        if let Some(region) = &self.region_override {
            return Some(region.clone());
        }
        let from_profile = ProfileFileRegionProvider::builder()
            .profile_files(files)
            .profile_name(&self.profile)
            .build()
            .region()
            .await
            .map(|region| region.to_string());
        match from_profile {
            Some(region) => Some(region),
            None => env_region().await,
        }
    }
}

#[async_trait]
impl CredentialProvider for ProfileCredentials {
    async fn resolve(&self) -> Result<Credential> {
        let files = self.profile_files();
        let keys = ProfileFileCredentialsProvider::builder()
            .profile_files(files.clone())
            .profile_name(&self.profile)
            .build()
            .provide_credentials()
            .await
            .map_err(|e| {
                VoxError::Credential(format!(
                    "cannot resolve AWS profile '{}': {}",
                    self.profile,
                    DisplayErrorContext(&e)
                ))
            })?;

        let region = self.region(files).await.ok_or_else(|| {
            VoxError::Credential(format!("no region configured for profile '{}'", self.profile))
        })?;

        debug!(profile = %self.profile, region = %region, "resolved AWS profile");

        Credential {
            access_key_id: keys.access_key_id().to_string(),
            secret_access_key: keys.secret_access_key().to_string(),
            session_token: keys.session_token().map(str::to_string),
            region,
        }
        .validate()
    }
}
