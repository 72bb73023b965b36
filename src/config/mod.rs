//! Configuration (layered: code > env > TOML file > defaults).
//!
//! Nothing here is process-global: a [`VoxConfig`] is built by the caller and
//! handed to [`crate::acquire::AudioAcquirer::from_config`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::{EnvCredentials, ProfileCredentials, DEFAULT_PROFILE};
use crate::error::{Result, VoxError};
use crate::provider::{GoogleCloudAuth, ProviderId};

/// Deadline applied to providers without a fixed timeout of their own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// AWS settings for the Polly provider.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AwsConfig {
    /// Named profile in the shared credential files.
    pub profile: Option<String>,
    pub region: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// Google Cloud TTS credentials.
///
/// Precedence: access token, service-account file, API key, then
/// Application Default Credentials when `application_default` is set.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleCloudConfig {
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// Service-account key or `authorized_user` JSON file.
    pub service_account_file: Option<PathBuf>,
    pub application_default: bool,
}

impl fmt::Debug for GoogleCloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCloudConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("access_token", &self.access_token.as_ref().map(|_| ".."))
            .field("service_account_file", &self.service_account_file)
            .field("application_default", &self.application_default)
            .finish()
    }
}

/// Free Google Translate TTS settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleTranslateConfig {
    pub tld: Option<String>,
    pub slow: bool,
}

/// Settings for building an [`crate::acquire::AudioAcquirer`].
///
/// ```toml
/// cache_dir = "/home/me/collection.media"
/// request_timeout_secs = 20
///
/// [aws]
/// profile = "chinese_support_redux"
///
/// [google_cloud]
/// api_key = "..."
///
/// [base_urls]
/// baidu = "http://localhost:9000"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VoxConfig {
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub aws: AwsConfig,
    pub google_cloud: GoogleCloudConfig,
    pub google: GoogleTranslateConfig,
    /// Endpoint overrides keyed by provider wire name (`google`, `baidu`,
    /// `aws`, `gcloud`).
    pub base_urls: HashMap<String, String>,
}

impl VoxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` if present, then read `VOXCACHE_*` and Google Cloud
    /// variables from the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, then layer the environment over it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VoxError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        let _ = dotenvy::dotenv();
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("VOXCACHE_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = get("VOXCACHE_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(profile) = get("VOXCACHE_AWS_PROFILE") {
            self.aws.profile = Some(profile);
        }
        if let Some(region) = get("VOXCACHE_AWS_REGION") {
            self.aws.region = Some(region);
        }
        if let Some(key) = get("GOOGLE_CLOUD_TTS_API_KEY") {
            self.google_cloud.api_key = Some(key);
        }
        if let Some(token) = get("GOOGLE_CLOUD_ACCESS_TOKEN") {
            self.google_cloud.access_token = Some(token);
        }
        if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.google_cloud.service_account_file = Some(PathBuf::from(path));
        }
        if let Some(tld) = get("VOXCACHE_GOOGLE_TLD") {
            self.google.tld = Some(tld);
        }

        for id in ProviderId::ALL {
            let var = format!("VOXCACHE_{}_BASE_URL", id.as_str().to_ascii_uppercase());
            if let Some(url) = get(&var) {
                self.base_urls.insert(id.as_str().to_string(), url);
            }
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn with_aws_profile(mut self, profile: impl Into<String>) -> Self {
        self.aws.profile = Some(profile.into());
        self
    }

    pub fn with_google_cloud_api_key(mut self, key: impl Into<String>) -> Self {
        self.google_cloud.api_key = Some(key.into());
        self
    }

    pub fn with_google_service_account_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.google_cloud.service_account_file = Some(path.into());
        self
    }

    pub fn with_base_url(mut self, provider: ProviderId, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider.as_str().to_string(), url.into());
        self
    }

    pub fn cache_dir(&self) -> Result<&Path> {
        self.cache_dir.as_deref().ok_or_else(|| {
            VoxError::Configuration(
                "no cache directory configured (set cache_dir or VOXCACHE_CACHE_DIR)".to_string(),
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn base_url(&self, provider: ProviderId) -> Option<&str> {
        self.base_urls.get(provider.as_str()).map(String::as_str)
    }

    pub fn google_cloud_auth(&self) -> Option<GoogleCloudAuth> {
        let google = &self.google_cloud;
        if let Some(token) = &google.access_token {
            return Some(GoogleCloudAuth::AccessToken(token.clone()));
        }
        if let Some(path) = &google.service_account_file {
            return Some(GoogleCloudAuth::ServiceAccountFile(path.clone()));
        }
        if let Some(key) = &google.api_key {
            return Some(GoogleCloudAuth::ApiKey(key.clone()));
        }
        google
            .application_default
            .then_some(GoogleCloudAuth::ApplicationDefault)
    }

    /// Profile credentials for the configured (or default) profile.
    pub fn aws_profile_credentials(&self) -> ProfileCredentials {
        let profile = self.aws.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
        let mut credentials = ProfileCredentials::new(profile);
        if let Some(path) = &self.aws.credentials_file {
            credentials = credentials.with_credentials_file(path.clone());
        }
        if let Some(path) = &self.aws.config_file {
            credentials = credentials.with_config_file(path.clone());
        }
        if let Some(region) = &self.aws.region {
            credentials = credentials.with_region(region.clone());
        }
        credentials
    }

    /// Environment credentials, honoring a configured region.
    pub fn aws_env_credentials(&self) -> EnvCredentials {
        match &self.aws.region {
            Some(region) => EnvCredentials::new().with_region(region.clone()),
            None => EnvCredentials::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        for name in self.base_urls.keys() {
            if ProviderId::parse(name).is_none() {
                return Err(VoxError::Configuration(format!(
                    "base_urls has unknown provider '{name}'"
                )));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(VoxError::Configuration(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
