//! Audio acquisition: selector parsing, cache lookup and provider dispatch.

pub mod request;

pub use request::{AcquisitionRequest, SpeechSource};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::auth::{EnvCredentials, RequestSigner};
use crate::cache::AudioCache;
use crate::config::VoxConfig;
use crate::error::{Result, VoxError};
use crate::provider::polly::POLLY_SERVICE;
use crate::provider::{
    BaiduTts, GoogleCloudTts, GoogleTranslateTts, PollyTts, ProviderClient, ProviderId,
    SpeechProvider,
};

/// Fetches speech for (text, `"provider|language"`) pairs into a cache
/// directory and hands back the cached file's basename.
///
/// A triple is fetched at most once for the lifetime of the directory: once
/// `<key>.mp3` exists, later calls return it without touching the network.
///
/// ```no_run
/// use voxcache::acquire::AudioAcquirer;
///
/// # async fn example() -> voxcache::error::Result<()> {
/// let acquirer = AudioAcquirer::with_defaults("/tmp/media")?;
/// let file = acquirer.acquire("你好", "baidu|zh").await?;
/// assert_eq!(file, "你好_baidu_zh.mp3");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AudioAcquirer {
    cache: AudioCache,
    clients: HashMap<ProviderId, ProviderClient>,
}

impl AudioAcquirer {
    /// An acquirer with no providers registered.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: AudioCache::new(cache_dir),
            clients: HashMap::new(),
        }
    }

    /// An acquirer with the two credential-free providers (`google`,
    /// `baidu`) on their public endpoints.
    pub fn with_defaults(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(cache_dir)
            .with_client(GoogleTranslateTts::new())
            .with_client(BaiduTts::new()?))
    }

    /// Build every provider the configuration allows.
    ///
    /// `google` and `baidu` are always available. `aws` is registered when a
    /// profile is configured (its credentials must then resolve), when AWS
    /// environment credentials exist, or when the default profile resolves.
    /// `gcloud` is registered when any Google Cloud credential is configured;
    /// an unreadable credentials file fails construction.
    pub async fn from_config(config: &VoxConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        let mut acquirer = Self::new(config.cache_dir()?);

        let google = match config.base_url(ProviderId::GoogleFree) {
            Some(url) => GoogleTranslateTts::new_with_base_url(url),
            None => GoogleTranslateTts::with_tld(config.google.tld.as_deref().unwrap_or("com")),
        };
        acquirer.register(google.slow(config.google.slow).with_timeout(timeout));

        let baidu = match config.base_url(ProviderId::Baidu) {
            Some(url) => BaiduTts::new_with_base_url(url)?,
            None => BaiduTts::new()?,
        };
        acquirer.register(baidu);

        if let Some(signer) = polly_signer(config).await? {
            let polly = match config.base_url(ProviderId::AwsPolly) {
                Some(url) => PollyTts::new_with_base_url(signer, url),
                None => PollyTts::new(signer),
            };
            acquirer.register(polly.with_timeout(timeout));
        }

        if let Some(auth) = config.google_cloud_auth() {
            let gcloud = match config.base_url(ProviderId::GoogleCloud) {
                Some(url) => GoogleCloudTts::new_with_base_url(auth, url)?,
                None => GoogleCloudTts::new(auth)?,
            };
            acquirer.register(gcloud.with_timeout(timeout));
        }

        debug!(
            providers = ?acquirer.providers(),
            cache_dir = %acquirer.cache.dir().display(),
            "audio acquirer ready"
        );
        Ok(acquirer)
    }

    /// Register (or replace) the client for its provider.
    pub fn with_client(mut self, client: impl Into<ProviderClient>) -> Self {
        self.register(client);
        self
    }

    pub fn register(&mut self, client: impl Into<ProviderClient>) {
        let client = client.into();
        self.clients.insert(client.id(), client);
    }

    /// Registered providers, sorted.
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.dir()
    }

    /// Full path of the cache entry for `request`, whether or not it exists.
    pub fn cache_path(&self, request: &AcquisitionRequest) -> PathBuf {
        self.cache.path_for(&request.cache_key())
    }

    /// Return the basename of the cached audio for `text` under `source`
    /// (`"<provider>|<language>"`), fetching it on a miss.
    ///
    /// A malformed selector or unknown provider fails before any cache or
    /// network access. Providers that fail softly (`google`, `gcloud`) still
    /// return the basename; the file then simply does not exist.
    pub async fn acquire(&self, text: &str, source: &str) -> Result<String> {
        let request = AcquisitionRequest::parse(text, source)?;
        self.acquire_request(&request).await
    }

    pub async fn acquire_request(&self, request: &AcquisitionRequest) -> Result<String> {
        let key = request.cache_key();
        let path = self.cache.path_for(&key);
        let file_name = key.file_name();
        if !self.cache.holds(&path) {
            return Err(VoxError::InvalidArgument(format!(
                "cache entry '{file_name}' would land outside the cache directory"
            )));
        }

        if self.cache.contains(&key).await? {
            debug!(provider = %request.provider(), file = %file_name, "cache hit");
            return Ok(file_name);
        }

        let client = self.clients.get(&request.provider()).ok_or_else(|| {
            VoxError::Configuration(format!(
                "provider '{}' is not configured",
                request.provider()
            ))
        })?;

        debug!(
            provider = %request.provider(),
            language = request.language(),
            file = %file_name,
            "cache miss"
        );
        self.cache.ensure_dir().await?;
        client
            .synthesize(request.text(), request.language(), &path)
            .await?;

        if tokio::fs::try_exists(&path).await? {
            info!(provider = %request.provider(), file = %file_name, "acquired audio");
        }
        Ok(file_name)
    }
}

async fn polly_signer(config: &VoxConfig) -> Result<Option<RequestSigner>> {
    if config.aws.profile.is_some() {
        return RequestSigner::new(POLLY_SERVICE, &config.aws_profile_credentials())
            .await
            .map(Some);
    }
    if EnvCredentials::is_present() {
        return RequestSigner::new(POLLY_SERVICE, &config.aws_env_credentials())
            .await
            .map(Some);
    }
    match RequestSigner::new(POLLY_SERVICE, &config.aws_profile_credentials()).await {
        Ok(signer) => Ok(Some(signer)),
        Err(err) => {
            debug!(error = %err, "no AWS credentials; aws provider disabled");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use tempfile::TempDir;

    #[tokio::test]
    async fn cached_file_short_circuits_dispatch() {
        let dir = TempDir::new().unwrap();
        // No clients at all: a hit must not need one.
        let acquirer = AudioAcquirer::new(dir.path());
        let key = CacheKey::build("你好", ProviderId::AwsPolly, "Zhiyu");
        std::fs::write(dir.path().join(key.file_name()), b"cached").unwrap();

        let file = acquirer.acquire("你好", "aws|Zhiyu").await.unwrap();

        assert_eq!(file, "你好_aws_Zhiyu.mp3");
    }

    #[tokio::test]
    async fn miss_on_unconfigured_provider_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let acquirer = AudioAcquirer::new(dir.path());

        let err = acquirer.acquire("你好", "gcloud|zh-CN").await.unwrap_err();

        assert!(matches!(err, VoxError::Configuration(msg) if msg.contains("gcloud")));
    }

    #[tokio::test]
    async fn bad_selector_fails_before_touching_the_cache() {
        let dir = TempDir::new().unwrap();
        let acquirer = AudioAcquirer::new(dir.path().join("never-created"));

        let err = acquirer.acquire("你好", "baidu-zh").await.unwrap_err();

        assert!(matches!(err, VoxError::Configuration(_)));
        assert!(!dir.path().join("never-created").exists());
    }

    #[test]
    fn with_defaults_registers_credential_free_providers() {
        let acquirer = AudioAcquirer::with_defaults("/tmp/unused").unwrap();
        assert_eq!(
            acquirer.providers(),
            vec![ProviderId::GoogleFree, ProviderId::Baidu]
        );
    }

    #[tokio::test]
    async fn from_config_requires_a_cache_dir() {
        let err = AudioAcquirer::from_config(&VoxConfig::new()).await.unwrap_err();
        assert!(matches!(err, VoxError::Configuration(_)));
    }

    #[tokio::test]
    async fn from_config_fails_fast_on_unresolvable_profile() {
        let dir = TempDir::new().unwrap();
        let mut config = VoxConfig::new()
            .with_cache_dir(dir.path())
            .with_aws_profile("missing");
        config.aws.credentials_file = Some(dir.path().join("credentials"));
        config.aws.config_file = Some(dir.path().join("config"));

        let err = AudioAcquirer::from_config(&config).await.unwrap_err();

        assert!(matches!(err, VoxError::Credential(_)));
    }

    #[tokio::test]
    async fn from_config_registers_gcloud_with_api_key() {
        let dir = TempDir::new().unwrap();
        let config = VoxConfig::new()
            .with_cache_dir(dir.path())
            .with_google_cloud_api_key("key");

        let acquirer = AudioAcquirer::from_config(&config).await.unwrap();

        assert!(acquirer.providers().contains(&ProviderId::GoogleCloud));
    }

    #[tokio::test]
    async fn from_config_fails_on_unreadable_google_credentials_file() {
        let dir = TempDir::new().unwrap();
        let config = VoxConfig::new()
            .with_cache_dir(dir.path())
            .with_google_service_account_file(dir.path().join("missing.json"));

        let err = AudioAcquirer::from_config(&config).await.unwrap_err();

        assert!(matches!(err, VoxError::Configuration(msg) if msg.contains("missing.json")));
    }

    #[tokio::test]
    async fn dotted_text_stays_inside_the_cache() {
        let dir = TempDir::new().unwrap();
        let acquirer = AudioAcquirer::new(dir.path().join("media"));
        let source = SpeechSource::new(ProviderId::Baidu, "zh");
        let request = AcquisitionRequest::new("../../up", source).unwrap();

        assert_eq!(
            acquirer.cache_path(&request),
            dir.path().join("media").join("....up_baidu_zh.mp3")
        );
        assert!(matches!(
            acquirer.acquire_request(&request).await,
            Err(VoxError::Configuration(_))
        ));
        assert!(!dir.path().join("up_baidu_zh.mp3").exists());
    }
}
