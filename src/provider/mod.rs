//! Speech provider clients and dispatch.

pub mod baidu;
pub mod google_cloud;
pub mod google_translate;
pub mod http;
pub mod key;
pub mod polly;

pub use baidu::BaiduTts;
pub use google_cloud::{GoogleCloudAuth, GoogleCloudTts};
pub use google_translate::GoogleTranslateTts;
pub use key::ProviderId;
pub use polly::PollyTts;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// A text-to-speech backend that writes MP3 audio for `text` to
/// `destination`.
///
/// Implementations write the file only on success and never leave a partial
/// file behind. Whether a failure is returned or only logged depends on the
/// provider (see [`ProviderId::fails_loudly`]).
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn synthesize(&self, text: &str, language: &str, destination: &Path) -> Result<()>;
}

/// The closed set of provider clients.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    GoogleFree(GoogleTranslateTts),
    Baidu(BaiduTts),
    AwsPolly(PollyTts),
    GoogleCloud(GoogleCloudTts),
}

#[async_trait]
impl SpeechProvider for ProviderClient {
    fn id(&self) -> ProviderId {
        match self {
            Self::GoogleFree(client) => client.id(),
            Self::Baidu(client) => client.id(),
            Self::AwsPolly(client) => client.id(),
            Self::GoogleCloud(client) => client.id(),
        }
    }

    async fn synthesize(&self, text: &str, language: &str, destination: &Path) -> Result<()> {
        match self {
            Self::GoogleFree(client) => client.synthesize(text, language, destination).await,
            Self::Baidu(client) => client.synthesize(text, language, destination).await,
            Self::AwsPolly(client) => client.synthesize(text, language, destination).await,
            Self::GoogleCloud(client) => client.synthesize(text, language, destination).await,
        }
    }
}

impl From<GoogleTranslateTts> for ProviderClient {
    fn from(client: GoogleTranslateTts) -> Self {
        Self::GoogleFree(client)
    }
}

impl From<BaiduTts> for ProviderClient {
    fn from(client: BaiduTts) -> Self {
        Self::Baidu(client)
    }
}

impl From<PollyTts> for ProviderClient {
    fn from(client: PollyTts) -> Self {
        Self::AwsPolly(client)
    }
}

impl From<GoogleCloudTts> for ProviderClient {
    fn from(client: GoogleCloudTts) -> Self {
        Self::GoogleCloud(client)
    }
}
