//! Baidu translate portal TTS (`/gettts`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Url;
use tracing::{debug, info};

use super::http::{
    http1_alpn_client, parse_url, status_to_error, trim_trailing_slash, BROWSER_USER_AGENT,
};
use super::{ProviderId, SpeechProvider};
use crate::cache::write_atomic;
use crate::error::{Result, VoxError};
use crate::util::timeout::with_timeout;

const DEFAULT_BASE_URL: &str = "https://fanyi.baidu.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Speed multiplier the web portal uses.
const SPEED: &str = "2";

/// Client for the Baidu translate TTS endpoint.
///
/// Failures are hard: a non-200 status or a transport error is returned to
/// the caller and nothing is written.
#[derive(Debug, Clone)]
pub struct BaiduTts {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BaiduTts {
    pub fn new() -> Result<Self> {
        Self::new_with_base_url(DEFAULT_BASE_URL)
    }

    pub fn new_with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http1_alpn_client()?,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_url(&self, text: &str, language: &str) -> Result<Url> {
        let mut url = parse_url(&format!("{}/gettts", trim_trailing_slash(&self.base_url)))?;
        url.query_pairs_mut()
            .append_pair("lan", language)
            .append_pair("ie", "UTF-8")
            .append_pair("text", text)
            .append_pair("spd", SPEED)
            .append_pair("source", "web");
        Ok(url)
    }

    /// Fetch the MP3 bytes for `text`.
    pub async fn fetch(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let url = self.request_url(text, language)?;
        debug!(provider = "baidu", language, "requesting speech");

        with_timeout(self.timeout, async {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, BROWSER_USER_AGENT)
                .send()
                .await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(ProviderId::Baidu.as_str(), status, &body));
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(VoxError::provider(
                    ProviderId::Baidu.as_str(),
                    status,
                    "response contained an empty audio payload",
                ));
            }
            Ok(bytes.to_vec())
        })
        .await
    }
}

#[async_trait]
impl SpeechProvider for BaiduTts {
    fn id(&self) -> ProviderId {
        ProviderId::Baidu
    }

    async fn synthesize(&self, text: &str, language: &str, destination: &Path) -> Result<()> {
        let audio = self.fetch(text, language).await?;
        write_atomic(destination, &audio).await?;
        info!(provider = "baidu", path = %destination.display(), "cached speech");
        Ok(())
    }
}
