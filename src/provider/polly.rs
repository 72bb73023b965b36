//! Amazon Polly `SynthesizeSpeech` (`POST /v1/speech`) with SigV4 signing.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::http::{host_header, parse_url, shared_client, status_to_error, trim_trailing_slash};
use super::{ProviderId, SpeechProvider};
use crate::auth::{RequestSigner, UnsignedRequest};
use crate::cache::write_atomic;
use crate::error::{Result, VoxError};
use crate::util::timeout::with_timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// SigV4 service name for Polly.
pub const POLLY_SERVICE: &str = "polly";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesizeSpeechBody<'a> {
    output_format: &'static str,
    text: &'a str,
    voice_id: &'a str,
}

/// Polly client. The language tag of a source selector is the Polly voice id
/// (`aws|Zhiyu` synthesizes with `VoiceId: Zhiyu`).
#[derive(Debug, Clone)]
pub struct PollyTts {
    signer: RequestSigner,
    endpoint: String,
    timeout: Duration,
}

impl PollyTts {
    /// Target `https://polly.<region>.amazonaws.com`, region taken from the
    /// signer's credential.
    pub fn new(signer: RequestSigner) -> Self {
        let endpoint = format!("https://polly.{}.amazonaws.com", signer.region());
        Self::new_with_base_url(signer, endpoint)
    }

    pub fn new_with_base_url(signer: RequestSigner, base_url: impl Into<String>) -> Self {
        Self {
            signer,
            endpoint: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the MP3 bytes for `text` spoken by `voice_id`.
    pub async fn fetch(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let url = parse_url(&format!("{}/v1/speech", trim_trailing_slash(&self.endpoint)))?;
        let body = serde_json::to_vec(&SynthesizeSpeechBody {
            output_format: "mp3",
            text,
            voice_id,
        })?;

        let unsigned = UnsignedRequest::new("POST", host_header(&url)?, url.path())
            .with_header("content-type", "application/json")
            .with_body(body);
        let signed = self.signer.sign_request(unsigned, Utc::now());
        debug!(provider = "aws", voice_id, "requesting speech");

        with_timeout(self.timeout, async {
            let mut request = shared_client().post(url);
            for (name, value) in &signed.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            let response = request.body(signed.body).send().await?;

            let status = response.status().as_u16();
            if status != 200 {
                let body = response.text().await.unwrap_or_default();
                return Err(status_to_error(ProviderId::AwsPolly.as_str(), status, &body));
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(VoxError::provider(
                    ProviderId::AwsPolly.as_str(),
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
impl SpeechProvider for PollyTts {
    fn id(&self) -> ProviderId {
        ProviderId::AwsPolly
    }

    async fn synthesize(&self, text: &str, language: &str, destination: &Path) -> Result<()> {
        let audio = self.fetch(text, language).await?;
        write_atomic(destination, &audio).await?;
        info!(provider = "aws", path = %destination.display(), "cached speech");
        Ok(())
    }
}
