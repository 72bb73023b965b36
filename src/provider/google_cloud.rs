//! Google Cloud Text-to-Speech (`v1/text:synthesize`).
//!
//! Each call picks a random Wavenet voice and jitters pitch and speaking rate
//! so repeated phrases do not sound identical. Failures are soft: they are
//! logged and no file is written.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::http::{parse_url, shared_client, status_to_error, trim_trailing_slash};
use super::{ProviderId, SpeechProvider};
use crate::auth::GoogleTokenSource;
use crate::cache::write_atomic;
use crate::error::{Result, VoxError};
use crate::util::timeout::with_timeout;

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const PITCH_RANGE: (f64, f64) = (-2.0, 2.0);
pub const SPEAKING_RATE_RANGE: (f64, f64) = (1.0, 1.10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    Female,
    Male,
}

/// One entry of the voice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    pub language_code: &'static str,
    pub name: &'static str,
    pub gender: SsmlGender,
}

const fn voice(language_code: &'static str, name: &'static str, gender: SsmlGender) -> VoiceProfile {
    VoiceProfile {
        language_code,
        name,
        gender,
    }
}

/// Mandarin Wavenet voices calls are drawn from.
pub const VOICES: [VoiceProfile; 7] = [
    voice("cmn-CN", "cmn-CN-Wavenet-A", SsmlGender::Female),
    voice("cmn-CN", "cmn-CN-Wavenet-B", SsmlGender::Male),
    voice("cmn-CN", "cmn-CN-Wavenet-C", SsmlGender::Male),
    voice("cmn-CN", "cmn-CN-Wavenet-D", SsmlGender::Female),
    voice("cmn-TW", "cmn-TW-Wavenet-A", SsmlGender::Female),
    voice("cmn-TW", "cmn-TW-Wavenet-B", SsmlGender::Male),
    voice("cmn-TW", "cmn-TW-Wavenet-C", SsmlGender::Male),
];

/// How requests are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum GoogleCloudAuth {
    /// Sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token, sent as `Authorization: Bearer`.
    AccessToken(String),
    /// Service-account key or `authorized_user` JSON file; tokens are minted
    /// and refreshed from it.
    ServiceAccountFile(PathBuf),
    /// Application Default Credentials.
    ApplicationDefault,
}

impl fmt::Debug for GoogleCloudAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(..)"),
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
            Self::ServiceAccountFile(path) => f.debug_tuple("ServiceAccountFile").field(path).finish(),
            Self::ApplicationDefault => f.write_str("ApplicationDefault"),
        }
    }
}

/// Randomized voice settings for one synthesis call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceDraw {
    pub voice: VoiceProfile,
    pub pitch: f64,
    pub speaking_rate: f64,
}

impl VoiceDraw {
    /// Draw fresh settings from the thread-local generator. The voice is
    /// uniform over the whole table whatever the requested language tag.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let voice = *VOICES.choose(&mut rng).unwrap_or(&VOICES[0]);

        Self {
            voice,
            pitch: rng.gen_range(PITCH_RANGE.0..=PITCH_RANGE.1),
            speaking_rate: rng.gen_range(SPEAKING_RATE_RANGE.0..=SPEAKING_RATE_RANGE.1),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: &'static str,
    name: &'static str,
    ssml_gender: SsmlGender,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    pitch: f64,
    speaking_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Google Cloud TTS client.
#[derive(Debug, Clone)]
pub struct GoogleCloudTts {
    auth: GoogleCloudAuth,
    tokens: Option<Arc<GoogleTokenSource>>,
    base_url: String,
    timeout: Duration,
}

impl GoogleCloudTts {
    /// Fails when a credentials file cannot be loaded.
    pub fn new(auth: GoogleCloudAuth) -> Result<Self> {
        Self::new_with_base_url(auth, DEFAULT_BASE_URL)
    }

    pub fn new_with_base_url(auth: GoogleCloudAuth, base_url: impl Into<String>) -> Result<Self> {
        let tokens = match &auth {
            GoogleCloudAuth::ServiceAccountFile(path) => {
                Some(Arc::new(GoogleTokenSource::from_file(path)?))
            }
            GoogleCloudAuth::ApplicationDefault => {
                Some(Arc::new(GoogleTokenSource::application_default()?))
            }
            GoogleCloudAuth::ApiKey(_) | GoogleCloudAuth::AccessToken(_) => None,
        };
        Ok(Self {
            auth,
            tokens,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn auth(&self) -> &GoogleCloudAuth {
        &self.auth
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Synthesize `text` with the given voice settings.
    pub async fn fetch(&self, text: &str, draw: &VoiceDraw) -> Result<Vec<u8>> {
        let mut url = parse_url(&format!(
            "{}/v1/text:synthesize",
            trim_trailing_slash(&self.base_url)
        ))?;
        if let GoogleCloudAuth::ApiKey(key) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }

        let payload = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: draw.voice.language_code,
                name: draw.voice.name,
                ssml_gender: draw.voice.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                pitch: draw.pitch,
                speaking_rate: draw.speaking_rate,
            },
        };
        debug!(
            provider = "gcloud",
            voice = draw.voice.name,
            pitch = draw.pitch,
            speaking_rate = draw.speaking_rate,
            "requesting speech"
        );

        with_timeout(self.timeout, async {
            let mut request = shared_client().post(url).json(&payload);
            if let Some(token) = self.bearer_token().await? {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;

            let status = response.status().as_u16();
            let body = response.text().await?;
            if status != 200 {
                return Err(status_to_error(ProviderId::GoogleCloud.as_str(), status, &body));
            }

            let parsed: SynthesizeResponse = serde_json::from_str(&body)?;
            let audio = STANDARD.decode(parsed.audio_content.as_bytes()).map_err(|e| {
                VoxError::provider(
                    ProviderId::GoogleCloud.as_str(),
                    status,
                    format!("audioContent is not valid base64: {e}"),
                )
            })?;
            if audio.is_empty() {
                return Err(VoxError::provider(
                    ProviderId::GoogleCloud.as_str(),
                    status,
                    "response contained an empty audio payload",
                ));
            }
            Ok(audio)
        })
        .await
    }

    async fn bearer_token(&self) -> Result<Option<String>> {
        match (&self.auth, &self.tokens) {
            (GoogleCloudAuth::AccessToken(token), _) => Ok(Some(token.clone())),
            (_, Some(tokens)) => tokens.access_token().await.map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl SpeechProvider for GoogleCloudTts {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleCloud
    }

    async fn synthesize(&self, text: &str, _language: &str, destination: &Path) -> Result<()> {
        let draw = VoiceDraw::random();
        let outcome = match self.fetch(text, &draw).await {
            Ok(audio) => write_atomic(destination, &audio).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => info!(provider = "gcloud", path = %destination.display(), "cached speech"),
            Err(err) => warn!(provider = "gcloud", error = %err, "Google Cloud TTS failed; no audio written"),
        }
        Ok(())
    }
}
