//! Free Google Translate web TTS.
//!
//! Talks to the translate web app's `batchexecute` RPC the same way the
//! browser does. The endpoint is unauthenticated and best-effort, so every
//! failure is logged and swallowed: the caller simply sees no file.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use reqwest::header::{REFERER, USER_AGENT};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::http::{parse_url, shared_client, trim_trailing_slash};
use super::{ProviderId, SpeechProvider};
use crate::cache::write_atomic;
use crate::error::{Result, VoxError};
use crate::util::timeout::with_timeout;

const RPC_ID: &str = "jQ1olc";
const RPC_PATH: &str = "_/TranslateWebserverUi/data/batchexecute";
const DEFAULT_TLD: &str = "com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSLATE_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/47.0.2526.106 Safari/537.36";

/// Longest text the endpoint accepts in one request, in characters.
pub const MAX_PART_CHARS: usize = 100;

/// Client for the free translate TTS endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslateTts {
    base_url: String,
    slow: bool,
    timeout: Duration,
}

impl Default for GoogleTranslateTts {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslateTts {
    pub fn new() -> Self {
        Self::with_tld(DEFAULT_TLD)
    }

    /// Use `translate.google.<tld>`, e.g. `com.tw`.
    pub fn with_tld(tld: &str) -> Self {
        Self::new_with_base_url(format!("https://translate.google.{tld}"))
    }

    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            slow: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Ask for the slower reading speed.
    pub fn slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch MP3 bytes for `text`, one request per part, concatenated.
    pub async fn fetch(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let parts = split_text(text, MAX_PART_CHARS);
        if parts.is_empty() {
            return Err(VoxError::InvalidArgument(
                "no speakable text after splitting".to_string(),
            ));
        }

        let mut audio = Vec::new();
        for part in &parts {
            audio.extend(self.fetch_part(part, language).await?);
        }
        Ok(audio)
    }

    async fn fetch_part(&self, part: &str, language: &str) -> Result<Vec<u8>> {
        let url = parse_url(&format!("{}/{RPC_PATH}", trim_trailing_slash(&self.base_url)))?;
        let form = [("f.req", rpc_payload(part, language, self.slow)?)];
        let referer = format!("{}/", trim_trailing_slash(&self.base_url));
        debug!(provider = "google", language, chars = part.chars().count(), "requesting speech part");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(url)
                .header(USER_AGENT, TRANSLATE_USER_AGENT)
                .header(REFERER, referer)
                .form(&form)
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = response.text().await?;
            if status != 200 {
                return Err(VoxError::provider(
                    ProviderId::GoogleFree.as_str(),
                    status,
                    "translate TTS request failed",
                ));
            }
            decode_audio(&body).ok_or_else(|| {
                VoxError::provider(
                    ProviderId::GoogleFree.as_str(),
                    status,
                    "no audio stream in response",
                )
            })
        })
        .await
    }
}

#[async_trait]
impl SpeechProvider for GoogleTranslateTts {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleFree
    }

    async fn synthesize(&self, text: &str, language: &str, destination: &Path) -> Result<()> {
        let outcome = match self.fetch(text, language).await {
            Ok(audio) => write_atomic(destination, &audio).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => info!(provider = "google", path = %destination.display(), "cached speech"),
            Err(err) => {
                warn!(provider = "google", language, error = %err, "translate TTS failed; no audio written")
            }
        }
        Ok(())
    }
}

/// Build the `f.req` form value: the RPC envelope around a JSON-encoded
/// `[text, lang, speed, "null"]` parameter list.
fn rpc_payload(text: &str, language: &str, slow: bool) -> Result<String> {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = serde_json::to_string(&json!([text, language, speed, "null"]))?;
    Ok(serde_json::to_string(&json!([[[
        RPC_ID,
        parameter,
        Value::Null,
        "generic"
    ]]]))?)
}

fn audio_line() -> &'static Regex {
    static AUDIO: OnceLock<Regex> = OnceLock::new();
    AUDIO.get_or_init(|| Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).expect("audio pattern is valid"))
}

/// Find the base64 audio on the response line tagged with the RPC id.
fn decode_audio(body: &str) -> Option<Vec<u8>> {
    body.lines()
        .filter(|line| line.contains(RPC_ID))
        .filter_map(|line| audio_line().captures(line))
        .filter_map(|caps| caps.get(1))
        .find_map(|m| STANDARD.decode(m.as_str()).ok())
        .filter(|audio| !audio.is_empty())
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || "，。！？；：、,.!?;:…".contains(c)
}

fn flush(current: &mut String, current_len: &mut usize, parts: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    current.clear();
    *current_len = 0;
}

/// Split `text` into parts of at most `max_chars` characters, preferring
/// punctuation and whitespace boundaries.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for token in text.split_inclusive(is_boundary) {
        let token_len = token.chars().count();
        if current_len + token_len > max_chars {
            flush(&mut current, &mut current_len, &mut parts);
        }
        if token_len > max_chars {
            let chars: Vec<char> = token.chars().collect();
            for chunk in chars.chunks(max_chars) {
                current.extend(chunk.iter());
                current_len = chunk.len();
                if current_len == max_chars {
                    flush(&mut current, &mut current_len, &mut parts);
                }
            }
        } else {
            current.push_str(token);
            current_len += token_len;
        }
    }
    flush(&mut current, &mut current_len, &mut parts);

    parts
}
