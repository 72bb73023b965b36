//! Source selectors and acquisition requests.

use std::fmt;
use std::str::FromStr;

use crate::cache::CacheKey;
use crate::error::{Result, VoxError};
use crate::provider::ProviderId;

/// A parsed `"<provider>|<language>"` selector, e.g. `aws|Zhiyu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeechSource {
    pub provider: ProviderId,
    /// Language tag, or the voice id for Polly.
    pub language: String,
}

impl SpeechSource {
    pub fn new(provider: ProviderId, language: impl Into<String>) -> Self {
        Self {
            provider,
            language: language.into(),
        }
    }
}

impl FromStr for SpeechSource {
    type Err = VoxError;

    fn from_str(s: &str) -> Result<Self> {
        let (provider, language) = s.split_once('|').ok_or_else(|| {
            VoxError::Configuration(format!(
                "source '{s}' must look like '<provider>|<language>'"
            ))
        })?;
        let provider = provider.parse::<ProviderId>()?;
        if language.is_empty() {
            return Err(VoxError::Configuration(format!(
                "source '{s}' has an empty language tag"
            )));
        }
        if !is_safe_tag(language) {
            return Err(VoxError::Configuration(format!(
                "source '{s}' has a language tag that is not a plain name"
            )));
        }
        Ok(Self::new(provider, language))
    }
}

/// The tag ends up inside a file name, so it must stay one path component.
fn is_safe_tag(tag: &str) -> bool {
    !tag.contains("..")
        && !tag.chars().any(|c| {
            c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
}

impl fmt::Display for SpeechSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.provider, self.language)
    }
}

/// One immutable (text, provider, language) acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcquisitionRequest {
    text: String,
    source: SpeechSource,
}

impl AcquisitionRequest {
    pub fn new(text: impl Into<String>, source: SpeechSource) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(VoxError::InvalidArgument(
                "speech text cannot be empty".to_string(),
            ));
        }
        Ok(Self { text, source })
    }

    /// Parse the selector first, so a bad selector is reported even for
    /// empty text.
    pub fn parse(text: impl Into<String>, source: &str) -> Result<Self> {
        let source = source.parse::<SpeechSource>()?;
        Self::new(text, source)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn provider(&self) -> ProviderId {
        self.source.provider
    }

    pub fn language(&self) -> &str {
        &self.source.language
    }

    pub fn source(&self) -> &SpeechSource {
        &self.source
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::build(&self.text, self.source.provider, &self.source.language)
    }
}
