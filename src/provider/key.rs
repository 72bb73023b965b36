//! Typed provider identifiers.

use std::str::FromStr;

use strum::{Display, IntoStaticStr};

use crate::error::VoxError;

/// The closed set of speech providers that can appear in a source selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr)]
pub enum ProviderId {
    /// Free Google Translate web TTS.
    #[strum(serialize = "google")]
    GoogleFree,
    /// Baidu translate portal TTS.
    #[strum(serialize = "baidu")]
    Baidu,
    /// Amazon Polly.
    #[strum(serialize = "aws")]
    AwsPolly,
    /// Google Cloud Text-to-Speech.
    #[strum(serialize = "gcloud")]
    GoogleCloud,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        Self::GoogleFree,
        Self::Baidu,
        Self::AwsPolly,
        Self::GoogleCloud,
    ];

    /// Wire name used in source selectors and cache file names.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw)
    }

    /// Hard-failure providers surface errors to the caller; the others log
    /// and carry on without writing a file.
    pub const fn fails_loudly(self) -> bool {
        matches!(self, Self::Baidu | Self::AwsPolly)
    }
}

impl FromStr for ProviderId {
    type Err = VoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            VoxError::Configuration(format!(
                "unknown provider '{s}' (expected one of: google, baidu, aws, gcloud)"
            ))
        })
    }
}
