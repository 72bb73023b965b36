//! Content-keyed on-disk audio cache.
//!
//! Every synthesized clip lives at `<cache_dir>/<key>.mp3`, where the key is
//! derived from the text, the provider and the language tag. A file that
//! exists is a hit; this crate never rewrites or removes cached files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::provider::ProviderId;

/// Extension of every cached clip.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Characters reserved on common filesystems.
const RESERVED_CHARS: &str = r#"[/:*?"<>|]"#;

fn reserved_chars() -> &'static Regex {
    static RESERVED: OnceLock<Regex> = OnceLock::new();
    RESERVED.get_or_init(|| Regex::new(RESERVED_CHARS).expect("reserved character class is valid"))
}

/// Strip `/ : * ? " < > |` from `text`, leaving everything else intact.
pub fn sanitize(text: &str) -> String {
    reserved_chars().replace_all(text, "").into_owned()
}

/// Filesystem-safe cache key for a (text, provider, language) triple.
///
/// Two texts that differ only in reserved characters share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn build(text: &str, provider: ProviderId, language: &str) -> Self {
        let language = sanitize(language).replace('\\', "");
        Self(format!("{}_{}_{}", sanitize(text), provider, language))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Basename of the cache entry, e.g. `你好_baidu_zh.mp3`.
    pub fn file_name(&self) -> String {
        format!("{}.{AUDIO_EXTENSION}", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-supplied directory holding cached clips.
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub async fn contains(&self, key: &CacheKey) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }

    /// Create the cache directory itself. Nothing above or below it is made.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Whether `path` names an entry directly inside the cache directory.
    pub fn holds(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path()) && path.file_name().is_some()
    }
}

/// Write `bytes` to `destination` without ever exposing a partial file.
///
/// The data lands in a hidden sibling first and is renamed into place, so a
/// failed write leaves nothing at `destination`. The parent directory must
/// already exist.
pub async fn write_atomic(destination: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // Fixed-length name so a destination near NAME_MAX still stages.
    let staging = parent.join(format!(".{}.part", Uuid::new_v4().simple()));

    if let Err(err) = tokio::fs::write(&staging, bytes).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&staging, destination).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err.into());
    }

    debug!(path = %destination.display(), bytes = bytes.len(), "wrote cache entry");
    Ok(())
}
