//! Shared HTTP clients and response helpers.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::Url;

use crate::error::{Result, VoxError};

/// Browser-like user agent; the Baidu endpoint rejects library defaults.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// Per-request deadlines are applied by each provider with
/// [`crate::util::timeout::with_timeout`].
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build a client that speaks HTTP/1.1 and advertises exactly `http/1.1`
/// in the TLS ALPN extension.
///
/// The Baidu TTS server intermittently answers `200 OK` with an empty body
/// when the handshake carries no ALPN extension.
pub fn http1_alpn_client() -> Result<reqwest::Client> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut tls = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| VoxError::Configuration(format!("TLS setup failed: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    tls.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(reqwest::Client::builder()
        .use_preconfigured_tls(tls)
        .http1_only()
        .build()?)
}

/// Build the error for a non-success response from a hard-failure provider.
pub fn status_to_error(provider: &str, status: u16, body: &str) -> VoxError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.chars().take(512).collect()
        }
    });
    VoxError::provider(provider, status, message)
}

/// Pull a human-readable message out of a JSON error body.
///
/// Handles `{"message": ..}`, `{"Message": ..}` (AWS) and
/// `{"error": {"message": ..}}` (Google).
pub fn extract_error_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .or_else(|| parsed.get("error").and_then(|e| e.get("message")))
        .and_then(|m| m.as_str())
        .map(ToString::to_string)
}

/// Value of the `Host` header for `url`, with the port when it is not the
/// scheme default.
pub fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| VoxError::Configuration(format!("URL has no host: {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

pub(crate) fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

pub(crate) fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| VoxError::Configuration(format!("invalid URL '{raw}': {e}")))
}
