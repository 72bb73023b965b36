//! AWS Signature Version 4 request signing.
//!
//! Signing runs in four steps:
//! 1. canonical request: method, encoded path, sorted query, sorted
//!    lowercase headers, signed-header list and the hex SHA-256 of the body,
//! 2. string to sign: algorithm, timestamp, credential scope and the hash of
//!    the canonical request,
//! 3. signing key: `HMAC("AWS4" + secret, date)` chained over region, service
//!    and `aws4_request`,
//! 4. signature: hex `HMAC(signing_key, string_to_sign)`.
//!
//! The result is an `authorization` header plus `x-amz-date` and, for
//! temporary credentials, `x-amz-security-token`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::credentials::{Credential, CredentialProvider};
use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const TERMINATOR: &str = "aws4_request";

/// An HTTP request before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRequest {
    pub method: String,
    /// Host as sent in the `Host` header, including a non-default port.
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl UnsignedRequest {
    pub fn new(method: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Headers produced by [`RequestSigner::sign`], names lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders(Vec<(String, String)>);

impl SignedHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn authorization(&self) -> &str {
        self.get("authorization").unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A request ready to send: the caller's headers plus the signing headers.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Signs requests for one AWS service with credentials resolved up front.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    credential: Credential,
}

impl RequestSigner {
    /// Resolve credentials once; any resolution failure is returned here
    /// rather than surfacing later as a bad signature.
    pub async fn new(
        service: impl Into<String>,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        let credential = credentials.resolve().await?;
        Ok(Self {
            service: service.into(),
            credential,
        })
    }

    /// Sign with an already-known credential.
    pub fn from_credential(service: impl Into<String>, credential: Credential) -> Result<Self> {
        Ok(Self {
            service: service.into(),
            credential: credential.validate()?,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn region(&self) -> &str {
        &self.credential.region
    }

    /// Compute the signing headers for `request` at `timestamp`.
    pub fn sign(&self, request: &UnsignedRequest, timestamp: DateTime<Utc>) -> SignedHeaders {
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date = timestamp.format("%Y%m%d").to_string();

        let mut headers = canonical_header_map(request);
        headers
            .entry("x-amz-date".to_string())
            .or_default()
            .push(amz_date.clone());
        if let Some(token) = &self.credential.session_token {
            headers
                .entry("x-amz-security-token".to_string())
                .or_default()
                .push(token.clone());
        }

        let signed_header_names = headers.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical = canonical_request(request, &headers, &signed_header_names);

        let scope = format!(
            "{date}/{}/{}/{TERMINATOR}",
            self.credential.region, self.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical.as_bytes()))
        );

        let key = signing_key(
            &self.credential.secret_access_key,
            &date,
            &self.credential.region,
            &self.service,
        );
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        let mut out = vec![
            (
                "authorization".to_string(),
                format!(
                    "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_header_names}, Signature={signature}",
                    self.credential.access_key_id
                ),
            ),
            ("x-amz-date".to_string(), amz_date),
        ];
        if let Some(token) = &self.credential.session_token {
            out.push(("x-amz-security-token".to_string(), token.clone()));
        }
        SignedHeaders(out)
    }

    /// Sign `request` and merge the signing headers into it.
    pub fn sign_request(&self, request: UnsignedRequest, timestamp: DateTime<Utc>) -> SignedRequest {
        let signed = self.sign(&request, timestamp);
        let mut headers = request.headers;
        headers.extend(signed.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        SignedRequest {
            method: request.method,
            host: request.host,
            path: request.path,
            query: request.query,
            headers,
            body: request.body,
        }
    }
}

fn canonical_header_map(request: &UnsignedRequest) -> BTreeMap<String, Vec<String>> {
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &request.headers {
        headers
            .entry(name.trim().to_ascii_lowercase())
            .or_default()
            .push(collapse_whitespace(value));
    }
    headers
        .entry("host".to_string())
        .or_insert_with(|| vec![request.host.clone()]);
    headers
}

fn canonical_request(
    request: &UnsignedRequest,
    headers: &BTreeMap<String, Vec<String>>,
    signed_header_names: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect();

    format!(
        "{}\n{}\n{}\n{canonical_headers}\n{signed_header_names}\n{}",
        request.method.to_ascii_uppercase(),
        canonical_path(&request.path),
        canonical_query(&request.query),
        hex::encode(Sha256::digest(&request.body)),
    )
}

// Paths are encoded once, segment by segment; the Polly endpoint has no
// characters that would need the double encoding other services expect.
fn canonical_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 encoding: everything but `A-Z a-z 0-9 - _ . ~` is percent-encoded.
fn uri_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length is unrestricted");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, TERMINATOR.as_bytes())
}
