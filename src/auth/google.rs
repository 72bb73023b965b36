//! OAuth tokens for Google Cloud from a credentials file or Application
//! Default Credentials.

use std::fmt;
use std::path::Path;

use google_cloud_auth::credentials::{
    service_account, user_account, Builder as CredentialsBuilder, CacheableResource, Credentials,
};
use http::Extensions;
use tracing::{debug, warn};

use crate::error::{Result, VoxError};

/// Scope requested for Text-to-Speech calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

fn scopes() -> Vec<String> {
    vec![CLOUD_PLATFORM_SCOPE.to_string()]
}

/// Mints bearer tokens, refreshing them as they expire.
pub struct GoogleTokenSource {
    credentials: Credentials,
}

impl fmt::Debug for GoogleTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTokenSource")
            .field("credentials", &"<credentials>")
            .finish()
    }
}

impl GoogleTokenSource {
    /// Application Default Credentials: `GOOGLE_APPLICATION_CREDENTIALS`,
    /// the gcloud user file, then the metadata server.
    pub fn application_default() -> Result<Self> {
        let credentials = CredentialsBuilder::default()
            .with_scopes(scopes())
            .build()
            .map_err(|e| {
                VoxError::Credential(format!(
                    "cannot initialize Application Default Credentials: {e}"
                ))
            })?;
        debug!("using Google Application Default Credentials");
        Ok(Self { credentials })
    }

    /// A service-account key or `authorized_user` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VoxError::Configuration(format!(
                "cannot read Google credentials file {}: {e}",
                path.display()
            ))
        })?;
        let json: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            VoxError::Configuration(format!(
                "Google credentials file {} is not JSON: {e}",
                path.display()
            ))
        })?;

        let kind = json
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let credentials = match kind.as_str() {
            "service_account" => service_account::Builder::new(json)
                .with_access_specifier(service_account::AccessSpecifier::from_scopes(scopes()))
                .build(),
            "authorized_user" => user_account::Builder::new(json)
                .with_scopes(scopes())
                .build(),
            other => {
                return Err(VoxError::Configuration(format!(
                    "unsupported credential type '{other}' in {}; expected 'service_account' or 'authorized_user'",
                    path.display()
                )))
            }
        }
        .map_err(|e| {
            VoxError::Credential(format!(
                "cannot load {kind} credentials from {}: {e}",
                path.display()
            ))
        })?;

        debug!(path = %path.display(), kind = %kind, "loaded Google credentials file");
        Ok(Self { credentials })
    }

    /// A current access token, without the `Bearer ` prefix.
    pub async fn access_token(&self) -> Result<String> {
        let headers = self
            .credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to fetch Google access token");
                VoxError::Credential(format!("cannot fetch Google access token: {e}"))
            })?;

        let headers = match headers {
            CacheableResource::New { data, .. } => data,
            CacheableResource::NotModified => {
                return Err(VoxError::Credential(
                    "Google credentials returned no token".to_string(),
                ))
            }
        };
        let value = headers
            .get(http::header::AUTHORIZATION)
            .ok_or_else(|| {
                VoxError::Credential("Google credentials produced no Authorization header".to_string())
            })?
            .to_str()
            .map_err(|e| VoxError::Credential(format!("invalid Authorization header: {e}")))?;

        value
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| VoxError::Credential("Authorization header is not a bearer token".to_string()))
    }
}
