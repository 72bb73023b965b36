//! Convenience re-exports for common use.

pub use crate::acquire::{AcquisitionRequest, AudioAcquirer, SpeechSource};
pub use crate::auth::{Credential, CredentialProvider, RequestSigner};
pub use crate::cache::{AudioCache, CacheKey};
pub use crate::config::VoxConfig;
pub use crate::error::{Result, VoxError};
pub use crate::provider::{ProviderClient, ProviderId, SpeechProvider};
