//! AWS credential resolution, Signature Version 4 request signing and Google
//! Cloud OAuth tokens.

pub mod credentials;
pub mod google;
pub mod sigv4;

pub use credentials::{
    Credential, CredentialProvider, EnvCredentials, ProfileCredentials, StaticCredentials,
    DEFAULT_PROFILE,
};
pub use google::{GoogleTokenSource, CLOUD_PLATFORM_SCOPE};
pub use sigv4::{RequestSigner, SignedHeaders, SignedRequest, UnsignedRequest};
