//! Shared test helpers.

#![allow(dead_code)]

use std::path::Path;

use voxcache::auth::{Credential, RequestSigner};
use voxcache::provider::polly::POLLY_SERVICE;

/// Bytes served as "MP3" audio by the mock endpoints.
pub const FAKE_MP3: &[u8] = b"ID3\x04\x00fake-mp3-frames";

/// `FAKE_MP3`, base64-encoded.
pub const FAKE_MP3_BASE64: &str = "SUQzBABmYWtlLW1wMy1mcmFtZXM=";

/// A Polly signer over fixed test credentials.
pub fn polly_signer() -> RequestSigner {
    RequestSigner::from_credential(
        POLLY_SERVICE,
        Credential::new("AKIDTEST", "test-secret", "us-east-1"),
    )
    .unwrap()
}

/// Translate web response carrying `FAKE_MP3` on the RPC line.
pub fn batchexecute_body() -> String {
    format!(
        ")]}}'\n\n107\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{FAKE_MP3_BASE64}\\\"]\",null,null,null,\"generic\"]]\n25\n[[\"e\",4,null,null,143]]\n"
    )
}

/// Names of every entry in `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|it| {
            it.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
