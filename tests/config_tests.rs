//! Configuration loading and its effect on the acquirer.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use voxcache::acquire::AudioAcquirer;
use voxcache::config::VoxConfig;
use voxcache::error::VoxError;
use voxcache::provider::{GoogleCloudAuth, ProviderId};

#[test]
fn config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("voxcache.toml");
    std::fs::write(
        &path,
        r#"
        cache_dir = "/srv/media"
        request_timeout_secs = 9

        [google]
        tld = "com.tw"
        slow = true
        "#,
    )
    .unwrap();

    let config = VoxConfig::from_file(&path).unwrap();

    assert_eq!(config.request_timeout(), Duration::from_secs(9));
    assert_eq!(config.google.tld.as_deref(), Some("com.tw"));
    assert!(config.google.slow);
}

#[test]
fn missing_config_file_is_a_configuration_error() {
    let err = VoxConfig::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, VoxError::Configuration(msg) if msg.contains("here.toml")));
}

#[test]
fn zero_timeout_is_rejected() {
    let err = VoxConfig::from_toml_str("request_timeout_secs = 0").unwrap_err();
    assert!(matches!(err, VoxError::Configuration(_)));
}

#[test]
fn access_token_wins_over_api_key() {
    let config = VoxConfig::from_toml_str(
        r#"
        [google_cloud]
        api_key = "key"
        access_token = "token"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.google_cloud_auth(),
        Some(GoogleCloudAuth::AccessToken("token".to_string()))
    );
}

#[tokio::test]
async fn profile_from_config_resolves_polly_credentials() {
    let dir = TempDir::new().unwrap();
    let credentials = dir.path().join("credentials");
    let aws_config = dir.path().join("config");
    std::fs::write(
        &credentials,
        "[tts]\naws_access_key_id = AKIDFILE\naws_secret_access_key = file-secret\n",
    )
    .unwrap();
    std::fs::write(&aws_config, "[profile tts]\nregion = ap-northeast-1\n").unwrap();

    let raw = format!(
        "cache_dir = {:?}\n[aws]\nprofile = \"tts\"\ncredentials_file = {:?}\nconfig_file = {:?}\n",
        dir.path().join("media"),
        credentials,
        aws_config
    );
    let config = VoxConfig::from_toml_str(&raw).unwrap();

    let acquirer = AudioAcquirer::from_config(&config).await.unwrap();

    assert!(acquirer.providers().contains(&ProviderId::AwsPolly));
    assert!(acquirer.providers().contains(&ProviderId::GoogleFree));
    assert!(acquirer.providers().contains(&ProviderId::Baidu));
}

#[tokio::test]
async fn configured_profile_without_keys_fails_fast() {
    let dir = TempDir::new().unwrap();
    let credentials = dir.path().join("credentials");
    std::fs::write(&credentials, "[tts]\nregion = us-east-1\n").unwrap();

    let mut config = VoxConfig::new()
        .with_cache_dir(dir.path())
        .with_aws_profile("tts");
    config.aws.credentials_file = Some(credentials);
    config.aws.config_file = Some(dir.path().join("config"));

    let err = AudioAcquirer::from_config(&config).await.unwrap_err();

    assert!(matches!(err, VoxError::Credential(_)));
}

#[tokio::test]
async fn google_credentials_file_registers_gcloud() {
    let dir = TempDir::new().unwrap();
    let key_file = dir.path().join("adc.json");
    std::fs::write(
        &key_file,
        r#"{"type": "authorized_user", "client_id": "id", "client_secret": "secret", "refresh_token": "rt"}"#,
    )
    .unwrap();
    let raw = format!(
        "cache_dir = {:?}\n[google_cloud]\nservice_account_file = {:?}\n",
        dir.path().join("media"),
        key_file
    );
    let config = VoxConfig::from_toml_str(&raw).unwrap();

    assert_eq!(
        config.google_cloud_auth(),
        Some(GoogleCloudAuth::ServiceAccountFile(key_file))
    );
    let acquirer = AudioAcquirer::from_config(&config).await.unwrap();

    assert!(acquirer.providers().contains(&ProviderId::GoogleCloud));
}
