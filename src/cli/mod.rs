//! Command-line front end for voxcache.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::acquire::{AcquisitionRequest, AudioAcquirer};
use crate::config::VoxConfig;
use crate::error::Result;

/// voxcache CLI
#[derive(Parser, Debug)]
#[command(name = "voxcache", version, about = "Fetch and cache text-to-speech audio")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch audio into the cache (no-op if already cached)
    Fetch(FetchArgs),
    /// Print the cache file name for a text without fetching
    Key(KeyArgs),
}

/// Arguments for `voxcache fetch`.
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Text to speak
    pub text: String,

    /// Source selector, `<provider>|<language>` (e.g. `baidu|zh`)
    #[arg(short, long)]
    pub source: String,

    /// Cache directory (overrides config and VOXCACHE_CACHE_DIR)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for `voxcache key`.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Text to speak
    pub text: String,

    /// Source selector, `<provider>|<language>`
    #[arg(short, long)]
    pub source: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Layer file, environment and flag settings.
    fn load_config(&self) -> Result<VoxConfig> {
        match &self.config {
            Some(path) => VoxConfig::from_file(path),
            None => Ok(VoxConfig::from_env()),
        }
    }
}

/// Run a parsed command, returning what should be printed on stdout.
pub async fn run(cli: Cli) -> Result<String> {
    match &cli.command {
        Commands::Key(args) => {
            let request = AcquisitionRequest::parse(&args.text, &args.source)?;
            Ok(request.cache_key().file_name())
        }
        Commands::Fetch(args) => {
            let mut config = cli.load_config()?;
            if let Some(dir) = &args.cache_dir {
                config = config.with_cache_dir(dir);
            }
            if let Some(secs) = args.timeout_secs {
                config = config.with_request_timeout(Duration::from_secs(secs));
            }

            let acquirer = AudioAcquirer::from_config(&config).await?;
            let request = AcquisitionRequest::parse(&args.text, &args.source)?;
            let file_name = acquirer.acquire_request(&request).await?;
            if !acquirer.cache_path(&request).exists() {
                tracing::warn!(file = %file_name, "provider produced no audio");
            }
            Ok(file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_fetch_with_options() {
        let cli = Cli::try_parse_from([
            "voxcache",
            "fetch",
            "你好",
            "--source",
            "baidu|zh",
            "--cache-dir",
            "/tmp/media",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.text, "你好");
                assert_eq!(args.source, "baidu|zh");
                assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/media")));
                assert_eq!(args.timeout_secs, Some(5));
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[test]
    fn parse_key_with_global_config() {
        let cli = Cli::try_parse_from(["voxcache", "key", "谢谢", "-s", "aws|Zhiyu", "-c", "vox.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("vox.toml")));
        assert!(matches!(cli.command, Commands::Key(ref args) if args.source == "aws|Zhiyu"));
    }

    #[test]
    fn parse_fetch_missing_source_is_error() {
        assert!(Cli::try_parse_from(["voxcache", "fetch", "你好"]).is_err());
    }

    #[tokio::test]
    async fn key_prints_file_name_without_network() {
        let cli = Cli::try_parse_from(["voxcache", "key", "a/b", "-s", "google|zh-CN"]).unwrap();
        assert_eq!(run(cli).await.unwrap(), "ab_google_zh-CN.mp3");
    }
}
