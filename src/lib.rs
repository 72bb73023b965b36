//! voxcache: fetch text-to-speech audio from several providers into a flat
//! cache directory.
//!
//! A request names the text and a source selector `"<provider>|<language>"`.
//! The audio lands in `<cache_dir>/<key>.mp3`, where the key is derived from
//! the text, provider and language; an existing file is never fetched again.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxcache::prelude::*;
//!
//! # async fn example() -> voxcache::error::Result<()> {
//! let config = VoxConfig::from_env().with_cache_dir("/tmp/media");
//! let acquirer = AudioAcquirer::from_config(&config).await?;
//! let file = acquirer.acquire("你好", "google|zh-CN").await?;
//! println!("{file}");
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
