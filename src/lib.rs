//! Downloads the named artifact of the latest successful GitHub Actions workflow run.
//!
//! The pipeline is linear: the workflow is resolved from its file name, then its latest
//! completed and successful run on a branch and event, then the run's artifact by exact name.
//! The artifact is finally streamed to disk.
//!
//! ```no_run
//! # async fn run() -> artifact_dl::error::Result<()> {
//! use artifact_dl::{
//!     client::{GitHubClient, Token},
//!     config::Config,
//!     progress::Silent,
//!     transactions::download_latest_artifact,
//! };
//!
//! let config = Config::new("octo", "app", "build.yml", "build-output");
//! let client = GitHubClient::new(&config, &Token::new("ghp_…"))?;
//! download_latest_artifact(&client, &config, &mut Silent).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod framework;
pub mod progress;
pub mod transactions;
pub mod workflow;
