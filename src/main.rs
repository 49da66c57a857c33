//! Downloads the artifact of the latest successful GitHub Actions workflow run.

use std::path::PathBuf;

use anyhow::Context as _;
use artifact_dl::{
    client::GitHubClient,
    config::{self, Config},
    env::token_from_env_or_prompt,
    progress::{Bar, Silent},
    transactions::download_latest_artifact,
};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository owner
    #[arg(long, env = "GITHUB_OWNER")]
    owner: String,

    /// Repository name
    #[arg(long, env = "GITHUB_REPO")]
    repo: String,

    /// Branch the run must have been built from
    #[arg(long, env = "GITHUB_BRANCH", default_value = "main")]
    branch: String,

    /// Workflow file name, e.g. build.yml
    #[arg(long, env = "WORKFLOW_NAME")]
    workflow: String,

    /// Event the run must have been triggered by, e.g. push or pull_request
    #[arg(long, env = "WORKFLOW_EVENT", default_value = "push")]
    event: String,

    /// Exact, case-sensitive artifact name
    #[arg(long, env = "ARTIFACT_NAME")]
    artifact: String,

    /// Directory the artifact is saved to [default: your downloads directory]
    #[arg(long, env = "DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Explicit destination file, overrides --download-dir
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Archive format requested from the download endpoint
    #[arg(long, default_value = config::DEFAULT_FILE_TYPE)]
    file_type: String,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = config::DEFAULT_API_BASE)]
    api_base: String,

    /// Connect and read timeout in seconds, 0 to wait indefinitely
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Check the download against the digest GitHub advertises for the artifact
    #[arg(long)]
    verify_digest: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let destination = config::destination(
            self.output,
            self.download_dir,
            dirs::download_dir(),
            &self.artifact,
            &self.file_type,
        );

        let mut config = Config::new(self.owner, self.repo, self.workflow, self.artifact)
            .with_api_base(self.api_base);
        config.branch = self.branch;
        config.event = self.event;
        config.file_type = self.file_type;
        config.destination = destination;
        config.timeout = config::timeout_from_secs(self.timeout);
        config.verify_digest = self.verify_digest;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let quiet = cli.quiet;
    let config = cli.into_config();
    debug!("configuration: {config:?}");

    let token = token_from_env_or_prompt()?;
    let client = GitHubClient::new(&config, &token)?;

    let result = if quiet {
        download_latest_artifact(&client, &config, &mut Silent).await
    } else {
        let mut bar = Bar::new(config.destination.display().to_string());
        download_latest_artifact(&client, &config, &mut bar).await
    };
    let downloaded = result.with_context(|| {
        format!(
            "failed to download artifact {} of {}/{}",
            config.artifact, config.owner, config.repo
        )
    })?;

    println!("Artifact downloaded successfully.");
    println!(
        "{} ({} bytes)",
        downloaded.path.display(),
        downloaded.bytes_written
    );
    Ok(())
}
