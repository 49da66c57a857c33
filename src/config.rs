//! The configuration of one download, built once at process start.

use std::{path::PathBuf, time::Duration};

/// The default GitHub REST API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// The archive format requested from the artifact download endpoint.
pub const DEFAULT_FILE_TYPE: &str = "zip";
/// The default connect and read timeout of every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to locate and download one artifact.
///
/// Resolvers and the downloader take this by reference; nothing reads it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The REST API base URL, without a trailing slash.
    pub api_base: String,
    /// The repository owner.
    pub owner: String,
    /// The repository name.
    pub repo: String,
    /// The branch a run must have been built from.
    pub branch: String,
    /// The workflow file name, e.g. `build.yml`.
    pub workflow: String,
    /// The event a run must have been triggered by, e.g. `push`.
    pub event: String,
    /// The exact, case-sensitive artifact name.
    pub artifact: String,
    /// The archive suffix of the download endpoint.
    pub file_type: String,
    /// The file the artifact is written to. Overwritten if it exists.
    pub destination: PathBuf,
    /// The connect and read timeout. [`None`] waits indefinitely.
    pub timeout: Option<Duration>,
    /// Whether to check the downloaded bytes against the digest the API advertises.
    pub verify_digest: bool,
}

impl Config {
    /// Creates a [`Config`] with defaults for everything but the repository, workflow and
    /// artifact. The destination defaults to `{artifact}.{file_type}` in the current directory.
    pub fn new<S>(owner: S, repo: S, workflow: S, artifact: S) -> Self
    where
        S: Into<String>,
    {
        let artifact = artifact.into();
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            owner: owner.into(),
            repo: repo.into(),
            branch: String::from("main"),
            workflow: workflow.into(),
            event: String::from("push"),
            destination: default_file_name(&artifact, DEFAULT_FILE_TYPE).into(),
            artifact,
            file_type: DEFAULT_FILE_TYPE.to_owned(),
            timeout: Some(DEFAULT_TIMEOUT),
            verify_digest: false,
        }
    }

    /// Points the configuration at another API endpoint. A trailing slash is stripped.
    #[must_use]
    pub fn with_api_base<S>(mut self, api_base: S) -> Self
    where
        S: Into<String>,
    {
        let api_base: String = api_base.into();
        self.api_base = api_base.trim_end_matches('/').to_owned();
        self
    }

    /// The path prefix of every repository-scoped endpoint.
    pub fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
    }
}

/// The file name an artifact is saved as when no explicit path is given.
pub fn default_file_name(artifact: &str, file_type: &str) -> String {
    format!("{artifact}.{file_type}")
}

/// Picks the file an artifact is written to.
///
/// An explicit `output` wins. Otherwise the artifact is saved as
/// [`default_file_name`] in the first directory given, `download_dir` before `fallback_dir`,
/// or in the current directory if there is none.
pub fn destination(
    output: Option<PathBuf>,
    download_dir: Option<PathBuf>,
    fallback_dir: Option<PathBuf>,
    artifact: &str,
    file_type: &str,
) -> PathBuf {
    output.unwrap_or_else(|| {
        download_dir
            .or(fallback_dir)
            .unwrap_or_default()
            .join(default_file_name(artifact, file_type))
    })
}

/// Converts a timeout in whole seconds. `0` waits indefinitely.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
