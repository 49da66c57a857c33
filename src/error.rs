//! Errors raised while resolving and downloading artifacts.

use std::{fmt, io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for artifact-dl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type of every transaction in this crate.
///
/// Nothing is retried: each variant is fatal to the download it interrupts.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with a non-2xx status.
    #[error("request to {url} failed: {status}")]
    Http {
        /// The requested URL.
        url: String,
        /// The status the API answered with.
        status: StatusCode,
    },

    /// The request could not be sent, or its body could not be read or decoded.
    #[error("request to {url} failed: {source}")]
    Request {
        /// The requested URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A resolver scanned everything the API returned without a match.
    #[error("{0}")]
    NotFound(Missing),

    /// The destination file could not be created or written.
    #[error("failed to write {path:?}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The downloaded bytes do not hash to the digest the API advertised.
    #[error("digest mismatch: expected sha256:{expected}, got sha256:{actual}")]
    DigestMismatch {
        /// The advertised hex digest.
        expected: String,
        /// The hex digest of the downloaded bytes.
        actual: String,
    },

    /// The credential prompt failed.
    #[error("failed to read GitHub token: {0}")]
    Credential(#[source] io::Error),

    /// Neither the environment nor the prompt produced a token.
    #[error("no GitHub token provided")]
    MissingCredential,

    /// The token contains characters that can't be sent in a header.
    #[error("GitHub token is not a valid header value")]
    InvalidCredential,
}

impl Error {
    pub(crate) fn request(url: &str, source: reqwest::Error) -> Self {
        match source.status() {
            Some(status) => Self::Http {
                url: url.to_owned(),
                status,
            },
            None => Self::Request {
                url: url.to_owned(),
                source: source.without_url(),
            },
        }
    }

    pub(crate) fn io<P>(path: P, source: io::Error) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// What a resolver failed to find.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// No completed, successful run of the workflow matched the branch and event.
    Run {
        /// The workflow that was scanned.
        workflow_id: u64,
        /// The branch runs were matched against.
        branch: String,
        /// The event runs were matched against.
        event: String,
    },
    /// No artifact of the run carries the requested name.
    Artifact {
        /// The run that was scanned.
        run_id: u64,
        /// The requested artifact name.
        name: String,
    },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run {
                workflow_id,
                branch,
                event,
            } => write!(
                f,
                "no successful run of workflow {workflow_id} on branch {branch} triggered by {event}"
            ),
            Self::Artifact { run_id, name } => {
                write!(f, "no artifact named {name:?} in run {run_id}")
            }
        }
    }
}
