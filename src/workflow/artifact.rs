//! Artifacts from GitHub REST API and related functions.

use std::fmt::{self, Display};

use serde::Deserialize;

use super::pages::Page;

/// Represents a page of artifacts from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Artifacts {
    pub total_count: u64,
    pub artifacts: Vec<Artifact>,
}

impl Page for Artifacts {
    type Item = Artifact;

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn into_items(self) -> Vec<Self::Item> {
        self.artifacts
    }
}

/// Represents an artifact from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size_in_bytes: u64,
    #[serde(default)]
    pub expired: bool,
    pub archive_download_url: Option<String>,
    pub digest: Option<String>,
}

impl Artifact {
    /// The hex SHA-256 digest advertised by the API, without its `sha256:` prefix.
    pub fn sha256(&self) -> Option<&str> {
        self.digest.as_deref()?.strip_prefix("sha256:")
    }

    /// Whether the artifact is named exactly `name`. Case matters.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.name, self.id, self.size_in_bytes)
    }
}

/// Composes the download URL of an artifact.
///
/// `api_base` is expected without a trailing slash, see [`Config::with_api_base`](crate::config::Config::with_api_base).
pub fn artifact_download_url(
    api_base: &str,
    owner: &str,
    repo: &str,
    artifact_id: u64,
    file_type: &str,
) -> String {
    format!("{api_base}/repos/{owner}/{repo}/actions/artifacts/{artifact_id}/{file_type}")
}
