//! Data models of GitHub Actions workflows.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod artifact;
pub mod pages;

use pages::Page;

/// Represents a GitHub Actions workflow from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Workflow {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub state: String,
}

/// Represents a page of workflow runs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRuns {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

impl Page for WorkflowRuns {
    type Item = WorkflowRun;

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn into_items(self) -> Vec<Self::Item> {
        self.workflow_runs
    }
}

/// Represents a GitHub Actions workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRun {
    pub id: u64,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub head_branch: Option<String>,
    pub event: String,
    pub run_number: Option<u64>,
    pub head_sha: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Display for WorkflowRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.run_number, &self.created_at) {
            (Some(number), Some(created_at)) => {
                write!(f, "#{number} ({} at {created_at})", self.id)
            }
            (Some(number), None) => write!(f, "#{number} ({})", self.id),
            (None, _) => write!(f, "{}", self.id),
        }
    }
}

/// The criteria a workflow run has to meet to be downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFilter<'a> {
    /// The branch the run was built from.
    pub branch: &'a str,
    /// The event that triggered the run.
    pub event: &'a str,
}

impl RunFilter<'_> {
    /// The status a run must have.
    pub const STATUS: &'static str = "completed";
    /// The conclusion a run must have.
    pub const CONCLUSION: &'static str = "success";

    /// Returns `true` if the run is completed, succeeded, and was built from the branch by the
    /// event.
    pub fn matches(&self, run: &WorkflowRun) -> bool {
        run.status.as_deref() == Some(Self::STATUS)
            && run.conclusion.as_deref() == Some(Self::CONCLUSION)
            && run.head_branch.as_deref() == Some(self.branch)
            && run.event == self.event
    }
}
