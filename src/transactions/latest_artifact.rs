use std::fmt::{self, Display};

use tracing::info;

use crate::{
    client::GitHubClient,
    config::Config,
    error::{Missing, Result},
    progress::Progress,
    transactions::{
        Downloaded, download_artifact, fetch_artifact, fetch_latest_run_id, fetch_workflow_id,
    },
    workflow::artifact::{Artifact, artifact_download_url},
};

/// The artifact of the latest matching run, and where to download it from.
#[derive(Debug, Clone)]
pub struct LatestArtifact {
    /// The workflow the run belongs to.
    pub workflow_id: u64,
    /// The latest completed, successful run on the configured branch and event.
    pub run_id: u64,
    /// The artifact of that run carrying the configured name.
    pub artifact: Artifact,
    /// The download URL of the artifact.
    pub url: String,
}

impl Display for LatestArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of run {} of workflow {} at {}",
            self.artifact, self.run_id, self.workflow_id, self.url
        )
    }
}

/// Resolves the workflow, its latest matching run, and the configured artifact of that run, in
/// that order.
///
/// # Errors
///
/// Returns [`Error::NotFound`](crate::error::Error::NotFound) if no run or no artifact matches,
/// and propagates every error of the individual resolvers.
pub async fn resolve_latest_artifact(
    client: &GitHubClient,
    config: &Config,
) -> Result<LatestArtifact> {
    let workflow_id = fetch_workflow_id(client, config, &config.workflow).await?;

    let run_id = fetch_latest_run_id(client, config, workflow_id, &config.event)
        .await?
        .found_or(Missing::Run {
            workflow_id,
            branch: config.branch.clone(),
            event: config.event.clone(),
        })?;

    let artifact = fetch_artifact(client, config, run_id, &config.artifact)
        .await?
        .found_or(Missing::Artifact {
            run_id,
            name: config.artifact.clone(),
        })?;

    let url = artifact_download_url(
        &config.api_base,
        &config.owner,
        &config.repo,
        artifact.id,
        &config.file_type,
    );
    info!("resolved artifact download url {url}");

    Ok(LatestArtifact {
        workflow_id,
        run_id,
        artifact,
        url,
    })
}

/// Resolves the latest artifact and downloads it to [`Config::destination`].
///
/// # Errors
///
/// See: [`resolve_latest_artifact`], [`download_artifact`]
pub async fn download_latest_artifact<R>(
    client: &GitHubClient,
    config: &Config,
    progress: &mut R,
) -> Result<Downloaded>
where
    R: Progress + ?Sized,
{
    let latest = resolve_latest_artifact(client, config).await?;
    info!("downloading artifact {latest}…");

    let expected_sha256 = if config.verify_digest {
        latest.artifact.sha256()
    } else {
        None
    };
    download_artifact(
        client,
        &latest.url,
        &config.destination,
        expected_sha256,
        progress,
    )
    .await
}
