use tracing::{debug, info};

use crate::{client::GitHubClient, config::Config, error::Result, workflow::Workflow};

/// Fetches the numeric identifier of a workflow from its file name.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::error::Error::Http) if the workflow doesn't exist or the
/// token can't read it, or [`Error::Request`](crate::error::Error::Request) if the request
/// fails.
pub async fn fetch_workflow_id(
    client: &GitHubClient,
    config: &Config,
    workflow: &str,
) -> Result<u64> {
    let url = format!("{}/actions/workflows/{workflow}", config.repo_url());
    debug!("fetching workflow {workflow} from {url}…");

    let workflow: Workflow = client.get_json(&url, &[]).await?;
    info!("found workflow {} ({})", workflow.id, workflow.path);
    Ok(workflow.id)
}
