use std::pin::pin;

use futures::{TryStreamExt as _, future};
use tracing::{debug, info, warn};

use crate::{
    client::GitHubClient,
    config::Config,
    error::Result,
    framework::Lookup,
    workflow::{
        RunFilter, WorkflowRuns,
        pages::{PER_PAGE, paginate},
    },
};

/// Fetches the identifier of the latest completed, successful run of a workflow that was built
/// from the configured branch and triggered by `event`.
///
/// Runs are not sorted: they are consumed page by page in the order GitHub lists them, which is
/// newest first, and the first match wins. Pages after the first match are never requested.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::error::Error::Http) or
/// [`Error::Request`](crate::error::Error::Request) if any page fails to load. A run list
/// without a match is [`Lookup::NotFound`], not an error.
pub async fn fetch_latest_run_id(
    client: &GitHubClient,
    config: &Config,
    workflow_id: u64,
    event: &str,
) -> Result<Lookup<u64>> {
    let url = format!("{}/actions/workflows/{workflow_id}/runs", config.repo_url());
    let filter = RunFilter {
        branch: &config.branch,
        event,
    };
    let query = [
        ("branch", config.branch.clone()),
        ("event", event.to_owned()),
        ("status", RunFilter::STATUS.to_owned()),
    ];
    debug!(
        "fetching runs of workflow {workflow_id} on {} by {event} from {url}…",
        config.branch
    );

    let mut runs = pin!(
        paginate::<WorkflowRuns>(client, &url, &query, PER_PAGE)
            .try_filter(|run| future::ready(filter.matches(run)))
    );
    match runs.try_next().await? {
        Some(run) => {
            info!("found workflow run {run}");
            Ok(Lookup::Found(run.id))
        }
        None => {
            warn!(
                "no successful run of workflow {workflow_id} on {} by {event}",
                config.branch
            );
            Ok(Lookup::NotFound)
        }
    }
}
