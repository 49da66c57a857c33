use std::pin::pin;

use futures::{TryStreamExt as _, future};
use tracing::{debug, info, warn};

use crate::{
    client::GitHubClient,
    config::Config,
    error::Result,
    framework::Lookup,
    workflow::{
        artifact::{Artifact, Artifacts},
        pages::{PER_PAGE, paginate},
    },
};

/// Fetches the artifact of a workflow run named exactly `name`. Case matters, and the first of
/// several artifacts sharing the name wins.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::error::Error::Http) or
/// [`Error::Request`](crate::error::Error::Request) if any page fails to load. A run without a
/// matching artifact is [`Lookup::NotFound`], not an error.
pub async fn fetch_artifact(
    client: &GitHubClient,
    config: &Config,
    run_id: u64,
    name: &str,
) -> Result<Lookup<Artifact>> {
    let url = format!("{}/actions/runs/{run_id}/artifacts", config.repo_url());
    debug!("fetching artifact {name} from {url}…");

    let mut artifacts = pin!(
        paginate::<Artifacts>(client, &url, &[], PER_PAGE)
            .try_filter(|artifact| future::ready(artifact.is_named(name)))
    );
    let Some(artifact) = artifacts.try_next().await? else {
        warn!("no artifact named {name} in run {run_id}");
        return Ok(Lookup::NotFound);
    };

    if artifact.expired {
        warn!("artifact {artifact} has expired, its download will likely fail");
    }
    info!("found artifact {artifact}");
    Ok(Lookup::Found(artifact))
}
