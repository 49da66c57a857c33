//! The steps from a workflow file name to an artifact on disk.
//!
//! See: [`download_latest_artifact`]

mod download_artifact;
mod fetch_artifact;
mod fetch_run;
mod fetch_workflow;
mod latest_artifact;

pub use download_artifact::*;
pub use fetch_artifact::*;
pub use fetch_run::*;
pub use fetch_workflow::*;
pub use latest_artifact::*;
