//! Checks that the external CLIs are installed and usable.
use crate::runner::{CommandRunner, Invocation, Program};
use anyhow::{anyhow, Result};

pub fn check_gcloud(runner: &dyn CommandRunner) -> Result<()> {
    if let Err(err) = runner.locate(Program::Gcloud) {
        tracing::debug!(error = %format!("{err:#}"), "gcloud lookup failed");
        return Err(anyhow!(
            "gcloud CLI not found. Install it: https://cloud.google.com/sdk/docs/install"
        ));
    }
    Ok(())
}

pub fn check_gh(runner: &dyn CommandRunner) -> Result<()> {
    if let Err(err) = runner.locate(Program::Gh) {
        tracing::debug!(error = %format!("{err:#}"), "gh lookup failed");
        return Err(anyhow!(
            "GitHub CLI (gh) not found. Install it: https://cli.github.com/"
        ));
    }
    if !runner.probe(&Invocation::gh(["auth", "status"])) {
        return Err(anyhow!("GitHub CLI not authenticated. Run: gh auth login"));
    }
    Ok(())
}
