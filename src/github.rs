//! Repository secrets and variables through the `gh` CLI.
use crate::runner::{CommandRunner, Invocation};
use anyhow::{Context, Result};

/// Store an encrypted Actions secret; the value never appears in output.
pub fn set_secret(runner: &dyn CommandRunner, repo: &str, name: &str, value: &str) -> Result<()> {
    let invocation = Invocation::gh(["secret", "set", name, "--repo", repo, "--body"]).secret(value);
    runner
        .run(&invocation)
        .with_context(|| format!("failed to set secret {name}"))
}

/// Store a plain-text Actions variable.
pub fn set_variable(
    runner: &dyn CommandRunner,
    repo: &str,
    name: &str,
    value: &str,
) -> Result<()> {
    let invocation =
        Invocation::gh(["variable", "set", name, "--repo", repo, "--body"]).arg(value);
    runner
        .run(&invocation)
        .with_context(|| format!("failed to set variable {name}"))
}
