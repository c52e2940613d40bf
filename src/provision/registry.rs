use super::{create, OnConflict};
use crate::runner::{CommandRunner, Invocation};
use anyhow::Result;

/// Create a Docker-format Artifact Registry repository.
pub fn create_docker_repository(
    runner: &dyn CommandRunner,
    project_id: &str,
    location: &str,
    name: &str,
    description: Option<&str>,
    policy: OnConflict,
) -> Result<()> {
    let mut invocation = Invocation::gcloud(["artifacts", "repositories", "create", name])
        .flag("project", project_id)
        .flag("location", location)
        .flag("repository-format", "docker");
    if let Some(description) = description {
        invocation = invocation.flag("description", description);
    }
    create(runner, &invocation, "repository", policy)
}
