use super::{create, OnConflict};
use crate::runner::{CommandRunner, Invocation};
use anyhow::{Context, Result};

/// Project roles granted to the CI service account.
pub const CI_ROLES: [&str; 6] = [
    "roles/run.developer",
    "roles/artifactregistry.writer",
    "roles/secretmanager.secretAccessor",
    "roles/iam.serviceAccountUser",
    "roles/cloudbuild.builds.builder",
    "roles/logging.logWriter",
];

/// Optional descriptive fields for `service-accounts create`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Labels<'a> {
    pub display_name: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub fn create_service_account(
    runner: &dyn CommandRunner,
    project_id: &str,
    name: &str,
    labels: Labels<'_>,
    policy: OnConflict,
) -> Result<()> {
    let mut invocation = Invocation::gcloud(["iam", "service-accounts", "create", name])
        .flag("project", project_id);
    if let Some(display_name) = labels.display_name {
        invocation = invocation.flag("display-name", display_name);
    }
    if let Some(description) = labels.description {
        invocation = invocation.flag("description", description);
    }
    create(runner, &invocation, "service account", policy)
}

/// Bind each role to the service account at project level.
pub fn grant_project_roles(
    runner: &dyn CommandRunner,
    project_id: &str,
    email: &str,
    roles: &[&str],
) -> Result<()> {
    for role in roles {
        println!("  Granting {role}");
        let invocation = Invocation::gcloud(["projects", "add-iam-policy-binding", project_id])
            .flag("member", format!("serviceAccount:{email}"))
            .flag("role", role)
            .flag("condition", "None");
        runner
            .run(&invocation)
            .with_context(|| format!("failed to grant {role}"))?;
    }
    Ok(())
}
