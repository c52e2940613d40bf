//! Workload Identity Federation for GitHub Actions OIDC tokens.
use super::{create, OnConflict};
use crate::runner::{CommandRunner, Invocation};
use anyhow::{Context, Result};

pub const POOL_ID: &str = "github-pool";
pub const PROVIDER_ID: &str = "github-provider";
pub const GITHUB_ISSUER_URI: &str = "https://token.actions.githubusercontent.com";

/// Maps the token subject plus the claims used for repository scoping.
pub const ATTRIBUTE_MAPPING: &str = "google.subject=assertion.sub,attribute.actor=assertion.actor,attribute.repository=assertion.repository";

/// Full resource name of the OIDC provider, as GitHub Actions expects it.
pub fn provider_resource(project_number: &str) -> String {
    format!(
        "projects/{project_number}/locations/global/workloadIdentityPools/{POOL_ID}/providers/{PROVIDER_ID}"
    )
}

/// Principal set matching every token issued for `org/repo`.
pub fn repository_principal(project_number: &str, org: &str, repo: &str) -> String {
    format!(
        "principalSet://iam.googleapis.com/projects/{project_number}/locations/global/workloadIdentityPools/{POOL_ID}/attribute.repository/{org}/{repo}"
    )
}

pub fn create_pool(
    runner: &dyn CommandRunner,
    project_id: &str,
    display_name: &str,
    policy: OnConflict,
) -> Result<()> {
    let invocation = Invocation::gcloud(["iam", "workload-identity-pools", "create", POOL_ID])
        .flag("project", project_id)
        .flag("location", "global")
        .flag("display-name", display_name);
    create(runner, &invocation, "pool", policy)
}

pub fn create_provider(
    runner: &dyn CommandRunner,
    project_id: &str,
    display_name: &str,
    policy: OnConflict,
) -> Result<()> {
    let invocation = Invocation::gcloud([
        "iam",
        "workload-identity-pools",
        "providers",
        "create-oidc",
        PROVIDER_ID,
    ])
    .flag("project", project_id)
    .flag("location", "global")
    .flag("workload-identity-pool", POOL_ID)
    .flag("display-name", display_name)
    .flag("attribute-mapping", ATTRIBUTE_MAPPING)
    .flag("issuer-uri", GITHUB_ISSUER_URI);
    create(runner, &invocation, "provider", policy)
}

/// Allow tokens from the repository to impersonate the service account.
pub fn bind_repository(
    runner: &dyn CommandRunner,
    project_id: &str,
    service_account_email: &str,
    member: &str,
) -> Result<()> {
    let invocation = Invocation::gcloud([
        "iam",
        "service-accounts",
        "add-iam-policy-binding",
        service_account_email,
    ])
    .flag("project", project_id)
    .flag("role", "roles/iam.workloadIdentityUser")
    .flag("member", member);
    runner
        .run(&invocation)
        .context("failed to grant repository access to the service account")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn resource_names_embed_pool_and_provider() {
        assert_eq!(
            provider_resource("42"),
            "projects/42/locations/global/workloadIdentityPools/github-pool/providers/github-provider"
        );
        assert_eq!(
            repository_principal("42", "acme", "widgets"),
            "principalSet://iam.googleapis.com/projects/42/locations/global/workloadIdentityPools/github-pool/attribute.repository/acme/widgets"
        );
    }

    #[test]
    fn provider_uses_github_issuer_and_mapping() {
        let runner = RecordingRunner::new();
        create_provider(&runner, "demo", "GitHub Provider", OnConflict::Continue)
            .expect("create provider");

        let runs = runner.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].starts_with(
            "gcloud iam workload-identity-pools providers create-oidc github-provider --project=demo --location=global --workload-identity-pool=github-pool"
        ));
        assert!(runs[0].contains("attribute.repository=assertion.repository"));
        assert!(runs[0].contains("--issuer-uri=https://token.actions.githubusercontent.com"));
    }
}
