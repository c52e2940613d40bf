use crate::runner::{CommandRunner, Invocation};
use anyhow::{Context, Result};

/// APIs needed to deploy to Cloud Run from GitHub Actions.
pub const SETUP_APIS: [&str; 7] = [
    "cloudresourcemanager.googleapis.com",
    "iam.googleapis.com",
    "iamcredentials.googleapis.com",
    "artifactregistry.googleapis.com",
    "run.googleapis.com",
    "secretmanager.googleapis.com",
    "cloudbuild.googleapis.com",
];

/// APIs enabled on a freshly created project.
pub const PROJECT_APIS: [&str; 6] = [
    "cloudresourcemanager.googleapis.com",
    "serviceusage.googleapis.com",
    "iam.googleapis.com",
    "artifactregistry.googleapis.com",
    "iamcredentials.googleapis.com",
    "cloudkms.googleapis.com",
];

/// Enable each API in order, stopping at the first failure.
pub fn enable_apis(runner: &dyn CommandRunner, project_id: &str, apis: &[&str]) -> Result<()> {
    for &api in apis {
        println!("  Enabling {api}");
        let invocation = Invocation::gcloud(["services", "enable", api]).flag("project", project_id);
        runner
            .run(&invocation)
            .with_context(|| format!("failed to enable API {api}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn stops_at_first_failing_api() {
        let runner = RecordingRunner::new().fail_when("iam.googleapis.com");

        let err = enable_apis(&runner, "demo", &SETUP_APIS).expect_err("iam fails");

        assert_eq!(err.to_string(), "failed to enable API iam.googleapis.com");
        assert_eq!(
            runner.runs(),
            vec![
                "gcloud services enable cloudresourcemanager.googleapis.com --project=demo",
                "gcloud services enable iam.googleapis.com --project=demo",
            ]
        );
    }
}
