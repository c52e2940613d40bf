//! GCP resources shared by the `setup` and `project create` flows.
//!
//! Each submodule owns the gcloud invocations for one resource family; the
//! workflows decide ordering and how failures are treated.
pub mod apis;
pub mod identity;
pub mod registry;
pub mod service_account;

use crate::config::SetupConfig;
use crate::runner::{CommandRunner, Invocation};
use anyhow::{Context, Result};

/// How a create call treats failure, which usually means "already exists".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnConflict {
    /// Report and keep going; used where reruns are expected.
    Continue,
    /// Abort the step.
    Fail,
}

/// Run a create invocation under the given conflict policy.
pub fn create(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    what: &str,
    policy: OnConflict,
) -> Result<()> {
    match policy {
        OnConflict::Fail => runner
            .run(invocation)
            .with_context(|| format!("failed to create {what}")),
        OnConflict::Continue => {
            if let Err(err) = runner.run(invocation) {
                tracing::warn!(resource = what, error = %format!("{err:#}"), "create failed; continuing");
                println!("  ({what} may already exist, continuing...)");
            }
            Ok(())
        }
    }
}

pub fn service_account_email(name: &str, project_id: &str) -> String {
    format!("{name}@{project_id}.iam.gserviceaccount.com")
}

pub fn artifact_registry_url(location: &str, project_id: &str, name: &str) -> String {
    format!("{location}-docker.pkg.dev/{project_id}/{name}")
}

impl SetupConfig {
    pub fn service_account_email(&self) -> String {
        service_account_email(&self.service_account_name, &self.project_id)
    }

    pub fn workload_identity_provider(&self) -> String {
        identity::provider_resource(&self.project_number)
    }

    pub fn artifact_registry_url(&self) -> String {
        artifact_registry_url(
            &self.artifact_registry_location,
            &self.project_id,
            &self.artifact_registry_name,
        )
    }
}
