//! `gcsetup setup`: wire an existing project to a GitHub repository.
use crate::cli::{ConfigArgs, SetupArgs};
use crate::config::{self, SetupConfig};
use crate::github;
use crate::preflight;
use crate::provision::apis::{enable_apis, SETUP_APIS};
use crate::provision::identity;
use crate::provision::registry::create_docker_repository;
use crate::provision::service_account::{
    create_service_account, grant_project_roles, Labels, CI_ROLES,
};
use crate::provision::OnConflict;
use crate::runner::{CommandRunner, SystemRunner};
use crate::steps::{banner, run_steps, Step};
use anyhow::Result;

const SETUP_STEPS: [Step<SetupConfig>; 5] = [
    Step {
        name: "Enabling APIs",
        run: enable_setup_apis,
    },
    Step {
        name: "Creating Service Account",
        run: create_ci_service_account,
    },
    Step {
        name: "Setting up Workload Identity Federation",
        run: setup_workload_identity,
    },
    Step {
        name: "Creating Artifact Registry",
        run: create_artifact_registry,
    },
    Step {
        name: "Configuring GitHub Repository",
        run: configure_repository,
    },
];

pub fn run_setup(args: &SetupArgs, config_args: &ConfigArgs) -> Result<()> {
    let settings = config::load(config_args)?;
    let config = SetupConfig::from_settings(&settings)?;
    let runner = SystemRunner::new(args.dry_run);
    setup(&runner, &config)
}

pub(crate) fn setup(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    preflight::check_gcloud(runner)?;
    preflight::check_gh(runner)?;

    banner("GCloud Project Setup");
    println!("Project ID:     {}", config.project_id);
    println!("Project Number: {}", config.project_number);
    println!("GitHub:         {}", config.repository());
    if runner.dry_run() {
        println!("Mode:           dry run (commands are printed, not executed)");
    }
    println!("==============================================");
    println!();

    run_steps(runner, config, &SETUP_STEPS)?;

    banner("Setup Complete!");
    println!();
    if runner.dry_run() {
        println!("Dry run finished; no changes were made.");
    } else {
        println!("Your repository is fully configured.");
        println!("Push to main or create a PR to trigger a deployment.");
    }
    Ok(())
}

fn enable_setup_apis(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    enable_apis(runner, &config.project_id, &SETUP_APIS)
}

fn create_ci_service_account(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    println!("  Creating service account: {}", config.service_account_name);
    let display_name = format!("{} Service Account", config.service_account_name);
    create_service_account(
        runner,
        &config.project_id,
        &config.service_account_name,
        Labels {
            display_name: Some(&display_name),
            description: Some("Service account for GitHub Actions CI/CD"),
        },
        OnConflict::Continue,
    )?;
    grant_project_roles(
        runner,
        &config.project_id,
        &config.service_account_email(),
        &CI_ROLES,
    )
}

fn setup_workload_identity(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    println!("  Creating Workload Identity Pool...");
    identity::create_pool(
        runner,
        &config.project_id,
        "GitHub Actions Pool",
        OnConflict::Continue,
    )?;

    println!("  Creating OIDC Provider...");
    identity::create_provider(
        runner,
        &config.project_id,
        "GitHub Provider",
        OnConflict::Continue,
    )?;

    println!("  Configuring repository access...");
    let member = identity::repository_principal(
        &config.project_number,
        &config.github_org,
        &config.github_repo,
    );
    identity::bind_repository(
        runner,
        &config.project_id,
        &config.service_account_email(),
        &member,
    )
}

fn create_artifact_registry(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    println!("  Creating repository: {}", config.artifact_registry_name);
    create_docker_repository(
        runner,
        &config.project_id,
        &config.artifact_registry_location,
        &config.artifact_registry_name,
        Some("Container registry for CI/CD"),
        OnConflict::Continue,
    )
}

fn configure_repository(runner: &dyn CommandRunner, config: &SetupConfig) -> Result<()> {
    let repo = config.repository();

    println!("  Setting secrets...");
    let secrets = [
        ("GCP_SERVICE_ACCOUNT", config.service_account_email()),
        (
            "GCP_WORKLOAD_IDENTITY_PROVIDER",
            config.workload_identity_provider(),
        ),
    ];
    for (name, value) in &secrets {
        println!("    {name}");
        github::set_secret(runner, &repo, name, value)?;
    }

    println!("  Setting variables...");
    let variables = [
        ("CLOUD_RUN_SERVICE", config.cloud_run_service.clone()),
        ("CLOUD_RUN_REGION", config.cloud_run_region.clone()),
        ("ARTIFACT_REGISTRY_URL", config.artifact_registry_url()),
    ];
    for (name, value) in &variables {
        println!("    {name}");
        github::set_variable(runner, &repo, name, value)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
