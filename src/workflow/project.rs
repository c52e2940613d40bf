//! `gcsetup project create`: bootstrap a new GCP project for CI.
use crate::cli::{ConfigArgs, ProjectCreateArgs};
use crate::config::{self, ConfigKey, Settings};
use crate::preflight;
use crate::prompt::Prompter;
use crate::provision::apis::{enable_apis, PROJECT_APIS};
use crate::provision::registry::create_docker_repository;
use crate::provision::service_account::{create_service_account, Labels};
use crate::provision::{create, identity, service_account_email, OnConflict};
use crate::runner::{CommandRunner, Invocation, SystemRunner};
use crate::steps::{banner, done, field, run_steps, Step, RULE};
use anyhow::{anyhow, Result};
use regex::Regex;
use std::io::{BufRead, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_PROJECT_NAME: &str = "my-project";
const DEFAULT_SERVICE_ACCOUNT: &str = "github-actions";
const DEFAULT_REGISTRY_NAME: &str = "docker";
const DEFAULT_REGISTRY_LOCATION: &str = "us-central1";

/// Lowercase letter first, then 5-29 of `[a-z0-9-]`, never ending in a hyphen.
const PROJECT_ID_PATTERN: &str = r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectConfig {
    pub project_name: String,
    pub project_id: String,
    pub service_account_name: String,
    pub artifact_registry_name: String,
    pub artifact_registry_location: String,
}

const PROJECT_STEPS: [Step<ProjectConfig>; 5] = [
    Step {
        name: "Creating GCP Project",
        run: create_gcp_project,
    },
    Step {
        name: "Enabling APIs",
        run: enable_project_apis,
    },
    Step {
        name: "Creating Service Account",
        run: create_project_service_account,
    },
    Step {
        name: "Setting up Workload Identity Federation",
        run: setup_workload_identity,
    },
    Step {
        name: "Creating Artifact Registry",
        run: create_artifact_registry,
    },
];

pub fn run_project_create(args: &ProjectCreateArgs, config_args: &ConfigArgs) -> Result<()> {
    let settings = config::load(config_args)?;
    let runner = SystemRunner::new(args.dry_run);
    let interactive = !args.yes && std::io::stdin().is_terminal();
    let mut prompter = Prompter::stdio(interactive);
    create_project(&runner, &mut prompter, &settings)
}

pub(crate) fn create_project<R: BufRead, W: Write>(
    runner: &dyn CommandRunner,
    prompter: &mut Prompter<R, W>,
    settings: &Settings,
) -> Result<()> {
    preflight::check_gcloud(runner)?;

    banner("GCP Project Creation");
    println!();

    let config = collect_config(prompter, settings)?;
    validate_project_id(&config.project_id)?;

    println!();
    println!("Configuration Summary:");
    field("Project Name", &config.project_name);
    field("Project ID", &config.project_id);
    field("Service Account", &config.service_account_name);
    field("Artifact Registry", &config.artifact_registry_name);
    field("Registry Location", &config.artifact_registry_location);
    println!();

    if !prompter.confirm("Proceed with project creation?")? {
        println!("Project creation cancelled.");
        return Ok(());
    }
    println!();

    run_steps(runner, &config, &PROJECT_STEPS)?;

    println!("{RULE}");
    println!("Project Creation Complete!");
    println!("{RULE}");
    println!();
    let describe = Invocation::gcloud(["projects", "describe", config.project_id.as_str()])
        .flag("format", "value(projectNumber)");
    match runner.capture(&describe) {
        Some(number) => {
            field("Project ID", &config.project_id);
            field("Project Number", &number);
        }
        None if runner.dry_run() => {
            println!("Dry run finished; the project was not created.");
        }
        None => {
            tracing::warn!(project = %config.project_id, "project number lookup failed");
            println!("Could not look up the project number. Run: {describe}");
        }
    }
    field(
        "Service Account",
        service_account_email(&config.service_account_name, &config.project_id),
    );
    println!();
    println!("Next steps:");
    println!("  1. Add GCP_PROJECT_ID and GCP_PROJECT_NUMBER to .env.gcloud");
    println!("  2. Run: gcsetup setup");
    Ok(())
}

/// Gather the project inputs, using configured values as prompt defaults.
fn collect_config<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    settings: &Settings,
) -> Result<ProjectConfig> {
    let default = |key: ConfigKey, fallback: &str| {
        settings
            .get(key)
            .map_or_else(|| fallback.to_string(), str::to_string)
    };

    let project_name = prompter.ask("Project Name", DEFAULT_PROJECT_NAME)?;
    let default_id = match settings.get(ConfigKey::ProjectId) {
        Some(id) => id.to_string(),
        None if prompter.is_interactive() => format!("{project_name}-{:05}", random_suffix()),
        None => project_name.clone(),
    };
    let project_id = prompter.ask("Project ID", &default_id)?;
    let service_account_name = prompter.ask(
        "Service Account Name",
        &default(ConfigKey::ServiceAccountName, DEFAULT_SERVICE_ACCOUNT),
    )?;
    let artifact_registry_name = prompter.ask(
        "Artifact Registry Name",
        &default(ConfigKey::ArtifactRegistryName, DEFAULT_REGISTRY_NAME),
    )?;
    let artifact_registry_location = prompter.ask(
        "Artifact Registry Location",
        &default(ConfigKey::ArtifactRegistryLocation, DEFAULT_REGISTRY_LOCATION),
    )?;

    Ok(ProjectConfig {
        project_name,
        project_id,
        service_account_name,
        artifact_registry_name,
        artifact_registry_location,
    })
}

pub(crate) fn validate_project_id(project_id: &str) -> Result<()> {
    let pattern = Regex::new(PROJECT_ID_PATTERN)?;
    if pattern.is_match(project_id) {
        return Ok(());
    }
    Err(anyhow!(
        "invalid project ID {project_id:?}: use 6-30 lowercase letters, digits, or hyphens, \
         starting with a letter and not ending with a hyphen"
    ))
}

/// Five-digit suffix that keeps suggested project IDs from colliding.
fn random_suffix() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or_default();
    (nanos ^ std::process::id()) % 100_000
}

fn create_gcp_project(runner: &dyn CommandRunner, config: &ProjectConfig) -> Result<()> {
    let invocation = Invocation::gcloud(["projects", "create", config.project_id.as_str()])
        .flag("name", &config.project_name);
    create(runner, &invocation, "project", OnConflict::Fail)?;
    done(runner, format!("Project created: {}", config.project_id));
    Ok(())
}

fn enable_project_apis(runner: &dyn CommandRunner, config: &ProjectConfig) -> Result<()> {
    enable_apis(runner, &config.project_id, &PROJECT_APIS)?;
    done(runner, "APIs enabled");
    Ok(())
}

fn create_project_service_account(
    runner: &dyn CommandRunner,
    config: &ProjectConfig,
) -> Result<()> {
    create_service_account(
        runner,
        &config.project_id,
        &config.service_account_name,
        Labels::default(),
        OnConflict::Fail,
    )?;
    done(
        runner,
        format!(
            "Service account created: {}",
            service_account_email(&config.service_account_name, &config.project_id)
        ),
    );
    Ok(())
}

fn setup_workload_identity(runner: &dyn CommandRunner, config: &ProjectConfig) -> Result<()> {
    identity::create_pool(runner, &config.project_id, "GitHub", OnConflict::Fail)?;
    done(runner, format!("Workload Identity Pool created: {}", identity::POOL_ID));
    identity::create_provider(
        runner,
        &config.project_id,
        "GitHub Provider",
        OnConflict::Fail,
    )?;
    done(runner, format!("OIDC Provider created: {}", identity::PROVIDER_ID));
    Ok(())
}

fn create_artifact_registry(runner: &dyn CommandRunner, config: &ProjectConfig) -> Result<()> {
    create_docker_repository(
        runner,
        &config.project_id,
        &config.artifact_registry_location,
        &config.artifact_registry_name,
        None,
        OnConflict::Fail,
    )?;
    done(
        runner,
        format!("Artifact Registry created: {}", config.artifact_registry_name),
    );
    Ok(())
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
