//! CLI argument parsing for the project setup workflow.
//!
//! Configuration flags are global so every subcommand sees the same layered
//! settings, whichever position the flags are given in.
use crate::config::ConfigKey;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "gcsetup",
    version,
    about = "GCloud project setup CLI",
    long_about = "A CLI tool to set up GCloud projects with GitHub Actions CI/CD.",
    after_help = "Commands:\n  init                  Create the deploy workflow and .env.gcloud template\n  setup                 Set up GCloud project and GitHub repository\n  project create        Create a new GCP project\n  loadbalancer setup    Configure a load balancer for multiple services\n\nExamples:\n  gcsetup init\n  gcsetup setup --dry-run\n  gcsetup project create --yes --dry-run\n  gcsetup loadbalancer setup --gcp-project-id my-project",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit debug logs (executed commands, timings) to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Setup(SetupArgs),
    Project(ProjectArgs),
    Loadbalancer(LoadbalancerArgs),
}

/// Settings that can come from flags, the environment, or `.env.gcloud`.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Config file (default is .env.gcloud)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// GCP Project ID
    #[arg(long, value_name = "ID", global = true)]
    pub gcp_project_id: Option<String>,

    /// GCP Project Number
    #[arg(long, value_name = "NUMBER", global = true)]
    pub gcp_project_number: Option<String>,

    /// Service Account Name
    #[arg(long, value_name = "NAME", global = true)]
    pub service_account_name: Option<String>,

    /// Artifact Registry Name
    #[arg(long, value_name = "NAME", global = true)]
    pub artifact_registry_name: Option<String>,

    /// Artifact Registry Location
    #[arg(long, value_name = "LOCATION", global = true)]
    pub artifact_registry_location: Option<String>,

    /// GitHub Organization
    #[arg(long, value_name = "ORG", global = true)]
    pub github_org: Option<String>,

    /// GitHub Repository
    #[arg(long, value_name = "REPO", global = true)]
    pub github_repo: Option<String>,

    /// Cloud Run Service Name
    #[arg(long, value_name = "NAME", global = true)]
    pub cloud_run_service: Option<String>,

    /// Cloud Run Region
    #[arg(long, value_name = "REGION", global = true)]
    pub cloud_run_region: Option<String>,
}

impl ConfigArgs {
    /// Flag value bound to a config key, if the flag was given.
    pub fn value(&self, key: ConfigKey) -> Option<&str> {
        let value = match key {
            ConfigKey::ProjectId => &self.gcp_project_id,
            ConfigKey::ProjectNumber => &self.gcp_project_number,
            ConfigKey::GithubOrganization => &self.github_org,
            ConfigKey::GithubRepository => &self.github_repo,
            ConfigKey::ServiceAccountName => &self.service_account_name,
            ConfigKey::ArtifactRegistryName => &self.artifact_registry_name,
            ConfigKey::ArtifactRegistryLocation => &self.artifact_registry_location,
            ConfigKey::CloudRunService => &self.cloud_run_service,
            ConfigKey::CloudRunRegion => &self.cloud_run_region,
        };
        value.as_deref()
    }
}

/// Init command inputs.
#[derive(Args, Debug)]
#[command(
    about = "Initialize project with workflow and .env.gcloud template",
    long_about = "Creates the following files in your project:\n  - .github/workflows/gcloud-deploy.yml  (CI/CD workflow)\n  - .env.gcloud                          (environment variables template)"
)]
pub struct InitArgs {}

/// Setup command inputs.
#[derive(Args, Debug)]
#[command(
    about = "Set up GCloud project and GitHub repository",
    long_about = "Runs the complete setup process:\n  1. Enable required GCP APIs\n  2. Create service account with necessary roles\n  3. Set up Workload Identity Federation for GitHub\n  4. Create Artifact Registry repository\n  5. Configure GitHub repository secrets and variables"
)]
pub struct SetupArgs {
    /// Print commands without executing
    #[arg(long)]
    pub dry_run: bool,
}

/// `project` command group.
#[derive(Args, Debug)]
#[command(about = "Manage GCP projects")]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    Create(ProjectCreateArgs),
}

/// Project creation inputs.
#[derive(Args, Debug)]
#[command(
    about = "Create a new GCP project",
    long_about = "Create a new GCP project with:\n  1. Project creation in GCP\n  2. Enabling required APIs\n  3. Creating service account\n  4. Setting up Workload Identity Federation for GitHub\n  5. Creating Artifact Registry repository"
)]
pub struct ProjectCreateArgs {
    /// Print commands without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Non-interactive mode (accept all defaults)
    #[arg(long, short)]
    pub yes: bool,
}

/// `loadbalancer` command group.
#[derive(Args, Debug)]
#[command(about = "Manage Google Cloud Load Balancers")]
pub struct LoadbalancerArgs {
    #[command(subcommand)]
    pub command: LoadbalancerCommand,
}

#[derive(Subcommand, Debug)]
pub enum LoadbalancerCommand {
    Setup(LoadbalancerSetupArgs),
}

/// Load balancer setup inputs.
#[derive(Args, Debug)]
#[command(
    about = "Configure a load balancer for multiple services",
    long_about = "Set up a Google Cloud Load Balancer with multiple backend services:\n  1. Create health checks for each service\n  2. Configure backend services\n  3. Set up a URL map for path-based routing\n  4. Create a target HTTP(S) proxy\n  5. Reserve a global IP and create the forwarding rule"
)]
pub struct LoadbalancerSetupArgs {
    /// Print commands without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Non-interactive mode (accept all defaults)
    #[arg(long, short)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let args = RootArgs::try_parse_from([
            "gcsetup",
            "setup",
            "--dry-run",
            "--gcp-project-id",
            "demo-project",
            "--github-org",
            "acme",
        ])
        .expect("parse setup args");

        assert!(matches!(args.command, Command::Setup(SetupArgs { dry_run: true })));
        assert_eq!(args.config.value(ConfigKey::ProjectId), Some("demo-project"));
        assert_eq!(args.config.value(ConfigKey::GithubOrganization), Some("acme"));
        assert_eq!(args.config.value(ConfigKey::CloudRunRegion), None);
    }

    #[test]
    fn nested_subcommands_accept_short_yes() {
        let args = RootArgs::try_parse_from(["gcsetup", "loadbalancer", "setup", "-y"])
            .expect("parse loadbalancer args");
        match args.command {
            Command::Loadbalancer(LoadbalancerArgs {
                command: LoadbalancerCommand::Setup(setup),
            }) => {
                assert!(setup.yes);
                assert!(!setup.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
