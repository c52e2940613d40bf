//! Layered configuration: flags over environment over `.env.gcloud`.
//!
//! The file uses dotenv syntax so the same file can be sourced by shells and
//! CI jobs. Empty values count as unset at every layer.
use crate::cli::ConfigArgs;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".env.gcloud";

/// Every setting the workflows understand, in reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKey {
    ProjectId,
    ProjectNumber,
    GithubOrganization,
    GithubRepository,
    ServiceAccountName,
    ArtifactRegistryName,
    ArtifactRegistryLocation,
    CloudRunService,
    CloudRunRegion,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 9] = [
        ConfigKey::ProjectId,
        ConfigKey::ProjectNumber,
        ConfigKey::GithubOrganization,
        ConfigKey::GithubRepository,
        ConfigKey::ServiceAccountName,
        ConfigKey::ArtifactRegistryName,
        ConfigKey::ArtifactRegistryLocation,
        ConfigKey::CloudRunService,
        ConfigKey::CloudRunRegion,
    ];

    /// Name used both in the environment and in the config file.
    pub fn env_name(self) -> &'static str {
        match self {
            ConfigKey::ProjectId => "GCP_PROJECT_ID",
            ConfigKey::ProjectNumber => "GCP_PROJECT_NUMBER",
            ConfigKey::GithubOrganization => "GITHUB_ORGANIZATION",
            ConfigKey::GithubRepository => "GITHUB_REPOSITORY",
            ConfigKey::ServiceAccountName => "SERVICE_ACCOUNT_NAME",
            ConfigKey::ArtifactRegistryName => "ARTIFACT_REGISTRY_NAME",
            ConfigKey::ArtifactRegistryLocation => "ARTIFACT_REGISTRY_LOCATION",
            ConfigKey::CloudRunService => "CLOUD_RUN_SERVICE",
            ConfigKey::CloudRunRegion => "CLOUD_RUN_REGION",
        }
    }

    fn from_env_name(name: &str) -> Option<ConfigKey> {
        ConfigKey::ALL.into_iter().find(|key| key.env_name() == name)
    }
}

/// Resolved settings plus the file they were (partly) read from.
#[derive(Debug, Default, Clone)]
pub struct Settings {
    values: BTreeMap<ConfigKey, String>,
    source: Option<PathBuf>,
}

impl Settings {
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Fetch a single setting, failing with the variable name when unset.
    pub fn require(&self, key: ConfigKey) -> Result<&str> {
        self.get(key).ok_or_else(|| anyhow!("{} is required", key.env_name()))
    }

    /// Config file that contributed to these settings, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn missing(&self) -> Vec<ConfigKey> {
        ConfigKey::ALL
            .into_iter()
            .filter(|key| !self.values.contains_key(key))
            .collect()
    }

    /// Ensure every known setting is present.
    pub fn validate_required(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|key| key.env_name()).collect();
        Err(anyhow!(
            "missing required variables:\n  - {}",
            names.join("\n  - ")
        ))
    }

    fn set(&mut self, key: ConfigKey, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.values.insert(key, value.to_string());
        }
    }
}

/// Load settings for the current process and report the config file in use.
pub fn load(args: &ConfigArgs) -> Result<Settings> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let settings = resolve(args, &cwd, |name| std::env::var(name).ok())?;
    if let Some(path) = settings.source() {
        println!("Using config file: {}", path.display());
    }
    Ok(settings)
}

/// Merge the file, environment, and flag layers.
///
/// An explicit `--config` path must exist; the default file is optional.
pub fn resolve<F>(args: &ConfigArgs, cwd: &Path, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    let file = match &args.config {
        Some(path) => Some(cwd.join(path)),
        None => Some(cwd.join(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
    };
    if let Some(path) = file {
        read_config_file(&path, &mut settings)?;
        settings.source = Some(path);
    }

    for key in ConfigKey::ALL {
        if let Some(value) = env(key.env_name()) {
            settings.set(key, &value);
        }
        if let Some(value) = args.value(key) {
            settings.set(key, value);
        }
    }
    Ok(settings)
}

fn read_config_file(path: &Path, settings: &mut Settings) -> Result<()> {
    let entries = dotenv::from_path_iter(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    for entry in entries {
        let (name, value) =
            entry.with_context(|| format!("parse config file {}", path.display()))?;
        match ConfigKey::from_env_name(&name) {
            Some(key) => settings.set(key, &value),
            None => tracing::debug!(name = %name, "ignoring unknown config key"),
        }
    }
    Ok(())
}

/// Fully validated inputs for `gcsetup setup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    pub project_id: String,
    pub project_number: String,
    pub github_org: String,
    pub github_repo: String,
    pub service_account_name: String,
    pub artifact_registry_name: String,
    pub artifact_registry_location: String,
    pub cloud_run_service: String,
    pub cloud_run_region: String,
}

impl SetupConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate_required()?;
        let value = |key| settings.require(key).map(str::to_string);
        Ok(Self {
            project_id: value(ConfigKey::ProjectId)?,
            project_number: value(ConfigKey::ProjectNumber)?,
            github_org: value(ConfigKey::GithubOrganization)?,
            github_repo: value(ConfigKey::GithubRepository)?,
            service_account_name: value(ConfigKey::ServiceAccountName)?,
            artifact_registry_name: value(ConfigKey::ArtifactRegistryName)?,
            artifact_registry_location: value(ConfigKey::ArtifactRegistryLocation)?,
            cloud_run_service: value(ConfigKey::CloudRunService)?,
            cloud_run_region: value(ConfigKey::CloudRunRegion)?,
        })
    }

    /// `org/repo` slug used by `gh --repo`.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.github_org, self.github_repo)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
