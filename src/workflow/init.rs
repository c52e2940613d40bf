use crate::config::DEFAULT_CONFIG_FILE;
use crate::templates;
use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub(crate) const WORKFLOW_REL: &str = ".github/workflows/gcloud-deploy.yml";
const GITIGNORE_ENTRY: &str = "\n# GCloud setup\n.env.gcloud\n";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum GitignoreUpdate {
    Created,
    Appended,
    AlreadyIgnored,
}

pub fn run_init() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    init_at(&cwd)
}

/// Scaffold the deploy workflow and env template under `root`.
///
/// Both targets are checked before anything is written, so an existing file
/// leaves the tree untouched.
pub(crate) fn init_at(root: &Path) -> Result<()> {
    let workflow_path = root.join(WORKFLOW_REL);
    let env_path = root.join(DEFAULT_CONFIG_FILE);
    for path in [&workflow_path, &env_path] {
        if path.exists() {
            return Err(anyhow!("file already exists: {}", path.display()));
        }
    }

    if let Some(parent) = workflow_path.parent() {
        fs::create_dir_all(parent).context("failed to create .github/workflows directory")?;
    }
    write_new_file(&workflow_path, templates::DEPLOY_WORKFLOW_YML)?;
    println!("✓ Created {}", workflow_path.display());

    write_new_file(&env_path, templates::ENV_GCLOUD_TEMPLATE)?;
    println!("✓ Created {}", env_path.display());

    match ensure_gitignored(&root.join(".gitignore")) {
        Ok(GitignoreUpdate::AlreadyIgnored) => {
            println!("✓ .gitignore already ignores {DEFAULT_CONFIG_FILE}");
        }
        Ok(_) => println!("✓ Updated .gitignore"),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "gitignore update failed");
            println!("⚠ Could not update .gitignore: {err:#}");
        }
    }

    println!();
    println!("Next steps:");
    println!("  1. Edit {DEFAULT_CONFIG_FILE} with your project values");
    println!("  2. Run: gcsetup setup");
    Ok(())
}

fn write_new_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Make sure `.env.gcloud` is listed in the ignore file, creating it if needed.
pub(crate) fn ensure_gitignored(path: &Path) -> Result<GitignoreUpdate> {
    if !path.exists() {
        fs::write(path, GITIGNORE_ENTRY).with_context(|| format!("write {}", path.display()))?;
        return Ok(GitignoreUpdate::Created);
    }
    let existing =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if existing.contains(DEFAULT_CONFIG_FILE) {
        return Ok(GitignoreUpdate::AlreadyIgnored);
    }
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    file.write_all(GITIGNORE_ENTRY.as_bytes())
        .with_context(|| format!("append {}", path.display()))?;
    Ok(GitignoreUpdate::Appended)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
