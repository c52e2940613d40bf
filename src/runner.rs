//! External command execution for `gcloud` and `gh`.
//!
//! Mutating commands honor dry-run by printing the shell-quoted command line
//! instead of executing it. Read-only probes always execute so a dry run still
//! reflects which resources already exist.
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Placeholder printed in place of sensitive argument values.
pub const REDACTED: &str = "***";

/// External programs the workflows drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Program {
    Gcloud,
    Gh,
}

impl Program {
    pub fn as_str(self) -> &'static str {
        match self {
            Program::Gcloud => "gcloud",
            Program::Gh => "gh",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Arg {
    value: String,
    sensitive: bool,
    /// Length of a `--name=` prefix that is displayed unquoted.
    flag_prefix: usize,
}

/// A single program invocation with an argv (no shell parsing).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: Program,
    args: Vec<Arg>,
}

impl Invocation {
    pub fn new<I, S>(program: Program, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program,
            args: Vec::new(),
        }
        .args(args)
    }

    pub fn gcloud<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Program::Gcloud, args)
    }

    pub fn gh<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Program::Gh, args)
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            sensitive: false,
            flag_prefix: 0,
        });
        self
    }

    pub fn args<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().fold(self, Invocation::arg)
    }

    /// Append `--name=value`.
    pub fn flag(mut self, name: &str, value: impl fmt::Display) -> Self {
        let prefix = format!("--{name}=");
        self.args.push(Arg {
            flag_prefix: prefix.len(),
            value: format!("{prefix}{value}"),
            sensitive: false,
        });
        self
    }

    /// Append an argument whose value must never be printed.
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            sensitive: true,
            flag_prefix: 0,
        });
        self
    }

    pub fn program(&self) -> Program {
        self.program
    }

    /// Raw argument values, sensitive ones included.
    pub fn argv(&self) -> Vec<&str> {
        self.args.iter().map(|arg| arg.value.as_str()).collect()
    }

    /// Shell-quoted command line with sensitive values redacted.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.as_str().to_string()];
        for arg in &self.args {
            if arg.sensitive {
                parts.push(REDACTED.to_string());
            } else {
                let (prefix, value) = arg.value.split_at(arg.flag_prefix);
                parts.push(format!("{prefix}{}", shell_words::quote(value)));
            }
        }
        parts.join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.program.as_str());
        command.args(self.argv());
        command.stdin(Stdio::null());
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Seam between the workflows and the processes they spawn.
pub trait CommandRunner {
    /// Run a mutating command; a nonzero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run a read-only command and report whether it succeeded.
    fn probe(&self, invocation: &Invocation) -> bool;

    /// Run a read-only command and return its trimmed stdout on success.
    fn capture(&self, invocation: &Invocation) -> Option<String>;

    /// Resolve a program on PATH.
    fn locate(&self, program: Program) -> Result<PathBuf>;

    /// Whether mutating commands are printed rather than executed.
    fn dry_run(&self) -> bool;
}

/// Runner backed by real child processes.
pub struct SystemRunner {
    dry_run: bool,
}

impl SystemRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let rendered = invocation.display();
        if self.dry_run {
            println!("  [dry-run] {rendered}");
            return Ok(());
        }

        tracing::debug!(command = %rendered, "run");
        let start = Instant::now();
        let output = invocation
            .command()
            .output()
            .with_context(|| format!("spawn {}", invocation.program()))?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = %output.status,
            "command finished"
        );

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            Err(anyhow!("`{rendered}` exited with {}", output.status))
        } else {
            Err(anyhow!("`{rendered}` exited with {}: {stderr}", output.status))
        }
    }

    fn probe(&self, invocation: &Invocation) -> bool {
        tracing::debug!(command = %invocation, "probe");
        let status = invocation
            .command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) => status.success(),
            Err(err) => {
                tracing::debug!(error = %err, "probe failed to spawn");
                false
            }
        }
    }

    fn capture(&self, invocation: &Invocation) -> Option<String> {
        tracing::debug!(command = %invocation, "capture");
        let output = invocation
            .command()
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(stdout).filter(|value| !value.is_empty())
    }

    fn locate(&self, program: Program) -> Result<PathBuf> {
        let path = which::which(program.as_str())
            .with_context(|| format!("locate {program} on PATH"))?;
        tracing::debug!(program = %program, path = %path.display(), "located");
        Ok(path)
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}
