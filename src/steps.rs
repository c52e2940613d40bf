//! Linear step sequencing and the console framing around it.
//!
//! Steps run strictly in order; the first failure stops the sequence. There is
//! no retry and no rollback.
use crate::runner::CommandRunner;
use anyhow::Result;
use std::fmt::Display;
use std::time::Instant;

pub const RULE: &str = "==============================================";
pub const THIN_RULE: &str = "----------------------------------------------";

/// A named unit of work over a command's configuration.
pub struct Step<C> {
    pub name: &'static str,
    pub run: fn(&dyn CommandRunner, &C) -> Result<()>,
}

pub fn run_steps<C>(runner: &dyn CommandRunner, config: &C, steps: &[Step<C>]) -> Result<()> {
    let total = steps.len();
    for (idx, step) in steps.iter().enumerate() {
        println!("Step {}/{}: {}...", idx + 1, total, step.name);
        println!("{THIN_RULE}");
        let start = Instant::now();
        if let Err(err) = (step.run)(runner, config) {
            tracing::debug!(step = step.name, "step failed");
            return Err(err.context(format!("{} failed", step.name)));
        }
        tracing::info!(
            step = step.name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "step complete"
        );
        println!();
    }
    Ok(())
}

/// Print `title` framed by rules.
pub fn banner(title: &str) {
    println!("{RULE}");
    println!("{title}");
    println!("{RULE}");
}

/// Report a completed action; dry runs completed nothing.
pub fn done(runner: &dyn CommandRunner, message: impl Display) {
    if !runner.dry_run() {
        println!("  ✓ {message}");
    }
}

/// Print an aligned `label: value` summary line.
pub fn field(label: &str, value: impl Display) {
    println!("  {:<22}{value}", format!("{label}:"));
}
