//! Test doubles for the command runner.
use crate::runner::{CommandRunner, Invocation, Program};
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallKind {
    Run,
    Probe,
    Capture,
}

/// Records every invocation and answers from canned rules.
///
/// Rules match on substrings of the rendered command line.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<(CallKind, String)>>,
    failing: Vec<String>,
    existing: Vec<String>,
    captures: Vec<(String, String)>,
    missing_programs: Vec<Program>,
    dry_run: bool,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs whose command line contains `pattern` fail.
    pub(crate) fn fail_when(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.to_string());
        self
    }

    /// Probes whose command line contains `pattern` succeed.
    pub(crate) fn exists_when(mut self, pattern: &str) -> Self {
        self.existing.push(pattern.to_string());
        self
    }

    pub(crate) fn capture_when(mut self, pattern: &str, stdout: &str) -> Self {
        self.captures.push((pattern.to_string(), stdout.to_string()));
        self
    }

    pub(crate) fn without(mut self, program: Program) -> Self {
        self.missing_programs.push(program);
        self
    }

    pub(crate) fn dry(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub(crate) fn lines(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(call, _)| *call == kind)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Rendered command lines of every mutating run, in order.
    pub(crate) fn runs(&self) -> Vec<String> {
        self.lines(CallKind::Run)
    }

    pub(crate) fn probes(&self) -> Vec<String> {
        self.lines(CallKind::Probe)
    }

    fn record(&self, kind: CallKind, invocation: &Invocation) -> String {
        let line = invocation.display();
        self.calls.borrow_mut().push((kind, line.clone()));
        line
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let line = self.record(CallKind::Run, invocation);
        if self.failing.iter().any(|pattern| line.contains(pattern)) {
            return Err(anyhow!("`{line}` exited with exit status: 1"));
        }
        Ok(())
    }

    fn probe(&self, invocation: &Invocation) -> bool {
        let line = self.record(CallKind::Probe, invocation);
        self.existing.iter().any(|pattern| line.contains(pattern))
    }

    fn capture(&self, invocation: &Invocation) -> Option<String> {
        let line = self.record(CallKind::Capture, invocation);
        self.captures
            .iter()
            .find(|(pattern, _)| line.contains(pattern))
            .map(|(_, stdout)| stdout.clone())
    }

    fn locate(&self, program: Program) -> Result<PathBuf> {
        if self.missing_programs.contains(&program) {
            return Err(anyhow!("{program} not found"));
        }
        Ok(PathBuf::from("/usr/bin").join(program.as_str()))
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}
