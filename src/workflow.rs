//! Top-level command flows. Each submodule owns one subcommand and keeps a
//! runner-generic entry point for tests beside the process-facing one.
mod init;
mod loadbalancer;
mod project;
mod setup;

pub use init::run_init;
pub use loadbalancer::run_loadbalancer_setup;
pub use project::run_project_create;
pub use setup::run_setup;
