//! `gcsetup loadbalancer setup`: a global external HTTP(S) load balancer that
//! routes URL paths to per-service backends.
//!
//! Every resource is probed with `describe` first so reruns skip what already
//! exists. The URL map is only given path rules when this run created it.
use crate::cli::{ConfigArgs, LoadbalancerSetupArgs};
use crate::config::{self, ConfigKey, Settings};
use crate::preflight;
use crate::prompt::Prompter;
use crate::runner::{CommandRunner, Invocation, SystemRunner};
use crate::steps::{banner, done, field, run_steps, Step, RULE};
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::io::{BufRead, IsTerminal, Write};
use std::str::FromStr;

const DEFAULT_LB_NAME: &str = "gcloud-lb";
const DEFAULT_NETWORK: &str = "default";
const DEFAULT_PORT: u16 = 8080;
const HEALTH_CHECK_PATH: &str = "/healthz";
const MAX_SERVICES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
        }
    }

    fn listen_port(self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(Protocol::Http),
            "HTTPS" => Ok(Protocol::Https),
            other => Err(anyhow!("unsupported protocol {other:?} (expected HTTP or HTTPS)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackendService {
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
    pub path: String,
}

impl BackendService {
    fn with_defaults(index: usize) -> Self {
        let name = format!("service-{index}");
        Self {
            path: format!("/{name}/*"),
            name,
            protocol: Protocol::Http,
            port: DEFAULT_PORT,
        }
    }

    pub fn health_check(&self) -> String {
        format!("{}-hc", self.name)
    }

    pub fn backend(&self) -> String {
        format!("{}-backend", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadBalancerConfig {
    pub project_id: String,
    pub name: String,
    pub network: String,
    pub subnet: String,
    pub health_check_port: u16,
    /// Present only when the frontend terminates TLS.
    pub ssl_certificate: Option<String>,
    /// Never empty; the first entry is the URL map's default backend.
    pub services: Vec<BackendService>,
}

impl LoadBalancerConfig {
    fn frontend_protocol(&self) -> Protocol {
        if self.ssl_certificate.is_some() {
            Protocol::Https
        } else {
            Protocol::Http
        }
    }

    fn url_map(&self) -> String {
        format!("{}-url-map", self.name)
    }

    fn proxy(&self) -> String {
        format!("{}-proxy", self.name)
    }

    fn address(&self) -> String {
        format!("{}-ip", self.name)
    }

    fn forwarding_rule(&self) -> String {
        format!("{}-forwarding-rule", self.name)
    }

    fn default_backend(&self) -> Result<String> {
        self.services
            .first()
            .map(BackendService::backend)
            .ok_or_else(|| anyhow!("at least one backend service is required"))
    }
}

const LOADBALANCER_STEPS: [Step<LoadBalancerConfig>; 5] = [
    Step {
        name: "Creating Health Checks",
        run: create_health_checks,
    },
    Step {
        name: "Creating Backend Services",
        run: create_backend_services,
    },
    Step {
        name: "Creating URL Map",
        run: create_url_map,
    },
    Step {
        name: "Creating HTTP(S) Proxy",
        run: create_proxy,
    },
    Step {
        name: "Creating Forwarding Rule",
        run: create_forwarding_rule,
    },
];

pub fn run_loadbalancer_setup(
    args: &LoadbalancerSetupArgs,
    config_args: &ConfigArgs,
) -> Result<()> {
    let settings = config::load(config_args)?;
    let runner = SystemRunner::new(args.dry_run);
    let interactive = !args.yes && std::io::stdin().is_terminal();
    let mut prompter = Prompter::stdio(interactive);
    setup_load_balancer(&runner, &mut prompter, &settings)
}

pub(crate) fn setup_load_balancer<R: BufRead, W: Write>(
    runner: &dyn CommandRunner,
    prompter: &mut Prompter<R, W>,
    settings: &Settings,
) -> Result<()> {
    preflight::check_gcloud(runner)?;

    println!();
    banner("Load Balancer Configuration");
    println!();

    let project_id = settings.require(ConfigKey::ProjectId)?;
    let config = collect_config(prompter, project_id)?;

    println!();
    banner("Load Balancer Configuration Summary");
    field("Name", &config.name);
    field("Network", &config.network);
    if !config.subnet.is_empty() {
        field("Subnet", &config.subnet);
    }
    field("Health Check Port", config.health_check_port);
    field("Use SSL", config.ssl_certificate.is_some());
    field("Number of Services", config.services.len());
    println!();
    for (idx, service) in config.services.iter().enumerate() {
        println!("  Service {}: {}", idx + 1, service.name);
        println!(
            "    Protocol: {}, Port: {}, Path: {}",
            service.protocol, service.port, service.path
        );
    }
    println!("{RULE}");
    println!();

    if !prompter.confirm("Proceed with load balancer configuration?")? {
        println!("Configuration cancelled.");
        return Ok(());
    }
    println!();

    run_steps(runner, &config, &LOADBALANCER_STEPS)?;

    banner("Load Balancer Configuration Complete!");
    println!();
    println!("Load Balancer Name: {}", config.name);
    println!("Next steps:");
    println!("  1. Get the load balancer IP:");
    println!(
        "     gcloud compute forwarding-rules describe {} --global",
        config.forwarding_rule()
    );
    println!("  2. Create a DNS record pointing to the load balancer IP");
    println!("  3. Test the configuration with curl");
    Ok(())
}

fn collect_config<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    project_id: &str,
) -> Result<LoadBalancerConfig> {
    let name = prompter.ask("Load Balancer Name", DEFAULT_LB_NAME)?;
    let network = prompter.ask("Network", DEFAULT_NETWORK)?;
    let subnet = prompter.ask("Subnet (leave empty for auto)", "")?;
    let health_check_port = prompter.ask_number("Health Check Port", DEFAULT_PORT)?;

    let mut ssl_certificate = None;
    if prompter.ask_yes_no("Use SSL/TLS?", false)? {
        let certificate = prompter.ask("SSL Certificate Name", "")?;
        if certificate.is_empty() {
            tracing::warn!("no SSL certificate given; falling back to HTTP");
            println!("⚠ SSL certificate name is required for HTTPS. Using HTTP instead.");
        } else {
            ssl_certificate = Some(certificate);
        }
    }

    let requested = prompter.ask_number("How many services?", 1usize)?;
    let count = requested.clamp(1, MAX_SERVICES);
    if count != requested {
        tracing::warn!(requested, count, "service count out of range");
        println!("⚠ Service count must be between 1 and {MAX_SERVICES}; using {count}.");
    }
    let services = (1..=count)
        .map(|index| collect_service(prompter, index))
        .collect::<Result<Vec<_>>>()?;

    Ok(LoadBalancerConfig {
        project_id: project_id.to_string(),
        name,
        network,
        subnet,
        health_check_port,
        ssl_certificate,
        services,
    })
}

fn collect_service<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    index: usize,
) -> Result<BackendService> {
    let defaults = BackendService::with_defaults(index);
    if !prompter.is_interactive() {
        return Ok(defaults);
    }

    println!();
    println!("Service {index}:");
    let name = prompter.ask("  Service name", &defaults.name)?;
    let answer = prompter.ask("  Protocol (HTTP/HTTPS)", defaults.protocol.as_str())?;
    let protocol = answer.parse::<Protocol>().unwrap_or_else(|err| {
        tracing::warn!(error = %format!("{err:#}"), "using HTTP");
        println!("  ⚠ {err:#}; using HTTP");
        Protocol::Http
    });
    let port = prompter.ask_number("  Port", DEFAULT_PORT)?;
    let path = prompter.ask("  URL Path (e.g., /api/*)", &format!("/{name}/*"))?;

    Ok(BackendService {
        name,
        protocol,
        port,
        path,
    })
}

/// Create `name` unless `describe` finds it; reports whether it was created.
fn ensure(
    runner: &dyn CommandRunner,
    kind: &str,
    name: &str,
    describe: Invocation,
    create: Invocation,
) -> Result<bool> {
    if runner.probe(&describe) {
        println!("  ✓ {kind} '{name}' already exists");
        return Ok(false);
    }
    println!("  Creating {kind} '{name}'...");
    runner
        .run(&create)
        .with_context(|| format!("failed to create {kind} '{name}'"))?;
    done(runner, format_args!("{kind} '{name}' created"));
    Ok(true)
}

fn describe(group: &str, name: &str, project_id: &str) -> Invocation {
    Invocation::gcloud(["compute", group, "describe", name, "--global"]).flag("project", project_id)
}

fn create_health_checks(runner: &dyn CommandRunner, config: &LoadBalancerConfig) -> Result<()> {
    for service in &config.services {
        let health_check = service.health_check();
        let create = Invocation::gcloud([
            "compute",
            "health-checks",
            "create",
            "http",
            health_check.as_str(),
            "--global",
        ])
        .flag("port", config.health_check_port)
        .flag("request-path", HEALTH_CHECK_PATH)
        .flag("project", &config.project_id);
        ensure(
            runner,
            "health check",
            &health_check,
            describe("health-checks", &health_check, &config.project_id),
            create,
        )?;
    }
    Ok(())
}

fn create_backend_services(
    runner: &dyn CommandRunner,
    config: &LoadBalancerConfig,
) -> Result<()> {
    for service in &config.services {
        let backend = service.backend();
        let create = Invocation::gcloud([
            "compute",
            "backend-services",
            "create",
            backend.as_str(),
            "--global",
        ])
        .flag("protocol", service.protocol)
        .flag("port-name", "http")
        .flag("health-checks", service.health_check())
        .flag("load-balancing-scheme", "EXTERNAL")
        .arg("--enable-cdn")
        .flag("project", &config.project_id);
        ensure(
            runner,
            "backend service",
            &backend,
            describe("backend-services", &backend, &config.project_id),
            create,
        )?;
    }
    Ok(())
}

fn create_url_map(runner: &dyn CommandRunner, config: &LoadBalancerConfig) -> Result<()> {
    let url_map = config.url_map();
    let default_backend = config.default_backend()?;
    let create =
        Invocation::gcloud(["compute", "url-maps", "create", url_map.as_str(), "--global"])
            .flag("default-service", &default_backend)
            .flag("project", &config.project_id);
    let created = ensure(
        runner,
        "URL map",
        &url_map,
        describe("url-maps", &url_map, &config.project_id),
        create,
    )?;
    if !created {
        return Ok(());
    }

    let rules: Vec<String> = config
        .services
        .iter()
        .map(|service| format!("{}={}", service.path, service.backend()))
        .collect();
    for service in &config.services {
        println!("  Adding path rule '{}' -> {}", service.path, service.backend());
    }
    let add_paths = Invocation::gcloud([
        "compute",
        "url-maps",
        "add-path-matcher",
        url_map.as_str(),
        "--global",
    ])
    .flag("path-matcher-name", format!("{}-paths", config.name))
    .flag("default-service", &default_backend)
    .flag("new-hosts", "*")
    .flag("path-rules", rules.join(","))
    .flag("project", &config.project_id);
    if let Err(err) = runner.run(&add_paths) {
        tracing::warn!(url_map = %url_map, error = %format!("{err:#}"), "path rules not added");
        println!("  ⚠ Could not add path rules (may already exist): {err:#}");
    }
    Ok(())
}

fn create_proxy(runner: &dyn CommandRunner, config: &LoadBalancerConfig) -> Result<()> {
    let proxy = config.proxy();
    let url_map = config.url_map();
    let (group, kind) = match config.frontend_protocol() {
        Protocol::Http => ("target-http-proxies", "HTTP proxy"),
        Protocol::Https => ("target-https-proxies", "HTTPS proxy"),
    };
    let mut create = Invocation::gcloud(["compute", group, "create", proxy.as_str(), "--global"])
        .flag("url-map", &url_map);
    if let Some(certificate) = &config.ssl_certificate {
        create = create.flag("ssl-certificates", certificate);
    }
    create = create.flag("project", &config.project_id);
    ensure(
        runner,
        kind,
        &proxy,
        describe(group, &proxy, &config.project_id),
        create,
    )?;
    Ok(())
}

fn create_forwarding_rule(runner: &dyn CommandRunner, config: &LoadBalancerConfig) -> Result<()> {
    let address = config.address();
    let create_address =
        Invocation::gcloud(["compute", "addresses", "create", address.as_str(), "--global"])
            .flag("project", &config.project_id);
    ensure(
        runner,
        "global address",
        &address,
        describe("addresses", &address, &config.project_id),
        create_address,
    )?;

    let rule = config.forwarding_rule();
    let protocol = config.frontend_protocol();
    let target = match protocol {
        Protocol::Http => "target-http-proxy",
        Protocol::Https => "target-https-proxy",
    };
    let create_rule = Invocation::gcloud([
        "compute",
        "forwarding-rules",
        "create",
        rule.as_str(),
        "--global",
    ])
    .flag(target, config.proxy())
    .flag("address", &address)
    .flag("ports", protocol.listen_port())
    .flag("project", &config.project_id);
    ensure(
        runner,
        "forwarding rule",
        &rule,
        describe("forwarding-rules", &rule, &config.project_id),
        create_rule,
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "loadbalancer_tests.rs"]
mod tests;
