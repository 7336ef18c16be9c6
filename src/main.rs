//! vulnctl - get vulnerability reports for Kubernetes workloads.
//!
//! Looks up the VulnerabilityReport custom resources an in-cluster scanner
//! attached to a workload and prints them as a table, JSON, YAML or names.

mod commands;
mod config;
mod error;
mod k8s;
mod output;

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use config::{Args, Command, Config, GetResource};
use k8s::report::KubeReportLister;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_args(args);

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Starting vulnctl");

    if let Err(e) = run(&config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(config: &Config) -> Result<()> {
    match &config.command {
        Command::Get {
            output,
            resource: GetResource::Vulnerabilities { workload },
        } => run_get_vulnerabilities(config, workload, output).await,
    }
}

/// Resolve the workload, build a client and print its vulnerability reports.
async fn run_get_vulnerabilities(config: &Config, workload: &str, output: &str) -> Result<()> {
    let kube_config = k8s::client::load_config(&config.kube).await?;
    let namespace = k8s::client::resolve_namespace(&config.kube, &kube_config);
    let workload = k8s::workload::workload_from_arg(&namespace, workload)?;
    let client = k8s::client::build_client(kube_config)?;

    let lister = KubeReportLister::new(client);
    let stdout = std::io::stdout();
    let color = stdout.is_terminal() && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(color);

    let mut out = stdout.lock();
    let mut status = std::io::stderr().lock();
    commands::get_vulnerabilities::run(&lister, &workload, output, color, &mut out, &mut status)
        .await?;

    Ok(())
}

/// Initialize tracing subscriber. Logs go to stderr so they never mix
/// with printed objects.
fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {}", e))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
