//! CLI configuration and argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Get vulnerability reports for Kubernetes workloads.
///
/// Reads VulnerabilityReport custom resources produced by an in-cluster
/// scanner and prints them as a table, JSON, YAML or resource names.
#[derive(Parser, Debug, Clone)]
#[command(name = "vulnctl")]
#[command(about = "Get vulnerability reports for Kubernetes workloads")]
#[command(version = const_format::formatcp!(
    "{} (commit: {}, build date: {})",
    VERSION, COMMIT, BUILD_DATE
))]
pub struct Args {
    /// Path to the kubeconfig file to use
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes context to use
    #[arg(long, global = true, env = "KUBECONFIG_CONTEXT")]
    pub context: Option<String>,

    /// Kubeconfig cluster to use
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Kubeconfig user to use
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Namespace of the workload [default: namespace of the current context]
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "VULNCTL_LOG_LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Display one or many resources
    Get {
        /// Output format. One of: (json, yaml, name, wide, table)
        #[arg(short, long, global = true, default_value = "")]
        output: String,

        #[command(subcommand)]
        resource: GetResource,
    },
}

/// Resources supported by `get`.
#[derive(Subcommand, Debug, Clone)]
pub enum GetResource {
    /// Get vulnerabilities report for the specified workload
    #[command(
        visible_aliases = ["vulns", "vuln"],
        alias = "vulnerabilities.aquasecurity.github.io",
        long_about = r#"Get vulnerabilities report for the specified workload

TYPE is a Kubernetes workload. Shortcuts and API groups will be resolved, e.g. 'po' or 'deployments.apps'.
NAME is the name of a particular Kubernetes workload."#,
        after_help = r#"Examples:
  # Get vulnerabilities for a Deployment with the specified name
  vulnctl get vulnerabilities.aquasecurity.github.io deploy/nginx

  # Get vulnerabilities for a Deployment with the specified name in the specified namespace
  vulnctl get vulnerabilities deploy/nginx -n staging

  # Get vulnerabilities for a ReplicaSet with the specified name
  vulnctl get vulns replicaset/nginx

  # Get vulnerabilities for a CronJob with the specified name in JSON output format
  vulnctl get vuln cj/my-job -o json"#
    )]
    Vulnerabilities {
        /// Workload as NAME (a Pod) or TYPE/NAME
        #[arg(value_name = "NAME | TYPE/NAME", default_value = "")]
        workload: String,
    },
}

/// Kubeconfig selection derived from CLI args.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub cluster: Option<String>,
    pub user: Option<String>,
    pub namespace: Option<String>,
}

impl KubeOptions {
    /// Whether any flag overrides the default kubeconfig selection.
    pub fn has_overrides(&self) -> bool {
        self.kubeconfig.is_some()
            || self.context.is_some()
            || self.cluster.is_some()
            || self.user.is_some()
    }
}

/// Application configuration derived from CLI args.
#[derive(Debug, Clone)]
pub struct Config {
    pub kube: KubeOptions,
    pub log_level: String,
    pub command: Command,
}

impl Config {
    /// Create config from CLI arguments.
    pub fn from_args(args: Args) -> Self {
        Self {
            kube: KubeOptions {
                kubeconfig: args.kubeconfig,
                context: args.context,
                cluster: args.cluster,
                user: args.user,
                namespace: args.namespace.filter(|ns| !ns.is_empty()),
            },
            log_level: args.log_level,
            command: args.command,
        }
    }
}
