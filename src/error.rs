//! Custom error types for vulnctl.

use thiserror::Error;

/// Errors that can occur while getting vulnerability reports.
///
/// Each variant names the step that failed so the message alone tells
/// the user where the command stopped.
#[derive(Error, Debug)]
pub enum VulnctlError {
    #[error("load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("create kubernetes client: {0}")]
    Client(String),

    #[error("required workload kind and name not specified")]
    WorkloadNotSpecified,

    #[error("required workload name is blank")]
    BlankWorkloadName,

    #[error("unrecognized resource: {0}")]
    UnrecognizedResource(String),

    #[error("list vulnerability reports: {0}")]
    ListReports(String),

    #[error("create printer: {0}")]
    CreatePrinter(String),

    #[error("print vulnerability reports: {0}")]
    PrintReports(String),
}
