//! `get vulnerabilities` command.
//!
//! Lists the VulnerabilityReports labelled with a workload's kind, name and
//! namespace and prints them with the requested printer.

use std::io::Write;

use tracing::{debug, info};

use crate::error::VulnctlError;
use crate::k8s::report::{ReportLister, workload_selector};
use crate::k8s::workload::Workload;
use crate::output::printer::Printer;

/// Get and print vulnerability reports for `workload`.
///
/// Printed objects go to `out`; notices such as the empty-table message go
/// to `status`.
pub async fn run<L, W, S>(
    lister: &L,
    workload: &Workload,
    output: &str,
    color: bool,
    out: &mut W,
    status: &mut S,
) -> Result<(), VulnctlError>
where
    L: ReportLister,
    W: Write,
    S: Write,
{
    let selector = workload_selector(workload);
    debug!("Listing vulnerability reports for {} (selector: {})", workload, selector);

    let reports = lister
        .list_reports(&workload.namespace, &selector)
        .await
        .map_err(|e| VulnctlError::ListReports(format!("{:#}", e)))?;

    info!("Found {} vulnerability reports for {}", reports.len(), workload);

    let printer = Printer::new(output)
        .map_err(VulnctlError::CreatePrinter)?
        .with_color(color);

    printer
        .print(&reports, &workload.namespace, out, status)
        .map_err(|e| VulnctlError::PrintReports(format!("{:#}", e)))?;

    Ok(())
}
