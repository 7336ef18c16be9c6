//! Kubernetes access: client setup, workload resolution and reports.

pub mod client;
pub mod report;
pub mod workload;
