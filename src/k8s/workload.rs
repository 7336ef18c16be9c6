//! Workload reference parsing.
//!
//! Resolves `NAME` and `TYPE/NAME` arguments into a workload kind, name and
//! namespace. Resource types accept kubectl shortcuts, singular and plural
//! names, and group-qualified forms such as `deployments.apps` or
//! `deployments.v1.apps`.

use std::fmt;

use tracing::debug;

use crate::error::VulnctlError;

/// Kubernetes workload kinds that can own vulnerability reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Pod,
    ReplicaSet,
    ReplicationController,
    Deployment,
    StatefulSet,
    DaemonSet,
    CronJob,
    Job,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 8] = [
        WorkloadKind::Pod,
        WorkloadKind::ReplicaSet,
        WorkloadKind::ReplicationController,
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
        WorkloadKind::CronJob,
        WorkloadKind::Job,
    ];

    /// Kind name as stored in resource labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Pod => "Pod",
            WorkloadKind::ReplicaSet => "ReplicaSet",
            WorkloadKind::ReplicationController => "ReplicationController",
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::CronJob => "CronJob",
            WorkloadKind::Job => "Job",
        }
    }

    /// API group of the kind. The core group is empty.
    pub fn group(&self) -> &'static str {
        match self {
            WorkloadKind::Pod | WorkloadKind::ReplicationController => "",
            WorkloadKind::ReplicaSet
            | WorkloadKind::Deployment
            | WorkloadKind::StatefulSet
            | WorkloadKind::DaemonSet => "apps",
            WorkloadKind::CronJob | WorkloadKind::Job => "batch",
        }
    }

    /// Lowercase resource names that refer to this kind: plural, singular
    /// and shortcuts.
    fn resource_names(&self) -> &'static [&'static str] {
        match self {
            WorkloadKind::Pod => &["pods", "pod", "po"],
            WorkloadKind::ReplicaSet => &["replicasets", "replicaset", "rs"],
            WorkloadKind::ReplicationController => {
                &["replicationcontrollers", "replicationcontroller", "rc"]
            }
            WorkloadKind::Deployment => &["deployments", "deployment", "deploy"],
            WorkloadKind::StatefulSet => &["statefulsets", "statefulset", "sts"],
            WorkloadKind::DaemonSet => &["daemonsets", "daemonset", "ds"],
            WorkloadKind::CronJob => &["cronjobs", "cronjob", "cj"],
            WorkloadKind::Job => &["jobs", "job"],
        }
    }

    /// Resolve a resource type such as `deploy`, `Deployments` or
    /// `deployments.v1.apps` to a workload kind.
    pub fn from_resource(resource: &str) -> Option<WorkloadKind> {
        let resource = resource.to_ascii_lowercase();
        let (name, qualifier) = match resource.split_once('.') {
            Some((name, qualifier)) => (name, Some(qualifier)),
            None => (resource.as_str(), None),
        };

        let kind = Self::ALL
            .into_iter()
            .find(|kind| kind.resource_names().contains(&name))?;

        match qualifier {
            None => Some(kind),
            Some(qualifier) if qualifier_matches_group(qualifier, kind.group()) => Some(kind),
            Some(_) => None,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a `group` or `version.group` qualifier against the kind's group.
fn qualifier_matches_group(qualifier: &str, group: &str) -> bool {
    if qualifier == group {
        return true;
    }

    // version.group, e.g. "v1.apps" or "v1beta1.batch"
    match qualifier.split_once('.') {
        Some((version, rest)) => is_version(version) && rest == group,
        // a bare version qualifies a core group kind: "pods.v1"
        None => group.is_empty() && is_version(qualifier),
    }
}

/// Kubernetes API version shape: v1, v2beta1, v1alpha1.
fn is_version(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('v') else {
        return false;
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return false;
    }

    let suffix = &rest[digits_end..];
    if suffix.is_empty() {
        return true;
    }

    ["alpha", "beta"].iter().any(|stage| {
        suffix
            .strip_prefix(stage)
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

/// A workload identified by kind, name and namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} in namespace {}", self.kind, self.name, self.namespace)
    }
}

/// Resolve a workload from a `NAME` or `TYPE/NAME` argument.
///
/// A bare `NAME` refers to a Pod.
pub fn workload_from_arg(namespace: &str, arg: &str) -> Result<Workload, VulnctlError> {
    if arg.is_empty() {
        return Err(VulnctlError::WorkloadNotSpecified);
    }

    let Some((resource, name)) = arg.split_once('/') else {
        debug!("No resource type given, assuming Pod '{}'", arg);
        return Ok(Workload {
            kind: WorkloadKind::Pod,
            name: arg.to_string(),
            namespace: namespace.to_string(),
        });
    };

    if name.is_empty() {
        return Err(VulnctlError::BlankWorkloadName);
    }

    let kind = WorkloadKind::from_resource(resource)
        .ok_or_else(|| VulnctlError::UnrecognizedResource(resource.to_string()))?;

    debug!("Resolved resource '{}' to kind {}", resource, kind);

    Ok(Workload {
        kind,
        name: name.to_string(),
        namespace: namespace.to_string(),
    })
}
