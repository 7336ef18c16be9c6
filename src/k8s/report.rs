//! VulnerabilityReport custom resource and label-selector listing.
//!
//! API Group: aquasecurity.github.io/v1alpha1. Scan results live under the
//! `report` field instead of the usual `spec`/`status` pair, and each report
//! is tied to its workload through `starboard.resource.*` labels.

use std::collections::BTreeMap;

use anyhow::Result;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta};
use kube::Api;
use kube::Resource;
use kube::api::{ListParams, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::k8s::workload::Workload;

pub const GROUP: &str = "aquasecurity.github.io";
pub const VERSION: &str = "v1alpha1";
pub const API_VERSION: &str = "aquasecurity.github.io/v1alpha1";
pub const KIND: &str = "VulnerabilityReport";
pub const LIST_KIND: &str = "VulnerabilityReportList";
pub const PLURAL: &str = "vulnerabilityreports";

pub const LABEL_RESOURCE_KIND: &str = "starboard.resource.kind";
pub const LABEL_RESOURCE_NAME: &str = "starboard.resource.name";
pub const LABEL_RESOURCE_NAMESPACE: &str = "starboard.resource.namespace";
pub const LABEL_CONTAINER_NAME: &str = "starboard.container.name";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityReport {
    #[serde(flatten)]
    pub types: Option<TypeMeta>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub report: VulnerabilityReportData,
}

impl Resource for VulnerabilityReport {
    type DynamicType = ();
    type Scope = k8s_openapi::NamespaceResourceScope;

    fn kind(&(): &Self::DynamicType) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(KIND)
    }

    fn group(&(): &Self::DynamicType) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(GROUP)
    }

    fn version(&(): &Self::DynamicType) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(VERSION)
    }

    fn plural(&(): &Self::DynamicType) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(PLURAL)
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl VulnerabilityReport {
    /// Report name, or an empty string for unnamed objects.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Container the report was produced for.
    pub fn container_name(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(LABEL_CONTAINER_NAME))
            .map(String::as_str)
    }
}

/// Scan results under the `report` field.
///
/// Every field is optional and skipped when absent, and keys the model does
/// not know are kept in `extra`, so a report prints back exactly as the API
/// server returned it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityReportData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<Registry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner: Option<Scanner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<VulnerabilitySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<Vulnerability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VulnerabilityReportData {
    pub fn repository(&self) -> &str {
        self.artifact
            .as_ref()
            .and_then(|a| a.repository.as_deref())
            .unwrap_or_default()
    }

    pub fn tag(&self) -> &str {
        self.artifact
            .as_ref()
            .and_then(|a| a.tag.as_deref())
            .unwrap_or_default()
    }

    pub fn digest(&self) -> &str {
        self.artifact
            .as_ref()
            .and_then(|a| a.digest.as_deref())
            .unwrap_or_default()
    }

    pub fn scanner_name(&self) -> &str {
        self.scanner
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or_default()
    }

    /// Severity counts; missing counts are zero.
    pub fn counts(&self) -> SeverityCounts {
        let summary = self.summary.clone().unwrap_or_default();
        SeverityCounts {
            critical: summary.critical_count.unwrap_or(0),
            high: summary.high_count.unwrap_or(0),
            medium: summary.medium_count.unwrap_or(0),
            low: summary.low_count.unwrap_or(0),
            unknown: summary.unknown_count.unwrap_or(0),
        }
    }
}

/// Per-severity vulnerability counts for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub unknown: i64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scanner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitySummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none_count: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    #[serde(
        default,
        rename = "vulnerabilityID",
        skip_serializing_if = "Option::is_none"
    )]
    pub vulnerability_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub vulnerability_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg_type: Option<String>,
    #[serde(default, rename = "pkgID", skip_serializing_if = "Option::is_none")]
    pub pkg_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eosl: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// List wrapper printed for JSON and YAML output.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityReportList {
    pub api_version: String,
    pub kind: String,
    pub metadata: ListMeta,
    pub items: Vec<VulnerabilityReport>,
}

impl VulnerabilityReportList {
    /// Wrap reports into a list object, stamping apiVersion and kind on
    /// every item.
    pub fn new(reports: &[VulnerabilityReport]) -> Self {
        let items = reports
            .iter()
            .cloned()
            .map(|mut report| {
                report.types = Some(TypeMeta {
                    api_version: API_VERSION.to_string(),
                    kind: KIND.to_string(),
                });
                report
            })
            .collect();

        Self {
            api_version: API_VERSION.to_string(),
            kind: LIST_KIND.to_string(),
            metadata: ListMeta {
                resource_version: Some(String::new()),
                ..Default::default()
            },
            items,
        }
    }
}

/// Labels that tie a report to its workload.
pub fn workload_labels(workload: &Workload) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        (LABEL_RESOURCE_KIND, workload.kind.as_str().to_string()),
        (LABEL_RESOURCE_NAME, workload.name.clone()),
        (LABEL_RESOURCE_NAMESPACE, workload.namespace.clone()),
    ])
}

/// Equality label selector matching the workload's kind, name and namespace.
///
/// Keys are sorted, e.g.
/// `starboard.resource.kind=Deployment,starboard.resource.name=nginx,starboard.resource.namespace=default`.
pub fn workload_selector(workload: &Workload) -> String {
    workload_labels(workload)
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Source of vulnerability reports.
pub trait ReportLister {
    /// List reports in `namespace` matching the label `selector`.
    async fn list_reports(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<VulnerabilityReport>>;
}

/// Lists reports from the Kubernetes API.
pub struct KubeReportLister {
    client: kube::Client,
}

impl KubeReportLister {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

impl ReportLister for KubeReportLister {
    async fn list_reports(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<VulnerabilityReport>> {
        let api: Api<VulnerabilityReport> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default().labels(selector)).await?;

        debug!(
            "Found {} VulnerabilityReport resources in namespace {} (selector: {})",
            list.items.len(),
            namespace,
            selector
        );

        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::workload::WorkloadKind;

    fn deployment(name: &str, namespace: &str) -> Workload {
        Workload {
            kind: WorkloadKind::Deployment,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[test]
    fn test_workload_selector() {
        let selector = workload_selector(&deployment("nginx", "staging"));
        assert_eq!(
            selector,
            "starboard.resource.kind=Deployment,starboard.resource.name=nginx,starboard.resource.namespace=staging"
        );
    }

    #[test]
    fn test_workload_selector_has_exactly_three_pairs() {
        for kind in WorkloadKind::ALL {
            let workload = Workload {
                kind,
                name: "app".to_string(),
                namespace: "prod".to_string(),
            };
            let selector = workload_selector(&workload);
            let pairs: BTreeMap<&str, &str> = selector
                .split(',')
                .map(|pair| pair.split_once('=').unwrap())
                .collect();

            assert_eq!(pairs.len(), 3);
            assert_eq!(pairs[LABEL_RESOURCE_KIND], kind.as_str());
            assert_eq!(pairs[LABEL_RESOURCE_NAME], "app");
            assert_eq!(pairs[LABEL_RESOURCE_NAMESPACE], "prod");
        }
    }

    #[test]
    fn test_deserialize_report() {
        let data = serde_json::json!({
            "apiVersion": "aquasecurity.github.io/v1alpha1",
            "kind": "VulnerabilityReport",
            "metadata": {
                "name": "deployment-nginx-nginx",
                "namespace": "staging",
                "labels": {
                    "starboard.container.name": "nginx",
                    "starboard.resource.kind": "Deployment"
                }
            },
            "report": {
                "artifact": {"repository": "library/nginx", "tag": "1.16"},
                "registry": {"server": "index.docker.io"},
                "scanner": {"name": "Trivy", "vendor": "Aqua Security", "version": "0.16.0"},
                "summary": {"criticalCount": 2, "highCount": 10, "mediumCount": 5},
                "vulnerabilities": [
                    {
                        "vulnerabilityID": "CVE-2020-1234",
                        "resource": "openssl",
                        "installedVersion": "1.1.1",
                        "fixedVersion": "1.1.1g",
                        "severity": "CRITICAL",
                        "score": 9.8
                    }
                ]
            }
        });

        let report: VulnerabilityReport = serde_json::from_value(data).unwrap();
        assert_eq!(report.name(), "deployment-nginx-nginx");
        assert_eq!(report.container_name(), Some("nginx"));
        assert_eq!(report.report.repository(), "library/nginx");
        assert_eq!(report.report.scanner_name(), "Trivy");
        let counts = report.report.counts();
        assert_eq!(counts.critical, 2);
        assert_eq!(counts.low, 0);
        let vulns = report.report.vulnerabilities.as_deref().unwrap();
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].vulnerability_id.as_deref(), Some("CVE-2020-1234"));
        assert_eq!(
            report.types.as_ref().map(|t| t.kind.as_str()),
            Some("VulnerabilityReport")
        );
    }

    #[test]
    fn test_deserialize_report_without_report_field() {
        let data = serde_json::json!({"metadata": {"name": "empty"}});
        let report: VulnerabilityReport = serde_json::from_value(data).unwrap();
        assert_eq!(report.name(), "empty");
        assert!(report.container_name().is_none());
        assert!(report.report.vulnerabilities.is_none());
        assert_eq!(report.report.counts(), SeverityCounts::default());
    }

    #[test]
    fn test_report_list_stamps_type_meta() {
        let report = VulnerabilityReport {
            metadata: ObjectMeta {
                name: Some("a".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let list = VulnerabilityReportList::new(&[report]);
        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(value["apiVersion"], API_VERSION);
        assert_eq!(value["kind"], LIST_KIND);
        assert_eq!(value["items"][0]["apiVersion"], API_VERSION);
        assert_eq!(value["items"][0]["kind"], KIND);
        assert_eq!(value["items"][0]["metadata"]["name"], "a");
    }

    #[test]
    fn test_report_serializes_back_unchanged() {
        let input = serde_json::json!({
            "apiVersion": "aquasecurity.github.io/v1alpha1",
            "kind": "VulnerabilityReport",
            "metadata": {
                "name": "replicaset-nginx-6d4cf56db6-nginx",
                "namespace": "staging",
                "labels": {
                    "starboard.container.name": "nginx",
                    "starboard.resource.kind": "ReplicaSet",
                    "starboard.resource.name": "nginx-6d4cf56db6",
                    "starboard.resource.namespace": "staging"
                }
            },
            "report": {
                "artifact": {"repository": "library/nginx", "tag": "1.16"},
                "scanner": {"name": "Trivy", "version": "0.16.0"},
                "os": {"family": "debian", "name": "10.3", "eosl": true},
                "summary": {"criticalCount": 0, "highCount": 1},
                "vulnerabilities": [
                    {
                        "vulnerabilityID": "CVE-2020-1234",
                        "resource": "libssl1.1",
                        "installedVersion": "1.1.1d-0+deb10u2",
                        "fixedVersion": "1.1.1d-0+deb10u3",
                        "severity": "HIGH",
                        "title": "openssl: heap overflow",
                        "description": "heap overflow in the TLS stack",
                        "target": "library/nginx:1.16 (debian 10.3)",
                        "class": "os-pkgs",
                        "pkgType": "debian",
                        "pkgID": "libssl1.1@1.1.1d-0+deb10u2",
                        "cvss": {"nvd": {"V3Score": 7.5}},
                        "score": 7.5
                    }
                ],
                "updateTimestamp": "2024-03-10T12:00:00Z",
                "layers": ["sha256:aaa"]
            }
        });

        let report: VulnerabilityReport = serde_json::from_value(input.clone()).unwrap();
        let list = VulnerabilityReportList::new(&[report]);
        let output = serde_json::to_value(&list).unwrap();

        assert_eq!(output["items"][0], input);
        assert!(output["items"][0]["report"].get("registry").is_none());
        assert!(output["items"][0]["report"]["vulnerabilities"][0]
            .get("links")
            .is_none());
    }

    #[test]
    fn test_report_list_empty() {
        let list = VulnerabilityReportList::new(&[]);
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["items"], serde_json::json!([]));
    }

    #[test]
    fn test_api_resource_url() {
        let url = VulnerabilityReport::url_path(&(), Some("staging"));
        assert_eq!(
            url,
            "/apis/aquasecurity.github.io/v1alpha1/namespaces/staging/vulnerabilityreports"
        );
    }
}
