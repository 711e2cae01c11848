// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::FINALIZER;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1alpha3",
    kind = "KindCluster"
)]
#[kube(namespaced)]
#[kube(status = "KindClusterStatus")]
#[kube(printcolumn = r#"{"name":"Ready", "type":"boolean", "jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#)]
#[serde(rename_all = "camelCase")]
pub struct KindClusterSpec {
    /// Name the kind cluster is created under
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_nodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_nodes: Option<u32>,
}

/// Address the workload cluster's API server is serving on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: i32,
}

impl ApiEndpoint {
    pub fn new(host: impl Into<String>, port: i32) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.host.is_empty() && self.port > 0
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, schemars::JsonSchema)]
pub enum ClusterPhase {
    Pending,
    #[serde(alias = "Creating")]
    Provisioning,
    #[serde(alias = "Created")]
    Provisioned,
    Ready,
    Deleting,
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterPhase::Pending => "Pending",
            ClusterPhase::Provisioning => "Provisioning",
            ClusterPhase::Provisioned => "Provisioned",
            ClusterPhase::Ready => "Ready",
            ClusterPhase::Deleting => "Deleting",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KindClusterStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(
        default,
        deserialize_with = "empty_phase_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<ClusterPhase>")]
    pub phase: Option<ClusterPhase>,
    /// Last fatal provisioning error. Always serialized so that a merge
    /// patch with `null` clears it.
    #[serde(default)]
    pub failure_message: Option<String>,
}

/// A phase written as `""` means the resource has never been reconciled.
fn empty_phase_as_none<'de, D>(deserializer: D) -> Result<Option<ClusterPhase>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(phase) => serde_json::from_value(serde_json::Value::String(phase.to_string()))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl KindClusterStatus {
    pub fn pending() -> Self {
        Self {
            ready: false,
            phase: Some(ClusterPhase::Pending),
            failure_message: None,
        }
    }

    /// Provisioning keeps the previous failure visible until a creation succeeds.
    pub fn provisioning(previous_failure: Option<String>) -> Self {
        Self {
            ready: false,
            phase: Some(ClusterPhase::Provisioning),
            failure_message: previous_failure,
        }
    }

    pub fn provisioned() -> Self {
        Self {
            ready: false,
            phase: Some(ClusterPhase::Provisioned),
            failure_message: None,
        }
    }

    pub fn ready() -> Self {
        Self {
            ready: true,
            phase: Some(ClusterPhase::Ready),
            failure_message: None,
        }
    }

    pub fn deleting(previous_failure: Option<String>) -> Self {
        Self {
            ready: false,
            phase: Some(ClusterPhase::Deleting),
            failure_message: previous_failure,
        }
    }

    /// Back to Pending with the error that prevented progress.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ready: false,
            phase: Some(ClusterPhase::Pending),
            failure_message: Some(message.into()),
        }
    }
}

impl KindCluster {
    /// Name of the real kind cluster backing this resource
    pub fn provisioning_name(&self) -> &str {
        &self.spec.name
    }

    pub fn phase(&self) -> Option<ClusterPhase> {
        self.status.as_ref().and_then(|s| s.phase)
    }

    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    pub fn failure_message(&self) -> Option<String> {
        self.status.as_ref().and_then(|s| s.failure_message.clone())
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == FINALIZER)
    }

    /// True once the API server has recorded a deletion request
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::api::ObjectMeta;
    use rstest::rstest;

    fn make_kind_cluster(status: Option<KindClusterStatus>) -> KindCluster {
        KindCluster {
            metadata: ObjectMeta {
                name: Some("potato".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: KindClusterSpec {
                name: "the-kind-cluster-name".to_string(),
                control_plane_endpoint: None,
                control_plane_nodes: None,
                worker_nodes: None,
            },
            status,
        }
    }

    #[test]
    fn test_phase_without_status() {
        let cluster = make_kind_cluster(None);
        assert_eq!(cluster.phase(), None);
        assert!(!cluster.is_ready());
    }

    #[test]
    fn test_phase_from_status() {
        let cluster = make_kind_cluster(Some(KindClusterStatus::ready()));
        assert_eq!(cluster.phase(), Some(ClusterPhase::Ready));
        assert!(cluster.is_ready());
    }

    #[test]
    fn test_empty_phase_deserializes_as_unset() {
        let status: KindClusterStatus =
            serde_json::from_value(serde_json::json!({ "ready": false, "phase": "" })).unwrap();
        assert_eq!(status.phase, None);
    }

    #[test]
    fn test_missing_fields_deserialize_as_defaults() {
        let status: KindClusterStatus = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(status, KindClusterStatus::default());
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let result: Result<KindClusterStatus, _> =
            serde_json::from_value(serde_json::json!({ "phase": "Exploding" }));
        assert!(result.is_err());
    }

    #[rstest]
    #[case::creating("Creating", ClusterPhase::Provisioning)]
    #[case::created("Created", ClusterPhase::Provisioned)]
    fn test_legacy_phase_names_are_accepted(#[case] wire: &str, #[case] phase: ClusterPhase) {
        let cluster: KindCluster = serde_json::from_value(serde_json::json!({
            "apiVersion": "infrastructure.cluster.x-k8s.io/v1alpha3",
            "kind": "KindCluster",
            "metadata": { "name": "potato", "namespace": "default" },
            "spec": { "name": "the-kind-cluster-name" },
            "status": { "ready": false, "phase": wire }
        }))
        .unwrap();

        assert_eq!(cluster.phase(), Some(phase));
        // Written back under the current name
        assert_eq!(
            serde_json::to_value(phase).unwrap(),
            serde_json::json!(phase.to_string())
        );
    }

    #[rstest]
    #[case(ClusterPhase::Pending, "Pending")]
    #[case(ClusterPhase::Provisioning, "Provisioning")]
    #[case(ClusterPhase::Provisioned, "Provisioned")]
    #[case(ClusterPhase::Ready, "Ready")]
    #[case(ClusterPhase::Deleting, "Deleting")]
    fn test_phase_wire_name_matches_display(#[case] phase: ClusterPhase, #[case] wire: &str) {
        assert_eq!(serde_json::to_value(phase).unwrap(), serde_json::json!(wire));
        assert_eq!(phase.to_string(), wire);
    }

    #[test]
    fn test_cleared_failure_message_serializes_as_null() {
        let value = serde_json::to_value(KindClusterStatus::provisioned()).unwrap();
        assert_eq!(value["failureMessage"], serde_json::Value::Null);
        assert!(value.as_object().unwrap().contains_key("failureMessage"));
    }

    #[test]
    fn test_failed_status_returns_to_pending() {
        let status = KindClusterStatus::failed("boom");
        assert_eq!(status.phase, Some(ClusterPhase::Pending));
        assert!(!status.ready);
        assert_eq!(status.failure_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_has_finalizer() {
        let mut cluster = make_kind_cluster(None);
        assert!(!cluster.has_finalizer());

        cluster.metadata.finalizers = Some(vec![FINALIZER.to_string()]);
        assert!(cluster.has_finalizer());
    }

    #[test]
    fn test_is_being_deleted() {
        let mut cluster = make_kind_cluster(None);
        assert!(!cluster.is_being_deleted());

        let now: Time = serde_json::from_value(serde_json::json!("2026-01-01T00:00:00Z")).unwrap();
        cluster.metadata.deletion_timestamp = Some(now);
        assert!(cluster.is_being_deleted());
    }

    #[rstest]
    #[case("127.0.0.1", 6443, true)]
    #[case("", 6443, false)]
    #[case("127.0.0.1", 0, false)]
    #[case("127.0.0.1", -1, false)]
    fn test_endpoint_validity(#[case] host: &str, #[case] port: i32, #[case] valid: bool) {
        assert_eq!(ApiEndpoint::new(host, port).is_valid(), valid);
    }
}
