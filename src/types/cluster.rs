// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Partial view of the Cluster API `Cluster` that owns a KindCluster.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.x-k8s.io", version = "v1beta1", kind = "Cluster")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure_ref: Option<InfrastructureRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Cluster {
    /// The KindCluster this Cluster delegates its infrastructure to, as `(namespace, name)`.
    /// The namespace defaults to the Cluster's own.
    pub fn kind_cluster_ref(&self) -> Option<(String, String)> {
        let infra = self.spec.infrastructure_ref.as_ref()?;
        if infra.kind != "KindCluster" {
            return None;
        }
        let namespace = infra
            .namespace
            .clone()
            .or_else(|| self.namespace())
            .unwrap_or_default();
        Some((namespace, infra.name.clone()))
    }
}
