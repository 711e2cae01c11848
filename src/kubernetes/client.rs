// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed access to KindCluster resources

use crate::constants::{FINALIZER, OPERATOR_NAME};
use crate::error::Result;
use crate::types::{ApiEndpoint, ClusterKey, KindCluster, KindClusterStatus};
use async_trait::async_trait;
use kube::{
    api::{Patch, PatchParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

/// Reads and mutates KindCluster resources.
///
/// Every mutation is safe to repeat: calling it against a resource that is
/// already in the requested state changes nothing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KindClusterClient: Send + Sync {
    /// Load a KindCluster, `None` when it no longer exists
    async fn get(&self, key: &ClusterKey) -> Result<Option<KindCluster>>;

    async fn add_finalizer(&self, cluster: &KindCluster) -> Result<()>;

    async fn remove_finalizer(&self, cluster: &KindCluster) -> Result<()>;

    /// Publish the API server address in `spec.controlPlaneEndpoint`
    async fn set_control_plane_endpoint(
        &self,
        endpoint: &ApiEndpoint,
        cluster: &KindCluster,
    ) -> Result<()>;

    /// Merge-patch the status subresource
    async fn update_status(&self, status: &KindClusterStatus, cluster: &KindCluster) -> Result<()>;
}

/// KindCluster client backed by the Kubernetes API
#[derive(Clone)]
pub struct KindClusters {
    client: Client,
}

impl KindClusters {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, cluster: &KindCluster) -> Api<KindCluster> {
        Api::namespaced(
            self.client.clone(),
            &cluster.namespace().unwrap_or_default(),
        )
    }

    async fn patch_finalizers(&self, cluster: &KindCluster, finalizers: Vec<String>) -> Result<()> {
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers
            }
        });
        self.api(cluster)
            .patch(
                &cluster.name_any(),
                &PatchParams::apply(OPERATOR_NAME),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KindClusterClient for KindClusters {
    #[instrument(skip(self), fields(cluster = %key))]
    async fn get(&self, key: &ClusterKey) -> Result<Option<KindCluster>> {
        let api: Api<KindCluster> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    #[instrument(skip(self, cluster), fields(cluster = %ClusterKey::from(cluster)))]
    async fn add_finalizer(&self, cluster: &KindCluster) -> Result<()> {
        let mut finalizers = cluster.finalizers().to_vec();
        if finalizers.iter().any(|f| f == FINALIZER) {
            debug!("Finalizer already present");
            return Ok(());
        }

        finalizers.push(FINALIZER.to_string());
        self.patch_finalizers(cluster, finalizers).await
    }

    #[instrument(skip(self, cluster), fields(cluster = %ClusterKey::from(cluster)))]
    async fn remove_finalizer(&self, cluster: &KindCluster) -> Result<()> {
        let finalizers = cluster.finalizers();
        if !finalizers.iter().any(|f| f == FINALIZER) {
            debug!("Finalizer already removed");
            return Ok(());
        }

        let remaining = finalizers
            .iter()
            .filter(|f| f.as_str() != FINALIZER)
            .cloned()
            .collect();
        self.patch_finalizers(cluster, remaining).await
    }

    #[instrument(skip(self, cluster), fields(cluster = %ClusterKey::from(cluster), endpoint = %endpoint))]
    async fn set_control_plane_endpoint(
        &self,
        endpoint: &ApiEndpoint,
        cluster: &KindCluster,
    ) -> Result<()> {
        if cluster.spec.control_plane_endpoint.as_ref() == Some(endpoint) {
            debug!("Control plane endpoint already set");
            return Ok(());
        }

        let patch = serde_json::json!({
            "spec": {
                "controlPlaneEndpoint": endpoint
            }
        });
        self.api(cluster)
            .patch(
                &cluster.name_any(),
                &PatchParams::apply(OPERATOR_NAME),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, status, cluster), fields(cluster = %ClusterKey::from(cluster), phase = ?status.phase))]
    async fn update_status(&self, status: &KindClusterStatus, cluster: &KindCluster) -> Result<()> {
        let patch = serde_json::json!({ "status": status });
        self.api(cluster)
            .patch_status(
                &cluster.name_any(),
                &PatchParams::apply(OPERATOR_NAME),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }
}
