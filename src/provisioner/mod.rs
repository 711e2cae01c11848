// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provisioning of the real clusters behind KindCluster resources.

pub mod kind;

pub use kind::KindProvisioner;

use crate::error::Result;
use crate::types::{ApiEndpoint, KindCluster};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Creates, inspects and deletes real clusters.
///
/// All operations are keyed on the resource's provisioning name
/// (`spec.name`), never on its namespace/name in the API server.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterProvisioner: Send + Sync {
    /// Create the cluster and wait for its control plane. May take minutes.
    async fn create(&self, cluster: &KindCluster) -> Result<()>;

    async fn exists(&self, cluster: &KindCluster) -> Result<bool>;

    /// Delete the cluster. Deleting a cluster that does not exist succeeds.
    async fn delete(&self, cluster: &KindCluster) -> Result<()>;

    /// Address the cluster's API server is reachable on from this host
    async fn control_plane_endpoint(&self, cluster: &KindCluster) -> Result<ApiEndpoint>;
}
