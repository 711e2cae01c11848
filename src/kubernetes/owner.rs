// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the Cluster API Cluster that owns a KindCluster

use crate::constants::capi;
use crate::error::Result;
use crate::types::{Cluster, ClusterKey, KindCluster};
use async_trait::async_trait;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

/// Looks up the Cluster that authorizes provisioning of a KindCluster.
///
/// `Ok(None)` means the owner link has not been established yet, which is
/// distinct from a failed lookup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    async fn get(&self, cluster: &KindCluster) -> Result<Option<Cluster>>;
}

/// Owner resolver backed by the Kubernetes API
#[derive(Clone)]
pub struct OwnerClusters {
    client: Client,
}

impl OwnerClusters {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Name of the owning Cluster taken from the owner references. Any API
/// version of the Cluster API group is accepted.
pub fn owner_cluster_name(cluster: &KindCluster) -> Option<String> {
    cluster
        .owner_references()
        .iter()
        .find(|owner| {
            owner.kind == capi::CLUSTER_KIND
                && owner.api_version.split('/').next() == Some(capi::GROUP)
        })
        .map(|owner| owner.name.clone())
}

#[async_trait]
impl OwnerResolver for OwnerClusters {
    #[instrument(skip(self, cluster), fields(cluster = %ClusterKey::from(cluster)))]
    async fn get(&self, cluster: &KindCluster) -> Result<Option<Cluster>> {
        let Some(owner_name) = owner_cluster_name(cluster) else {
            debug!("No owner reference to a Cluster yet");
            return Ok(None);
        };

        let namespace = cluster.namespace().unwrap_or_default();
        let clusters: Api<Cluster> = Api::namespaced(self.client.clone(), &namespace);
        let owner = clusters.get_opt(&owner_name).await?;

        if owner.is_none() {
            debug!("Owner Cluster {}/{} not found", namespace, owner_name);
        }
        Ok(owner)
    }
}
