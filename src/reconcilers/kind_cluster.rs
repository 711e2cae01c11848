// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! KindCluster lifecycle.
//!
//! The phase stored in the resource status is the only record of progress.
//! Creating a kind cluster takes minutes, so it runs in a detached task that
//! reports back by writing the status; while that status reads
//! `Provisioning` every reconciliation steps aside.

use crate::constants::status_retry::{ATTEMPTS, INITIAL_DELAY_MILLIS, MAX_DELAY_MILLIS};
use crate::error::{CapkError, Result};
use crate::kubernetes::{KindClusterClient, OwnerResolver};
use crate::provisioner::ClusterProvisioner;
use crate::types::{ClusterKey, ClusterPhase, KindCluster, KindClusterStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// What the driver should do after a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Steady state, wait for the next change
    Done,
    /// Reconcile again soon
    Requeue,
    /// Healthy, but look again later in case the kind cluster disappears
    Recheck,
}

pub struct KindClusterReconciler {
    clusters: Arc<dyn KindClusterClient>,
    owners: Arc<dyn OwnerResolver>,
    provisioner: Arc<dyn ClusterProvisioner>,
}

impl KindClusterReconciler {
    pub fn new(
        clusters: Arc<dyn KindClusterClient>,
        owners: Arc<dyn OwnerResolver>,
        provisioner: Arc<dyn ClusterProvisioner>,
    ) -> Self {
        Self {
            clusters,
            owners,
            provisioner,
        }
    }

    /// Move the KindCluster identified by `key` one step along its lifecycle.
    ///
    /// Callers must not reconcile the same key concurrently.
    #[instrument(skip(self), fields(cluster = %key))]
    pub async fn reconcile(&self, key: &ClusterKey) -> Result<Disposition> {
        let Some(cluster) = self.clusters.get(key).await? else {
            debug!("KindCluster is gone, nothing to do");
            return Ok(Disposition::Done);
        };

        if self.owners.get(&cluster).await?.is_none() {
            debug!("Waiting for an owner Cluster");
            return Ok(Disposition::Done);
        }

        if cluster.is_being_deleted() {
            return self.delete(&cluster).await;
        }

        match cluster.phase() {
            None => {
                self.clusters
                    .update_status(&KindClusterStatus::pending(), &cluster)
                    .await?;
                Ok(Disposition::Requeue)
            }
            Some(ClusterPhase::Pending) => self.start_provisioning(cluster).await,
            Some(ClusterPhase::Provisioning) => {
                debug!("Creation of {} in progress", cluster.provisioning_name());
                Ok(Disposition::Requeue)
            }
            Some(ClusterPhase::Provisioned) => self.publish_endpoint(&cluster).await,
            Some(ClusterPhase::Ready) => self.verify_ready(&cluster).await,
            Some(ClusterPhase::Deleting) => {
                warn!("KindCluster is Deleting but has no deletion timestamp");
                Ok(Disposition::Done)
            }
        }
    }

    async fn start_provisioning(&self, cluster: KindCluster) -> Result<Disposition> {
        let name = cluster.provisioning_name().to_string();

        if self.provisioner.exists(&cluster).await? {
            let err = CapkError::ClusterAlreadyExists(name);
            error!("{}", err);
            self.clusters
                .update_status(&KindClusterStatus::failed(err.to_string()), &cluster)
                .await?;
            return Err(err);
        }

        self.clusters.add_finalizer(&cluster).await?;
        self.clusters
            .update_status(
                &KindClusterStatus::provisioning(cluster.failure_message()),
                &cluster,
            )
            .await?;

        info!("Provisioning kind cluster {}", name);
        let span = info_span!("create_kind_cluster", cluster = %ClusterKey::from(&cluster));
        tokio::spawn(
            create_kind_cluster(self.clusters.clone(), self.provisioner.clone(), cluster)
                .instrument(span),
        );

        Ok(Disposition::Requeue)
    }

    async fn publish_endpoint(&self, cluster: &KindCluster) -> Result<Disposition> {
        if !self.provisioner.exists(cluster).await? {
            return self.regress(cluster).await;
        }

        let endpoint = self.provisioner.control_plane_endpoint(cluster).await?;
        if !endpoint.is_valid() {
            return Err(CapkError::InvalidEndpoint(endpoint.to_string()));
        }

        self.clusters
            .set_control_plane_endpoint(&endpoint, cluster)
            .await?;
        self.clusters
            .update_status(&KindClusterStatus::ready(), cluster)
            .await?;

        info!(
            "Kind cluster {} is ready at {}",
            cluster.provisioning_name(),
            endpoint
        );
        Ok(Disposition::Recheck)
    }

    async fn verify_ready(&self, cluster: &KindCluster) -> Result<Disposition> {
        if self.provisioner.exists(cluster).await? {
            return Ok(Disposition::Recheck);
        }
        self.regress(cluster).await
    }

    /// The kind cluster disappeared underneath us, start over from Pending.
    async fn regress(&self, cluster: &KindCluster) -> Result<Disposition> {
        warn!(
            "Kind cluster {} no longer exists, returning to Pending",
            cluster.provisioning_name()
        );
        self.clusters
            .update_status(&KindClusterStatus::pending(), cluster)
            .await?;
        Ok(Disposition::Requeue)
    }

    async fn delete(&self, cluster: &KindCluster) -> Result<Disposition> {
        if !cluster.has_finalizer() {
            debug!("No finalizer left, nothing to clean up");
            return Ok(Disposition::Done);
        }

        if let Err(e) = self
            .clusters
            .update_status(
                &KindClusterStatus::deleting(cluster.failure_message()),
                cluster,
            )
            .await
        {
            warn!("Failed to mark KindCluster as Deleting: {}", e);
        }

        self.provisioner.delete(cluster).await?;
        self.clusters.remove_finalizer(cluster).await?;

        info!("Kind cluster {} deleted", cluster.provisioning_name());
        Ok(Disposition::Done)
    }
}

/// Runs detached from the reconciliation that started it; the outcome is
/// only visible through the status it writes.
async fn create_kind_cluster(
    clusters: Arc<dyn KindClusterClient>,
    provisioner: Arc<dyn ClusterProvisioner>,
    cluster: KindCluster,
) {
    let status = match provisioner.create(&cluster).await {
        Ok(()) => {
            info!("Kind cluster {} created", cluster.provisioning_name());
            KindClusterStatus::provisioned()
        }
        Err(e) => {
            error!(
                "Failed to create kind cluster {}: {}",
                cluster.provisioning_name(),
                e
            );
            KindClusterStatus::failed(e.to_string())
        }
    };

    record_outcome(clusters.as_ref(), &status, &cluster).await;
}

/// Until the outcome lands the resource stays locked in Provisioning.
async fn record_outcome(
    clusters: &dyn KindClusterClient,
    status: &KindClusterStatus,
    cluster: &KindCluster,
) {
    let mut delay = INITIAL_DELAY_MILLIS;

    for attempt in 1..=ATTEMPTS {
        match clusters.update_status(status, cluster).await {
            Ok(()) => return,
            Err(e) if attempt < ATTEMPTS => {
                warn!(
                    "Failed to record {:?} (attempt {}/{}): {}, retrying in {}ms",
                    status.phase, attempt, ATTEMPTS, e, delay
                );
                sleep(Duration::from_millis(delay)).await;
                delay = (delay * 2).min(MAX_DELAY_MILLIS);
            }
            Err(e) => {
                error!(
                    "Giving up on recording {:?} after {} attempts: {}",
                    status.phase, ATTEMPTS, e
                );
            }
        }
    }
}
