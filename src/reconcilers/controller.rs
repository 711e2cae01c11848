// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Drives the KindCluster reconciler from Kubernetes watch events.

use crate::config::Config;
use crate::error::{CapkError, Result};
use crate::reconcilers::kind_cluster::{Disposition, KindClusterReconciler};
use crate::types::{Cluster, ClusterKey, KindCluster};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct KindClusterController {
    client: Client,
    reconciler: KindClusterReconciler,
    requeue_interval: Duration,
    error_requeue_interval: Duration,
    ready_recheck_interval: Duration,
    watch_namespace: Option<String>,
}

impl KindClusterController {
    pub fn new(client: Client, reconciler: KindClusterReconciler, config: &Config) -> Self {
        Self {
            client,
            reconciler,
            requeue_interval: config.requeue_interval,
            error_requeue_interval: config.error_requeue_interval,
            ready_recheck_interval: config.ready_recheck_interval,
            watch_namespace: config.watch_namespace.clone(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let (kind_clusters, clusters): (Api<KindCluster>, Api<Cluster>) =
            match &self.watch_namespace {
                Some(namespace) => {
                    info!("Watching KindClusters in namespace {}", namespace);
                    (
                        Api::namespaced(self.client.clone(), namespace),
                        Api::namespaced(self.client.clone(), namespace),
                    )
                }
                None => {
                    info!("Watching KindClusters in all namespaces");
                    (Api::all(self.client.clone()), Api::all(self.client.clone()))
                }
            };

        let context = Arc::new(self);

        // A Cluster gaining its infrastructureRef is what unblocks a waiting KindCluster
        Controller::new(kind_clusters, WatcherConfig::default())
            .watches(clusters, WatcherConfig::default(), infrastructure_ref)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled KindCluster: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

fn infrastructure_ref(cluster: Cluster) -> Option<ObjectRef<KindCluster>> {
    cluster
        .kind_cluster_ref()
        .map(|(namespace, name)| ObjectRef::new(&name).within(&namespace))
}

impl KindClusterController {
    fn to_action(&self, disposition: Disposition) -> Action {
        match disposition {
            Disposition::Done => Action::await_change(),
            Disposition::Requeue => Action::requeue(self.requeue_interval),
            Disposition::Recheck => Action::requeue(self.ready_recheck_interval),
        }
    }
}

async fn reconcile(cluster: Arc<KindCluster>, ctx: Arc<KindClusterController>) -> Result<Action> {
    let key = ClusterKey::from(cluster.as_ref());
    let disposition = ctx.reconciler.reconcile(&key).await?;
    Ok(ctx.to_action(disposition))
}

fn error_policy(
    cluster: Arc<KindCluster>,
    error: &CapkError,
    ctx: Arc<KindClusterController>,
) -> Action {
    error!(
        "Failed to reconcile KindCluster {}: {}",
        ClusterKey::from(cluster.as_ref()),
        error
    );
    Action::requeue(ctx.error_requeue_interval)
}
