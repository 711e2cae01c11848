// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use capk::config::Config;
use capk::kubernetes::{wait_for_capi_cluster_crd, KindClusters, OwnerClusters};
use capk::provisioner::KindProvisioner;
use capk::reconcilers::{KindClusterController, KindClusterReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting kind cluster infrastructure provider");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: kind_binary={}, kind_wait={}s, watch_namespace={}",
        config.kind_binary,
        config.kind_wait.as_secs(),
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Owners are Cluster API Clusters; nothing can be reconciled before their CRD exists
    info!("Waiting for Cluster API Cluster CRD to become available...");
    wait_for_capi_cluster_crd(&client).await?;

    let reconciler = KindClusterReconciler::new(
        Arc::new(KindClusters::new(client.clone())),
        Arc::new(OwnerClusters::new(client.clone())),
        Arc::new(KindProvisioner::from_config(&config)),
    );
    let controller = KindClusterController::new(client, reconciler, &config);

    info!("Starting KindCluster controller...");
    controller.run().await?;

    // The controller only returns when its watch streams end
    warn!("KindCluster controller stopped unexpectedly");
    Ok(())
}
