// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::capi;
use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the Cluster API Cluster CRD to become available. KindClusters
/// cannot be reconciled before their owners can be looked up.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_capi_cluster_crd(client: &Client) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_capi_cluster_crd_exists(client).await {
            Ok(true) => {
                info!("Cluster CRD ({}/{}) is available", capi::GROUP, capi::VERSION);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Cluster CRD ({}/{}) not yet available, waiting {} seconds...",
                    capi::GROUP,
                    capi::VERSION,
                    interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Cluster CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        interval = next_interval(interval);
    }
}

fn next_interval(interval: u64) -> u64 {
    (interval * 2).min(POLL_MAX_INTERVAL_SECS)
}

/// Check if the Cluster CRD exists by attempting to discover it.
async fn check_capi_cluster_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[capi::GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == capi::GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == capi::CLUSTER_KIND && ar.version == capi::VERSION {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
