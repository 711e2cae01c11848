// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access for KindClusters and their owning Clusters, plus CRD discovery.

pub mod client;
pub mod crd;
pub mod owner;

pub use client::{KindClusterClient, KindClusters};
pub use crd::wait_for_capi_cluster_crd;
pub use owner::{OwnerClusters, OwnerResolver};
