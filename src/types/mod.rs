// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types watched by the operator.

pub mod cluster;
pub mod key;
pub mod kind_cluster;

pub use cluster::Cluster;
pub use key::ClusterKey;
pub use kind_cluster::{ApiEndpoint, ClusterPhase, KindCluster, KindClusterSpec, KindClusterStatus};
