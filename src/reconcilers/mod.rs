// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! KindCluster reconciliation and the controller that drives it.

pub mod controller;
pub mod kind_cluster;

pub use controller::KindClusterController;
pub use kind_cluster::{Disposition, KindClusterReconciler};
