// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Finalizer that holds a KindCluster until its kind cluster is deleted
pub const FINALIZER: &str = "kindcluster.infrastructure.cluster.x-k8s.io";

/// The operator name used as field manager on patches
pub const OPERATOR_NAME: &str = "capk";

/// Cluster API core group, owner of KindCluster resources
pub mod capi {
    pub const GROUP: &str = "cluster.x-k8s.io";
    pub const VERSION: &str = "v1beta1";
    pub const CLUSTER_KIND: &str = "Cluster";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// kind CLI defaults
pub mod kind {
    pub const BINARY: &str = "kind";
    /// How long `kind create cluster` waits for the control plane to become ready
    pub const WAIT_SECS: u64 = 600;
    pub const CONFIG_API_VERSION: &str = "kind.x-k8s.io/v1alpha4";
}

/// Requeue intervals in seconds
pub mod requeue {
    /// While a creation is in flight
    pub const PROVISIONING_SECS: u64 = 10;
    /// After a failed reconciliation
    pub const ERROR_SECS: u64 = 60;
    /// Checking that a Ready cluster still exists
    pub const READY_RECHECK_SECS: u64 = 300;
}

/// Retries of the status write that ends a detached cluster creation
pub mod status_retry {
    pub const ATTEMPTS: u32 = 8;
    pub const INITIAL_DELAY_MILLIS: u64 = 250;
    pub const MAX_DELAY_MILLIS: u64 = 30_000;
}
