// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster provisioning through the `kind` CLI

use crate::config::Config;
use crate::constants::kind::CONFIG_API_VERSION;
use crate::error::{CapkError, Result};
use crate::provisioner::ClusterProvisioner;
use crate::types::{ApiEndpoint, KindCluster};
use async_trait::async_trait;
use kube::config::Kubeconfig;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use url::Url;

/// Runs `kind` against the local container runtime
#[derive(Debug, Clone)]
pub struct KindProvisioner {
    binary: String,
    kubeconfig: Option<PathBuf>,
    wait: Duration,
}

impl KindProvisioner {
    pub fn new(binary: impl Into<String>, kubeconfig: Option<PathBuf>, wait: Duration) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig,
            wait,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.kind_binary.clone(),
            config.kind_kubeconfig.clone(),
            config.kind_wait,
        )
    }

    fn with_kubeconfig(&self, mut args: Vec<String>) -> Vec<String> {
        if let Some(path) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(path.display().to_string());
        }
        args
    }

    /// Run kind and return its stdout. A non-zero exit becomes an error
    /// carrying kind's stderr.
    async fn run(&self, args: Vec<String>, stdin: Option<String>) -> Result<String> {
        let command = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        debug!("Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CapkError::kind_command(&command, format!("failed to start {}: {}", self.binary, e))
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|e| CapkError::kind_command(&command, format!("failed to write stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CapkError::kind_command(&command, e.to_string()))?;

        if !output.status.success() {
            return Err(CapkError::kind_command(
                command,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ClusterProvisioner for KindProvisioner {
    #[instrument(skip(self, cluster), fields(kind_cluster = %cluster.provisioning_name()))]
    async fn create(&self, cluster: &KindCluster) -> Result<()> {
        let config = serde_yaml::to_string(&KindConfig::for_cluster(cluster))
            .map_err(|e| CapkError::SerializationError(e.to_string()))?;

        info!("Creating kind cluster {}", cluster.provisioning_name());
        let args = self.with_kubeconfig(vec![
            "create".to_string(),
            "cluster".to_string(),
            "--name".to_string(),
            cluster.provisioning_name().to_string(),
            "--config".to_string(),
            "-".to_string(),
            "--wait".to_string(),
            format!("{}s", self.wait.as_secs()),
        ]);
        self.run(args, Some(config)).await?;

        info!("Kind cluster {} created", cluster.provisioning_name());
        Ok(())
    }

    #[instrument(skip(self, cluster), fields(kind_cluster = %cluster.provisioning_name()))]
    async fn exists(&self, cluster: &KindCluster) -> Result<bool> {
        let output = self
            .run(vec!["get".to_string(), "clusters".to_string()], None)
            .await?;
        Ok(is_listed(&output, cluster.provisioning_name()))
    }

    #[instrument(skip(self, cluster), fields(kind_cluster = %cluster.provisioning_name()))]
    async fn delete(&self, cluster: &KindCluster) -> Result<()> {
        info!("Deleting kind cluster {}", cluster.provisioning_name());
        let args = self.with_kubeconfig(vec![
            "delete".to_string(),
            "cluster".to_string(),
            "--name".to_string(),
            cluster.provisioning_name().to_string(),
        ]);
        self.run(args, None).await?;
        Ok(())
    }

    #[instrument(skip(self, cluster), fields(kind_cluster = %cluster.provisioning_name()))]
    async fn control_plane_endpoint(&self, cluster: &KindCluster) -> Result<ApiEndpoint> {
        let kubeconfig = self
            .run(
                vec![
                    "get".to_string(),
                    "kubeconfig".to_string(),
                    "--name".to_string(),
                    cluster.provisioning_name().to_string(),
                ],
                None,
            )
            .await?;
        endpoint_from_kubeconfig(&kubeconfig)
    }
}

/// `kind get clusters` prints one cluster name per line
fn is_listed(output: &str, name: &str) -> bool {
    output.lines().any(|line| line.trim() == name)
}

/// Host and port of the first cluster server in an exported kubeconfig
fn endpoint_from_kubeconfig(raw: &str) -> Result<ApiEndpoint> {
    let kubeconfig: Kubeconfig = serde_yaml::from_str(raw)
        .map_err(|e| CapkError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let server = kubeconfig
        .clusters
        .iter()
        .find_map(|named| named.cluster.as_ref().and_then(|c| c.server.clone()))
        .ok_or_else(|| CapkError::KubeconfigError("Kubeconfig has no cluster server".to_string()))?;

    let url = Url::parse(&server)
        .map_err(|e| CapkError::KubeconfigError(format!("Invalid server URL {}: {}", server, e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CapkError::KubeconfigError(format!("Server URL {} has no host", server)))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| CapkError::KubeconfigError(format!("Server URL {} has no port", server)))?;

    Ok(ApiEndpoint::new(host, i32::from(port)))
}

/// `kind.x-k8s.io/v1alpha4` cluster configuration passed on stdin
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct KindConfig {
    kind: &'static str,
    api_version: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<KindNode>,
}

#[derive(Serialize, Debug, PartialEq)]
struct KindNode {
    role: NodeRole,
}

#[derive(Serialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
enum NodeRole {
    ControlPlane,
    Worker,
}

impl KindConfig {
    /// One node entry per requested node. No counts at all leaves the
    /// topology to kind (a single control-plane node); workers without a
    /// control plane get one control-plane node.
    fn for_cluster(cluster: &KindCluster) -> Self {
        let workers = cluster.spec.worker_nodes.unwrap_or(0);
        let mut control_planes = cluster.spec.control_plane_nodes.unwrap_or(0);
        if workers > 0 && control_planes == 0 {
            control_planes = 1;
        }

        let nodes = std::iter::repeat(NodeRole::ControlPlane)
            .take(control_planes as usize)
            .chain(std::iter::repeat(NodeRole::Worker).take(workers as usize))
            .map(|role| KindNode { role })
            .collect();

        KindConfig {
            kind: "Cluster",
            api_version: CONFIG_API_VERSION,
            nodes,
        }
    }
}
