// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapkError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("kind {command} failed: {message}")]
    KindCommand { command: String, message: String },

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid control plane endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Kind cluster {0} already exists")]
    ClusterAlreadyExists(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),
}

impl CapkError {
    pub fn kind_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        CapkError::KindCommand {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CapkError>;
