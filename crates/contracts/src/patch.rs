//! PatchRequest - unit of configuration change routed to consumers
//!
//! Decoded from the JSON payload of one raw update entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{ClusterIdentity, ContractError, TargetKind};

/// Parsed configuration change for a single Kubernetes object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    /// Identifier of the configuration, must be non-empty
    #[serde(default)]
    pub id: String,

    /// Revision of the configuration, must be non-zero
    #[serde(default)]
    pub revision: i64,

    /// Version assigned by the delivery channel
    #[serde(default)]
    pub rc_version: u64,

    /// Payload schema version, if the producer sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    /// What the consumer should do with the target
    #[serde(default)]
    pub action: PatchAction,

    /// Object the patch applies to
    pub k8s_target: K8sTarget,

    /// Tracer library settings to apply
    #[serde(default)]
    pub lib_config: LibConfig,
}

/// Patch action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchAction {
    #[default]
    Apply,
    Delete,
}

/// Target descriptor: which object in which cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct K8sTarget {
    /// Cluster name
    #[serde(rename = "cluster", default)]
    pub cluster_name: String,

    /// Object kind, the routing key
    pub kind: TargetKind,

    /// Object name
    #[serde(default)]
    pub name: String,

    /// Object namespace
    #[serde(default)]
    pub namespace: String,
}

impl fmt::Display for K8sTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cluster_name, self.kind, self.namespace, self.name
        )
    }
}

/// Tracer library configuration.
///
/// Every field is optional; consumers apply only what is set. Keys this
/// struct does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_sampling_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_rate_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_injection_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_metrics_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_metrics_enabled: Option<bool>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl PatchRequest {
    /// Decode a raw JSON payload
    ///
    /// `path` is only used to give the error context.
    pub fn decode(path: &str, payload: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(payload).map_err(|e| ContractError::payload_decode(path, e))
    }

    /// Routing key of this request
    pub fn kind(&self) -> &TargetKind {
        &self.k8s_target.kind
    }

    /// Check that the request is complete and targets this cluster
    ///
    /// Returns the first rule that fails.
    pub fn validate(&self, cluster: &ClusterIdentity) -> Result<(), ContractError> {
        if self.id.is_empty() {
            return Err(ContractError::patch_validation("id", "id is empty"));
        }
        if self.revision == 0 {
            return Err(ContractError::patch_validation(
                "revision",
                "revision is empty",
            ));
        }
        self.k8s_target.validate(cluster)
    }
}

impl K8sTarget {
    fn validate(&self, cluster: &ClusterIdentity) -> Result<(), ContractError> {
        if self.cluster_name != cluster.name {
            return Err(ContractError::patch_validation(
                "k8s_target.cluster",
                format!(
                    "target cluster name {:?} is different from the local one {:?}",
                    self.cluster_name, cluster.name
                ),
            ));
        }
        if !cluster.supports(&self.kind) {
            return Err(ContractError::patch_validation(
                "k8s_target.kind",
                format!("target kind {:?} is not supported", self.kind.as_str()),
            ));
        }
        if self.name.is_empty() {
            return Err(ContractError::patch_validation(
                "k8s_target.name",
                "target name is empty",
            ));
        }
        if self.namespace.is_empty() {
            return Err(ContractError::patch_validation(
                "k8s_target.namespace",
                "target namespace is empty",
            ));
        }
        Ok(())
    }
}
