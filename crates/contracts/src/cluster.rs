//! Local cluster identity used to validate incoming patch requests.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::TargetKind;

/// Identity of the cluster this process runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClusterIdentity {
    /// Cluster name; a request must target exactly this name
    #[validate(length(min = 1, message = "cluster name is empty"))]
    pub name: String,

    /// Kinds this cluster accepts patches for
    #[serde(default = "default_supported_kinds")]
    #[validate(length(min = 1, message = "no supported kinds"))]
    pub supported_kinds: Vec<TargetKind>,
}

fn default_supported_kinds() -> Vec<TargetKind> {
    vec![TargetKind::deployment()]
}

impl ClusterIdentity {
    /// Identity accepting only `deployment` targets
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supported_kinds: default_supported_kinds(),
        }
    }

    /// Replace the supported kind whitelist
    pub fn with_supported_kinds<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<TargetKind>,
    {
        self.supported_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Whether patches for `kind` are accepted here
    pub fn supports(&self, kind: &TargetKind) -> bool {
        self.supported_kinds.iter().any(|k| k == kind)
    }
}
