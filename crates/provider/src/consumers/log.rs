//! LogConsumer - logs each received patch request via tracing

use contracts::{ContractError, PatchConsumer, PatchRequest, TargetKind};
use tracing::{info, instrument};

/// Consumer that only logs what it receives
pub struct LogConsumer {
    name: String,
    kind: TargetKind,
    applied: u64,
}

impl LogConsumer {
    /// Create a consumer for `kind`
    pub fn new(kind: TargetKind) -> Self {
        Self {
            name: format!("log:{kind}"),
            kind,
            applied: 0,
        }
    }

    /// Requests logged so far
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

impl PatchConsumer for LogConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_consumer_apply",
        skip(self, request),
        fields(consumer = %self.name, id = %request.id)
    )]
    async fn apply(&mut self, request: &PatchRequest) -> Result<(), ContractError> {
        self.applied += 1;
        info!(
            consumer = %self.name,
            id = %request.id,
            revision = request.revision,
            action = ?request.action,
            target = %request.k8s_target,
            language = request.lib_config.language.as_deref().unwrap_or("-"),
            version = request.lib_config.version.as_deref().unwrap_or("-"),
            "Patch request received"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        info!(consumer = %self.name, kind = %self.kind, applied = self.applied, "LogConsumer closed");
        Ok(())
    }
}
