//! JsonlConsumer - appends each patch request to a file as one JSON line

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, PatchConsumer, PatchRequest, TargetKind};
use tracing::{debug, instrument};

/// Consumer writing JSON lines to a file
pub struct JsonlConsumer {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlConsumer {
    /// Open (or create) `path` for appending
    ///
    /// Parent directories are created as needed.
    pub fn open(kind: &TargetKind, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: format!("jsonl:{kind}"),
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatchConsumer for JsonlConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "jsonl_consumer_apply",
        skip(self, request),
        fields(consumer = %self.name, id = %request.id)
    )]
    async fn apply(&mut self, request: &PatchRequest) -> Result<(), ContractError> {
        serde_json::to_writer(&mut self.writer, request)
            .map_err(|e| ContractError::Other(format!("serialize {}: {e}", request.id)))?;
        self.writer.write_all(b"\n")?;
        // One line per request; flush so readers never see a partial line.
        self.writer.flush()?;
        debug!(path = %self.path.display(), "Patch request appended");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer.flush()?;
        debug!(consumer = %self.name, path = %self.path.display(), "JsonlConsumer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{K8sTarget, LibConfig, PatchAction};

    fn request(id: &str) -> PatchRequest {
        PatchRequest {
            id: id.to_string(),
            revision: 3,
            rc_version: 12,
            schema_version: Some("v1.0.0".to_string()),
            action: PatchAction::Apply,
            k8s_target: K8sTarget {
                cluster_name: "prod".to_string(),
                kind: TargetKind::deployment(),
                name: "web".to_string(),
                namespace: "default".to_string(),
            },
            lib_config: LibConfig {
                language: Some("java".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_appends_one_line_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/deployment.jsonl");
        let mut consumer = JsonlConsumer::open(&TargetKind::deployment(), &path).unwrap();
        assert_eq!(consumer.name(), "jsonl:deployment");

        consumer.apply(&request("a")).await.unwrap();
        consumer.apply(&request("b")).await.unwrap();
        consumer.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: PatchRequest = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, request("a"));
    }

    #[tokio::test]
    async fn test_log_consumer_counts() {
        let mut consumer = crate::LogConsumer::new(TargetKind::deployment());
        consumer.apply(&request("a")).await.unwrap();
        assert_eq!(consumer.applied(), 1);
        consumer.close().await.unwrap();
    }
}
