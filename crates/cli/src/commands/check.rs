//! `check` command implementation.

use anyhow::{Context, Result};
use contracts::{ClusterIdentity, PatchRequest, TargetKind};
use serde::Serialize;
use tracing::info;

use crate::cli::CheckArgs;
use crate::error::CliError;

/// Check result for JSON output
#[derive(Serialize)]
struct CheckResult {
    accepted: bool,
    payload_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<PatchRequest>,
}

/// Execute the `check` command
pub fn run_check(args: &CheckArgs) -> Result<()> {
    info!(payload = %args.payload.display(), cluster = %args.cluster, "Checking payload");

    if !args.payload.exists() {
        return Err(CliError::payload_not_found(args.payload.display().to_string()).into());
    }
    let content = std::fs::read(&args.payload)
        .with_context(|| format!("Failed to read {}", args.payload.display()))?;

    let result = check_payload(args, &content);

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize check result")?;
        println!("{json}");
    } else if result.accepted {
        println!("✓ Payload accepted: {}", result.payload_path);
        if let Some(ref request) = result.request {
            println!("\n  Id: {}", request.id);
            println!("  Revision: {}", request.revision);
            println!("  Target: {}", request.k8s_target);
        }
    } else {
        println!("✗ Payload rejected: {}", result.payload_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }

    if result.accepted {
        Ok(())
    } else {
        anyhow::bail!("Payload rejected")
    }
}

fn check_payload(args: &CheckArgs, content: &[u8]) -> CheckResult {
    let payload_path = args.payload.display().to_string();
    let cluster = cluster_identity(args);

    let outcome = PatchRequest::decode(&payload_path, content)
        .and_then(|request| request.validate(&cluster).map(|()| request));

    match outcome {
        Ok(request) => CheckResult {
            accepted: true,
            payload_path,
            error: None,
            request: Some(request),
        },
        Err(e) => CheckResult {
            accepted: false,
            payload_path,
            error: Some(e.to_string()),
            request: None,
        },
    }
}

fn cluster_identity(args: &CheckArgs) -> ClusterIdentity {
    let identity = ClusterIdentity::new(args.cluster.as_str());
    if args.kinds.is_empty() {
        identity
    } else {
        identity.with_supported_kinds(args.kinds.iter().map(|k| TargetKind::new(k.as_str())))
    }
}
