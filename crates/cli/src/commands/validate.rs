//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ServiceSettings, SourceSettings};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    version: String,
    cluster: String,
    supported_kinds: Vec<String>,
    source: String,
    queue_capacity: usize,
    subscriber_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating settings");

    let result = validate_settings(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::SettingsLoader::load_from_path(&args.config) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&settings)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(settings: &ServiceSettings) -> SettingsSummary {
    let source = match &settings.source {
        SourceSettings::Directory {
            path,
            poll_interval_ms,
        } => format!("directory {} (every {poll_interval_ms} ms)", path.display()),
    };

    SettingsSummary {
        version: format!("{:?}", settings.version),
        cluster: settings.cluster.name.clone(),
        supported_kinds: settings
            .cluster
            .supported_kinds
            .iter()
            .map(ToString::to_string)
            .collect(),
        source,
        queue_capacity: settings.provider.queue_capacity,
        subscriber_count: settings.subscribers.len(),
    }
}

/// Collect non-fatal issues
fn collect_warnings(settings: &ServiceSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.subscribers.is_empty() {
        warnings.push("No subscribers configured - every patch request will be dropped".to_string());
    }

    for kind in &settings.cluster.supported_kinds {
        if !settings.subscribers.iter().any(|s| &s.kind == kind) {
            warnings.push(format!(
                "Supported kind '{kind}' has no subscriber - its requests will be dropped"
            ));
        }
    }

    let SourceSettings::Directory { path, .. } = &settings.source;
    if !path.is_dir() {
        warnings.push(format!(
            "Source directory {} does not exist yet",
            path.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Cluster: {}", summary.cluster);
            println!("  Supported kinds: {}", summary.supported_kinds.join(", "));
            println!("  Source: {}", summary.source);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Subscribers: {}", summary.subscriber_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Settings are invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
