//! Settings validation
//!
//! Field-level rules come from the `Validate` derives on the settings
//! types. Cross-field rules live here:
//! - subscriber kinds are unique
//! - every subscriber kind is in `cluster.supported_kinds`
//! - `jsonl` subscribers name an output path
//! - directory poll interval is > 0

use std::collections::HashSet;

use contracts::{ContractError, OutputType, ServiceSettings, SourceSettings};
use validator::Validate;

/// Validate `ServiceSettings`
///
/// Returns the first error found.
pub fn validate(settings: &ServiceSettings) -> Result<(), ContractError> {
    settings
        .validate()
        .map_err(|e| ContractError::config_validation("settings", e.to_string()))?;
    validate_source(settings)?;
    validate_subscribers(settings)?;
    Ok(())
}

fn validate_source(settings: &ServiceSettings) -> Result<(), ContractError> {
    match &settings.source {
        SourceSettings::Directory {
            path,
            poll_interval_ms,
        } => {
            if path.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    "source.path",
                    "directory path cannot be empty",
                ));
            }
            if *poll_interval_ms == 0 {
                return Err(ContractError::config_validation(
                    "source.poll_interval_ms",
                    "poll_interval_ms must be > 0",
                ));
            }
        }
    }
    Ok(())
}

fn validate_subscribers(settings: &ServiceSettings) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, subscriber) in settings.subscribers.iter().enumerate() {
        if !seen.insert(&subscriber.kind) {
            return Err(ContractError::config_validation(
                format!("subscribers[kind={}]", subscriber.kind),
                "duplicate subscriber kind",
            ));
        }

        if !settings.cluster.supports(&subscriber.kind) {
            return Err(ContractError::config_validation(
                format!("subscribers[{idx}].kind"),
                format!(
                    "kind '{}' is not in cluster.supported_kinds",
                    subscriber.kind
                ),
            ));
        }

        if subscriber.output == OutputType::Jsonl && subscriber.path.is_none() {
            return Err(ContractError::config_validation(
                format!("subscribers[{idx}].path"),
                "jsonl output requires a path",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ClusterIdentity, ConfigVersion, ProviderSettings, SubscriberSettings, TargetKind,
    };
    use std::path::PathBuf;

    fn minimal_settings() -> ServiceSettings {
        ServiceSettings {
            version: ConfigVersion::V1,
            cluster: ClusterIdentity::new("prod"),
            provider: ProviderSettings::default(),
            source: SourceSettings::Directory {
                path: PathBuf::from("./patches"),
                poll_interval_ms: 500,
            },
            subscribers: vec![SubscriberSettings {
                kind: TargetKind::deployment(),
                output: OutputType::Log,
                path: None,
            }],
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(validate(&minimal_settings()).is_ok());
    }

    #[test]
    fn test_empty_cluster_name() {
        let mut settings = minimal_settings();
        settings.cluster.name = String::new();
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("cluster name is empty"), "got: {err}");
    }

    #[test]
    fn test_queue_capacity_out_of_range() {
        let mut settings = minimal_settings();
        settings.provider.queue_capacity = 0;
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut settings = minimal_settings();
        settings.source = SourceSettings::Directory {
            path: PathBuf::from("./patches"),
            poll_interval_ms: 0,
        };
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms must be > 0"), "got: {err}");
    }

    #[test]
    fn test_duplicate_subscriber_kind() {
        let mut settings = minimal_settings();
        settings.subscribers.push(settings.subscribers[0].clone());
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("duplicate subscriber kind"), "got: {err}");
    }

    #[test]
    fn test_subscriber_kind_not_supported() {
        let mut settings = minimal_settings();
        settings.subscribers[0].kind = "statefulset".into();
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("not in cluster.supported_kinds"), "got: {err}");
    }

    #[test]
    fn test_jsonl_requires_path() {
        let mut settings = minimal_settings();
        settings.subscribers[0].output = OutputType::Jsonl;
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("requires a path"), "got: {err}");
    }
}
