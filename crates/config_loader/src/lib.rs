//! # Config Loader
//!
//! Loads and validates [`ServiceSettings`] from TOML or JSON.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::SettingsLoader;
//! use std::path::Path;
//!
//! let settings = SettingsLoader::load_from_path(Path::new("distributor.toml")).unwrap();
//! println!("Cluster: {}", settings.cluster.name);
//! ```

mod parser;
mod validator;

pub use contracts::ServiceSettings;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Settings loader
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a file, picking the format from its extension
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ServiceSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ServiceSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Serialize settings to TOML
    pub fn to_toml(settings: &ServiceSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to JSON
    pub fn to_json(settings: &ServiceSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SETTINGS_TOML: &str = r#"
[cluster]
name = "prod"
supported_kinds = ["deployment", "statefulset"]

[provider]
queue_capacity = 4

[source]
type = "directory"
path = "./patches"
poll_interval_ms = 200

[[subscribers]]
kind = "deployment"

[[subscribers]]
kind = "statefulset"
output = "jsonl"
path = "./out/statefulset.jsonl"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let settings = SettingsLoader::load_from_str(SETTINGS_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(settings.cluster.name, "prod");
        assert_eq!(settings.provider.queue_capacity, 4);
        assert_eq!(settings.provider.update_buffer, 16);
        assert_eq!(settings.subscribers.len(), 2);
    }

    #[test]
    fn test_round_trip_toml() {
        let settings = SettingsLoader::load_from_str(SETTINGS_TOML, ConfigFormat::Toml).unwrap();
        let serialized = SettingsLoader::to_toml(&settings).unwrap();
        let again = SettingsLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(settings.cluster, again.cluster);
        assert_eq!(settings.subscribers.len(), again.subscribers.len());
    }

    #[test]
    fn test_json_output_reloads() {
        let settings = SettingsLoader::load_from_str(SETTINGS_TOML, ConfigFormat::Toml).unwrap();
        let json = SettingsLoader::to_json(&settings).unwrap();
        let again = SettingsLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(settings.cluster.supported_kinds, again.cluster.supported_kinds);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SETTINGS_TOML.as_bytes()).unwrap();
        let settings = SettingsLoader::load_from_path(file.path()).unwrap();
        assert_eq!(settings.cluster.name, "prod");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = SettingsLoader::load_from_path(file.path()).unwrap_err().to_string();
        assert!(err.contains("unsupported config format"), "got: {err}");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[cluster]
name = "prod"

[source]
type = "directory"
path = "./patches"

[[subscribers]]
kind = "daemonset"
"#;
        let err = SettingsLoader::load_from_str(content, ConfigFormat::Toml)
            .unwrap_err()
            .to_string();
        assert!(err.contains("supported_kinds"), "got: {err}");
    }
}
