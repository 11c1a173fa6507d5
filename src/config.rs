use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchemaError};

/// Name of the configuration file stored in the project root.
pub const CONFIG_FILENAME: &str = "docschema.json";

/// Environment variable holding the tracing filter used by the CLI.
pub const LOG_ENV: &str = "DOCSCHEMA_LOG";

/// Configuration for a docschema project.
///
/// Points at the template and schema files and controls how strictly a
/// schema load is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSchemaConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Template definitions file, relative to the project root.
    pub templates: String,
    /// Schema declarations file, relative to the project root.
    pub schema: String,
    /// Whether every persisted property must reference a mapped template
    /// for a load to succeed.
    #[serde(default = "default_true")]
    pub validate_references: bool,
    /// Default tracing filter when `DOCSCHEMA_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for DocSchemaConfig {
    fn default() -> Self {
        Self {
            version: 1,
            templates: "templates.json".to_string(),
            schema: "schema.json".to_string(),
            validate_references: true,
            log_filter: default_log_filter(),
        }
    }
}

impl DocSchemaConfig {
    pub fn templates_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.templates)
    }

    pub fn schema_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.schema)
    }
}

/// Returns the path to the configuration file within the given project root.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns the default
/// configuration.
pub fn load_config(project_root: &Path) -> Result<DocSchemaConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(DocSchemaConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| SchemaError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: DocSchemaConfig =
        serde_json::from_str(&contents).map_err(|e| SchemaError::Config {
            message: format!(
                "failed to parse config file '{}': {}",
                config_path.display(),
                e
            ),
        })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it into place.
pub fn save_config(project_root: &Path, config: &DocSchemaConfig) -> Result<()> {
    fs::create_dir_all(project_root).map_err(|e| SchemaError::Config {
        message: format!(
            "failed to create project directory '{}': {}",
            project_root.display(),
            e
        ),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| SchemaError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| SchemaError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| SchemaError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}
