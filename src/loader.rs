use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::errors::{Result, SchemaError};
use crate::types::{SchemaDeclarations, TemplateDef};

/// Serialization formats accepted for template and schema files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("toml") => Ok(FileFormat::Toml),
            _ => Err(SchemaError::Config {
                message: format!(
                    "unsupported file format for '{}' (expected .json or .toml)",
                    path.display()
                ),
            }),
        }
    }
}

/// TOML documents cannot have an array at the root, so template files in
/// TOML use `[[template]]` tables.
#[derive(serde::Deserialize)]
struct TomlTemplates {
    #[serde(default, rename = "template")]
    templates: Vec<TemplateDef>,
}

/// Loads template definitions from a `.json` array or a `.toml` file of
/// `[[template]]` tables.
pub fn load_templates(path: &Path) -> Result<Vec<TemplateDef>> {
    let format = FileFormat::from_path(path)?;
    let contents = read(path)?;
    match format {
        FileFormat::Json => parse_json(&contents, path),
        FileFormat::Toml => {
            let doc: TomlTemplates = parse_toml(&contents, path)?;
            Ok(doc.templates)
        }
    }
}

/// Loads schema declarations keyed by template name.
pub fn load_declarations(path: &Path) -> Result<SchemaDeclarations> {
    let format = FileFormat::from_path(path)?;
    let contents = read(path)?;
    match format {
        FileFormat::Json => parse_json(&contents, path),
        FileFormat::Toml => parse_toml(&contents, path),
    }
}

/// Parses schema declarations from a JSON string.
pub fn parse_declarations_json(json: &str) -> Result<SchemaDeclarations> {
    Ok(serde_json::from_str(json)?)
}

/// Parses template definitions from a JSON array string.
pub fn parse_templates_json(json: &str) -> Result<Vec<TemplateDef>> {
    Ok(serde_json::from_str(json)?)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SchemaError::Parse {
        message: format!("failed to read file: {}", e),
        path: path.display().to_string(),
    })
}

fn parse_json<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    serde_json::from_str(contents).map_err(|e| SchemaError::Parse {
        message: e.to_string(),
        path: path.display().to_string(),
    })
}

fn parse_toml<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    toml::from_str(contents).map_err(|e| SchemaError::Parse {
        message: e.to_string(),
        path: path.display().to_string(),
    })
}
