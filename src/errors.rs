use thiserror::Error;

/// Errors that can occur while loading or resolving a document schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{second} and {first} are both defined to be top documents of {collection}")]
    DuplicateTopDocument {
        collection: String,
        first: String,
        second: String,
    },

    #[error("missing schema entry for {referenced} (referenced by {template}.{property})")]
    MissingSchemaEntry {
        template: String,
        property: String,
        referenced: String,
    },

    #[error("template '{name}' is already registered")]
    DuplicateTemplate { name: String },

    #[error("template '{template}' extends unknown template '{parent}'")]
    UnknownParent { template: String, parent: String },

    #[error("inheritance cycle between templates: {}", .templates.join(", "))]
    InheritanceCycle { templates: Vec<String> },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SchemaError {
    /// Returns `true` for errors caused by an inconsistent schema or template
    /// set, as opposed to I/O or parse failures.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SchemaError::DuplicateTopDocument { .. }
                | SchemaError::MissingSchemaEntry { .. }
                | SchemaError::DuplicateTemplate { .. }
                | SchemaError::UnknownParent { .. }
                | SchemaError::InheritanceCycle { .. }
        )
    }
}

/// Convenience alias for results using `SchemaError`.
pub type Result<T> = std::result::Result<T, SchemaError>;
