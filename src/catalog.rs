use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::config::{load_config, DocSchemaConfig};
use crate::errors::{Result, SchemaError};
use crate::loader::{load_declarations, load_templates};
use crate::registry::TemplateRegistry;
use crate::resolution::{ReferenceClassifier, SchemaResolver};
use crate::types::*;

/// Owns a template registry together with the resolved schema currently in
/// effect.
///
/// `load` swaps in a complete new resolution under a write lock; readers
/// clone the current `Arc` and classify against it without holding the lock.
#[derive(Debug)]
pub struct SchemaCatalog {
    registry: TemplateRegistry,
    config: DocSchemaConfig,
    resolved: RwLock<Option<Arc<ResolvedSchemas>>>,
}

/// Summary of a successful schema load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// Number of entries in the declaration set.
    pub declared: usize,
    /// Number of templates that received resolved metadata.
    pub resolved: usize,
    /// Number of declared names the registry does not know.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl SchemaCatalog {
    pub fn new(registry: TemplateRegistry, config: DocSchemaConfig) -> Self {
        Self {
            registry,
            config,
            resolved: RwLock::new(None),
        }
    }

    /// Opens a project: reads its configuration, template definitions and
    /// schema declarations, and performs the initial load.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        let defs = load_templates(&config.templates_path(project_root))?;
        let declarations = load_declarations(&config.schema_path(project_root))?;

        let catalog = Self::new(TemplateRegistry::from_definitions(defs)?, config);
        catalog.load(&declarations)?;
        Ok(catalog)
    }

    /// Resolves `declarations` and makes the result current.
    ///
    /// When reference validation is enabled every persisted property is
    /// classified before the swap, so a dangling reference fails the load.
    /// On error the previously loaded schema stays in effect.
    pub fn load(&self, declarations: &SchemaDeclarations) -> Result<LoadResult> {
        let resolved = SchemaResolver::new(&self.registry).resolve(declarations)?;

        if self.config.validate_references {
            ReferenceClassifier::new(&self.registry, &resolved).validate_references()?;
        }

        let result = LoadResult {
            declared: declarations.len(),
            resolved: resolved.resolved_count(),
            skipped: declarations
                .keys()
                .filter(|name| self.registry.lookup_by_name(name).is_none())
                .count(),
        };

        let mut guard = self
            .resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(resolved));
        drop(guard);

        info!(
            declared = result.declared,
            resolved = result.resolved,
            skipped = result.skipped,
            "schema loaded"
        );
        Ok(result)
    }

    pub fn is_loaded(&self) -> bool {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl SchemaCatalog {
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DocSchemaConfig {
        &self.config
    }

    /// Returns the current resolution, or an empty one before the first
    /// successful load.
    pub fn snapshot(&self) -> Arc<ResolvedSchemas> {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    /// Looks up a template by name, failing with `NotFound`.
    pub fn template_id(&self, name: &str) -> Result<TemplateId> {
        self.registry
            .lookup_by_name(name)
            .ok_or_else(|| SchemaError::NotFound {
                kind: "template",
                name: name.to_string(),
            })
    }

    /// Resolved metadata for a template, if it has a schema entry.
    pub fn resolved(&self, name: &str) -> Result<Option<ResolvedTemplate>> {
        let id = self.template_id(name)?;
        Ok(self.snapshot().get(id).cloned())
    }

    /// Classifies a declared (own or inherited) property of a template.
    pub fn is_cross_document_reference(&self, template: &str, property: &str) -> Result<bool> {
        let id = self.template_id(template)?;
        let descriptor = self
            .registry
            .property(id, property)
            .ok_or_else(|| SchemaError::NotFound {
                kind: "property",
                name: format!("{}.{}", template, property),
            })?;

        let snapshot = self.snapshot();
        ReferenceClassifier::new(&self.registry, &snapshot)
            .is_cross_document_reference(id, property, descriptor)
    }

    /// Names of the cross-document properties of a template.
    pub fn cross_document_properties(&self, template: &str) -> Result<Vec<String>> {
        let id = self.template_id(template)?;
        let snapshot = self.snapshot();
        ReferenceClassifier::new(&self.registry, &snapshot).cross_document_properties(id)
    }
}
