use crate::errors::{Result, SchemaError};
use crate::registry::TemplateRegistry;
use crate::types::*;

/// Decides whether a property's reference leaves the stored document of the
/// template that declares it.
///
/// Reads resolved metadata only; any number of classifiers may share the
/// same `ResolvedSchemas`.
pub struct ReferenceClassifier<'a> {
    registry: &'a TemplateRegistry,
    resolved: &'a ResolvedSchemas,
}

impl<'a> ReferenceClassifier<'a> {
    pub fn new(registry: &'a TemplateRegistry, resolved: &'a ResolvedSchemas) -> Self {
        Self { registry, resolved }
    }

    /// Returns `true` when `property` on `template` refers to a template
    /// stored in a different collection, or when the schema marks the
    /// relationship `crossDocument`.
    ///
    /// Templates without resolved metadata are never persisted, so every
    /// property on them classifies as `false`. A persisted property that
    /// refers to a template without a schema entry is an error.
    pub fn is_cross_document_reference(
        &self,
        template: TemplateId,
        property: &str,
        descriptor: &PropertyDescriptor,
    ) -> Result<bool> {
        let Some(owner) = self.resolved.get(template) else {
            return Ok(false);
        };

        let Some(target_name) = descriptor.value.referenced().template_name() else {
            return Ok(false);
        };

        let target = self
            .registry
            .lookup_by_name(target_name)
            .and_then(|id| self.resolved.get(id));

        let Some(target) = target else {
            if descriptor.persist {
                return Err(SchemaError::MissingSchemaEntry {
                    template: self.registry.name(template).to_string(),
                    property: property.to_string(),
                    referenced: target_name.to_string(),
                });
            }
            return Ok(false);
        };

        if target.storage_name() != owner.storage_name() {
            return Ok(true);
        }

        let declared = match &descriptor.value {
            PropertyValue::List(_) => owner.child_refs.get(property),
            PropertyValue::Single(_) => owner.parent_refs.get(property),
        };
        Ok(declared.is_some_and(Reference::is_cross_document))
    }

    /// Names of the properties of `template` (own and inherited) that are
    /// cross-document references, in sorted order.
    pub fn cross_document_properties(&self, template: TemplateId) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for (name, descriptor) in self.registry.properties(template) {
            if self.is_cross_document_reference(template, &name, &descriptor)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Classifies every property of every resolved template, returning the
    /// first dangling reference to an unmapped template.
    pub fn validate_references(&self) -> Result<()> {
        for (id, _) in self.resolved.iter() {
            for (name, descriptor) in self.registry.properties(id) {
                self.is_cross_document_reference(id, &name, &descriptor)?;
            }
        }
        Ok(())
    }
}
