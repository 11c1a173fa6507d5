use std::collections::{BTreeMap, HashMap};

use crate::errors::{Result, SchemaError};
use crate::types::*;

/// Owns the set of templates known to a schema instance.
///
/// Templates are stored in an arena and addressed by `TemplateId`. A
/// template's parent must be registered before the template itself, so the
/// parent links always form a forest.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
    by_name: HashMap<String, TemplateId>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from definitions in any order, registering parents
    /// before their subclasses.
    pub fn from_definitions(defs: Vec<TemplateDef>) -> Result<Self> {
        let mut registry = Self::new();
        let mut pending: BTreeMap<String, TemplateDef> = BTreeMap::new();

        for def in defs {
            if pending.contains_key(&def.name) {
                return Err(SchemaError::DuplicateTemplate { name: def.name });
            }
            pending.insert(def.name.clone(), def);
        }

        while !pending.is_empty() {
            let ready: Vec<String> = pending
                .values()
                .filter(|def| match &def.extends {
                    None => true,
                    Some(parent) => registry.by_name.contains_key(parent),
                })
                .map(|def| def.name.clone())
                .collect();

            if ready.is_empty() {
                return Err(stalled_error(&pending));
            }

            for name in ready {
                if let Some(def) = pending.remove(&name) {
                    registry.register(def)?;
                }
            }
        }

        Ok(registry)
    }

    /// Registers a single template. Its parent, if any, must already exist.
    pub fn register(&mut self, def: TemplateDef) -> Result<TemplateId> {
        if self.by_name.contains_key(&def.name) {
            return Err(SchemaError::DuplicateTemplate { name: def.name });
        }

        let parent = match &def.extends {
            None => None,
            Some(parent) => match self.by_name.get(parent) {
                Some(id) => Some(*id),
                None => {
                    return Err(SchemaError::UnknownParent {
                        template: def.name,
                        parent: parent.clone(),
                    })
                }
            },
        };

        let id = TemplateId(self.templates.len());
        self.by_name.insert(def.name.clone(), id);
        self.templates.push(Template {
            id,
            name: def.name,
            parent,
            properties: def.properties,
        });
        Ok(id)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(id.index())
    }

    /// Returns the template's name, or an empty string for a foreign id.
    pub fn name(&self, id: TemplateId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or_default()
    }

    pub fn parent(&self, id: TemplateId) -> Option<TemplateId> {
        self.get(id).and_then(|t| t.parent)
    }

    /// Iterates over the ancestors of `id`, nearest first. The template
    /// itself is not included.
    pub fn ancestors(&self, id: TemplateId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: self.parent(id),
        }
    }

    /// Returns the root of the inheritance chain containing `id`.
    pub fn base_class(&self, id: TemplateId) -> TemplateId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Returns every property visible on a template: its own declarations
    /// plus those inherited from ancestors. Own declarations win.
    pub fn properties(&self, id: TemplateId) -> BTreeMap<String, PropertyDescriptor> {
        let mut merged = self
            .get(id)
            .map(|t| t.properties.clone())
            .unwrap_or_default();

        for ancestor in self.ancestors(id) {
            if let Some(template) = self.get(ancestor) {
                for (name, desc) in &template.properties {
                    merged
                        .entry(name.clone())
                        .or_insert_with(|| desc.clone());
                }
            }
        }
        merged
    }

    /// Finds a property on a template or its ancestors.
    pub fn property(&self, id: TemplateId, name: &str) -> Option<&PropertyDescriptor> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|t| self.get(t))
            .find_map(|t| t.properties.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Iterator over a template's ancestors, nearest first.
pub struct Ancestors<'a> {
    registry: &'a TemplateRegistry,
    next: Option<TemplateId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TemplateId;

    fn next(&mut self) -> Option<TemplateId> {
        let current = self.next?;
        self.next = self.registry.parent(current);
        Some(current)
    }
}

/// Explains why no pending definition could be registered: either a parent
/// that is neither registered nor pending, or a cycle among the pending ones.
fn stalled_error(pending: &BTreeMap<String, TemplateDef>) -> SchemaError {
    for def in pending.values() {
        if let Some(parent) = &def.extends {
            if !pending.contains_key(parent) {
                return SchemaError::UnknownParent {
                    template: def.name.clone(),
                    parent: parent.clone(),
                };
            }
        }
    }

    SchemaError::InheritanceCycle {
        templates: pending.keys().cloned().collect(),
    }
}
