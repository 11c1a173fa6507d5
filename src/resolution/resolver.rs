use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::errors::{Result, SchemaError};
use crate::registry::TemplateRegistry;
use crate::types::*;

/// Computes per-template storage metadata from a set of schema declarations.
///
/// A resolver run is a pure function of the registry and the declarations:
/// it never mutates templates and returns a fresh `ResolvedSchemas` or the
/// first configuration error it finds.
pub struct SchemaResolver<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Resolves every declaration whose name is known to the registry.
    ///
    /// Runs three passes in order:
    /// 1. **Collection ownership** -- maps each `documentOf` collection to the
    ///    inheritance root of its declaring template.
    /// 2. **Top-owner linking** -- points each `subDocumentOf` template at the
    ///    root recorded for its collection.
    /// 3. **Merge** -- computes collection and table names and merges
    ///    reference maps down the inheritance chain.
    ///
    /// Names the registry does not know are skipped.
    pub fn resolve(&self, declarations: &SchemaDeclarations) -> Result<ResolvedSchemas> {
        let known: Vec<(TemplateId, &SchemaDeclaration)> = declarations
            .iter()
            .filter_map(|(name, decl)| match self.registry.lookup_by_name(name) {
                Some(id) => Some((id, decl)),
                None => {
                    debug!(template = %name, "skipping schema entry for unloaded template");
                    None
                }
            })
            .collect();

        let by_id: HashMap<TemplateId, &SchemaDeclaration> = known.iter().copied().collect();

        let collections = self.collection_owners(&known)?;
        let top_owners = self.link_top_owners(&known, &collections);

        let mut resolved = ResolvedSchemas::with_capacity(self.registry.len());
        for (id, decl) in &known {
            let top_owner = top_owners.get(id).copied().flatten();
            resolved.set(*id, self.merge(*id, decl, top_owner, &by_id));
        }

        debug!(
            declared = declarations.len(),
            resolved = resolved.resolved_count(),
            collections = collections.len(),
            "schema resolution complete"
        );
        Ok(resolved)
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    /// Pass 1: collection name to the root template that owns it.
    fn collection_owners(
        &self,
        known: &[(TemplateId, &SchemaDeclaration)],
    ) -> Result<BTreeMap<String, TemplateId>> {
        let mut collections: BTreeMap<String, TemplateId> = BTreeMap::new();

        for (id, decl) in known {
            let Some(collection) = &decl.document_of else {
                continue;
            };
            if decl.sub_document_of.is_some() {
                warn!(
                    template = %self.registry.name(*id),
                    collection = %collection,
                    "template declares both documentOf and subDocumentOf; documentOf wins"
                );
            }

            let root = self.registry.base_class(*id);
            if let Some(existing) = collections.get(collection) {
                if *existing != root {
                    return Err(SchemaError::DuplicateTopDocument {
                        collection: collection.clone(),
                        first: self.registry.name(*existing).to_string(),
                        second: self.registry.name(*id).to_string(),
                    });
                }
            }
            collections.insert(collection.clone(), root);
        }

        debug!(count = collections.len(), "collection owners recorded");
        Ok(collections)
    }

    /// Pass 2: top owner for every sub-document declaration. The value is
    /// `None` when no template is the top document of the collection.
    fn link_top_owners(
        &self,
        known: &[(TemplateId, &SchemaDeclaration)],
        collections: &BTreeMap<String, TemplateId>,
    ) -> HashMap<TemplateId, Option<TemplateId>> {
        let mut owners = HashMap::new();

        for (id, decl) in known {
            let Some(collection) = &decl.sub_document_of else {
                continue;
            };
            let owner = collections.get(collection).copied();
            if owner.is_none() {
                debug!(
                    template = %self.registry.name(*id),
                    collection = %collection,
                    "no top document declared for collection"
                );
            }
            owners.insert(*id, owner);
        }
        owners
    }

    /// Pass 3: derived names and inherited reference maps for one template.
    fn merge(
        &self,
        id: TemplateId,
        decl: &SchemaDeclaration,
        top_owner: Option<TemplateId>,
        by_id: &HashMap<TemplateId, &SchemaDeclaration>,
    ) -> ResolvedTemplate {
        let name = self.registry.name(id);
        let collection_name = decl.placement_or(name).to_string();

        let mut child_refs: BTreeMap<String, Reference> = decl
            .children
            .iter()
            .map(|(prop, rel)| (prop.clone(), Reference::Child(rel.into())))
            .collect();
        let mut parent_refs: BTreeMap<String, Reference> = decl
            .parents
            .iter()
            .map(|(prop, rel)| (prop.clone(), Reference::Parent(rel.into())))
            .collect();

        let mut default_table = collection_name.clone();
        let mut inherited_table: Option<&str> = None;

        for ancestor in self.registry.ancestors(id) {
            let Some(ancestor_decl) = by_id.get(&ancestor) else {
                continue;
            };

            for (prop, rel) in &ancestor_decl.children {
                child_refs
                    .entry(prop.clone())
                    .or_insert_with(|| Reference::Child(rel.into()));
            }
            for (prop, rel) in &ancestor_decl.parents {
                parent_refs
                    .entry(prop.clone())
                    .or_insert_with(|| Reference::Parent(rel.into()));
            }

            // The farthest declaring ancestor decides the default table.
            default_table = ancestor_decl
                .placement_or(self.registry.name(ancestor))
                .to_string();

            if inherited_table.is_none() {
                inherited_table = ancestor_decl.table.as_deref();
            }
        }

        let table_name = decl
            .table
            .as_deref()
            .or(inherited_table)
            .map(str::to_string)
            .unwrap_or(default_table);

        ResolvedTemplate {
            collection_name,
            table_name,
            top_owner,
            parent_refs,
            child_refs,
        }
    }
}
