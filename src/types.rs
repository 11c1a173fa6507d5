use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type names treated as scalar values rather than references to templates.
pub const SCALAR_TYPES: &[&str] = &[
    "String", "Number", "Boolean", "Date", "Object", "Array", "Function",
];

/// Stable handle to a template inside a `TemplateRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub usize);

impl TemplateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The declared type of a property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Scalar(String),
    Template(String),
}

impl TypeRef {
    /// Classifies a declared type name: builtin scalar names become
    /// `Scalar`, everything else names a template.
    pub fn parse(name: &str) -> TypeRef {
        if SCALAR_TYPES.contains(&name) {
            TypeRef::Scalar(name.to_string())
        } else {
            TypeRef::Template(name.to_string())
        }
    }

    /// Returns the referenced template name, if this is a template reference.
    pub fn template_name(&self) -> Option<&str> {
        match self {
            TypeRef::Template(name) => Some(name),
            TypeRef::Scalar(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeRef::Scalar(name) | TypeRef::Template(name) => name,
        }
    }
}

/// Shape of a property: a single value (parent-style reference) or a list
/// of values (child-style collection reference).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Single(TypeRef),
    List(TypeRef),
}

impl PropertyValue {
    /// The type the property refers to: the element type for lists, the
    /// declared type otherwise.
    pub fn referenced(&self) -> &TypeRef {
        match self {
            PropertyValue::Single(t) | PropertyValue::List(t) => t,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, PropertyValue::List(_))
    }
}

/// A property declared on a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProperty", into = "RawProperty")]
pub struct PropertyDescriptor {
    pub value: PropertyValue,
    /// `false` for transient properties that are never persisted.
    pub persist: bool,
}

impl PropertyDescriptor {
    /// A persisted single-valued property of the given type.
    pub fn single(type_name: &str) -> Self {
        Self {
            value: PropertyValue::Single(TypeRef::parse(type_name)),
            persist: true,
        }
    }

    /// A persisted list property whose elements have the given type.
    pub fn list_of(type_name: &str) -> Self {
        Self {
            value: PropertyValue::List(TypeRef::parse(type_name)),
            persist: true,
        }
    }

    pub fn transient(mut self) -> Self {
        self.persist = false;
        self
    }
}

/// On-disk form of a property: `{"type": "Array", "of": "OrderLine"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawProperty {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    of: Option<String>,
    #[serde(default = "default_persist")]
    persist: bool,
}

fn default_persist() -> bool {
    true
}

impl From<RawProperty> for PropertyDescriptor {
    fn from(raw: RawProperty) -> Self {
        let value = match raw.of {
            Some(of) => PropertyValue::List(TypeRef::parse(&of)),
            None => PropertyValue::Single(TypeRef::parse(&raw.type_name)),
        };
        Self {
            value,
            persist: raw.persist,
        }
    }
}

impl From<PropertyDescriptor> for RawProperty {
    fn from(desc: PropertyDescriptor) -> Self {
        let (type_name, of) = match desc.value {
            PropertyValue::Single(t) => (t.as_str().to_string(), None),
            PropertyValue::List(t) => ("Array".to_string(), Some(t.as_str().to_string())),
        };
        Self {
            type_name,
            of,
            persist: desc.persist,
        }
    }
}

/// Definition of a template as supplied to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDescriptor>,
}

impl TemplateDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extends: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.extends = Some(parent.to_string());
        self
    }

    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.to_string(), descriptor);
        self
    }
}

/// A registered template: a node in the single-inheritance tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub parent: Option<TemplateId>,
    pub properties: BTreeMap<String, PropertyDescriptor>,
}

/// A relationship declared in a schema entry's `children` or `parents` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDecl {
    /// Template on the other end of the relationship, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Foreign-key column used by table-backed drivers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub cross_document: bool,
}

impl RelationDecl {
    pub fn cross_document() -> Self {
        Self {
            cross_document: true,
            ..Self::default()
        }
    }
}

/// Schema entry for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_document_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, RelationDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parents: BTreeMap<String, RelationDecl>,
}

impl SchemaDeclaration {
    pub fn document_of(collection: &str) -> Self {
        Self {
            document_of: Some(collection.to_string()),
            ..Self::default()
        }
    }

    pub fn sub_document_of(collection: &str) -> Self {
        Self {
            sub_document_of: Some(collection.to_string()),
            ..Self::default()
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn with_child(mut self, property: &str, relation: RelationDecl) -> Self {
        self.children.insert(property.to_string(), relation);
        self
    }

    pub fn with_parent(mut self, property: &str, relation: RelationDecl) -> Self {
        self.parents.insert(property.to_string(), relation);
        self
    }

    /// `documentOf`, else `subDocumentOf`, else the given fallback name.
    pub fn placement_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.document_of
            .as_deref()
            .or(self.sub_document_of.as_deref())
            .unwrap_or(fallback)
    }
}

/// Full schema: template name to declaration.
pub type SchemaDeclarations = BTreeMap<String, SchemaDeclaration>;

/// Attributes of a resolved relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    pub target: Option<String>,
    pub foreign_key: Option<String>,
    pub cross_document: bool,
}

impl From<&RelationDecl> for RefSpec {
    fn from(decl: &RelationDecl) -> Self {
        Self {
            target: decl.target.clone(),
            foreign_key: decl.id.clone(),
            cross_document: decl.cross_document,
        }
    }
}

/// A relationship merged into a template's reference maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum Reference {
    Parent(RefSpec),
    Child(RefSpec),
}

impl Reference {
    pub fn spec(&self) -> &RefSpec {
        match self {
            Reference::Parent(spec) | Reference::Child(spec) => spec,
        }
    }

    pub fn is_cross_document(&self) -> bool {
        self.spec().cross_document
    }
}

/// Metadata derived for a template with a schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTemplate {
    pub collection_name: String,
    pub table_name: String,
    pub top_owner: Option<TemplateId>,
    pub parent_refs: BTreeMap<String, Reference>,
    pub child_refs: BTreeMap<String, Reference>,
}

impl ResolvedTemplate {
    /// Name of the physical storage grouping: the table name when present,
    /// the collection name otherwise.
    pub fn storage_name(&self) -> &str {
        if self.table_name.is_empty() {
            &self.collection_name
        } else {
            &self.table_name
        }
    }
}

/// Result of one resolver run, indexed by `TemplateId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchemas {
    entries: Vec<Option<ResolvedTemplate>>,
}

impl ResolvedSchemas {
    /// Creates an empty result sized for `template_count` templates.
    pub fn with_capacity(template_count: usize) -> Self {
        Self {
            entries: vec![None; template_count],
        }
    }

    pub fn get(&self, id: TemplateId) -> Option<&ResolvedTemplate> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn set(&mut self, id: TemplateId, resolved: ResolvedTemplate) {
        if id.index() >= self.entries.len() {
            self.entries.resize(id.index() + 1, None);
        }
        self.entries[id.index()] = Some(resolved);
    }

    /// Iterates over every template that has resolved metadata.
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &ResolvedTemplate)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|r| (TemplateId(i), r)))
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}
