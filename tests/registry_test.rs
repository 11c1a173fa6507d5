use docschema::errors::SchemaError;
use docschema::registry::TemplateRegistry;
use docschema::types::*;

#[test]
fn test_register_and_lookup() {
    let mut registry = TemplateRegistry::new();
    let base = registry.register(TemplateDef::new("Base")).unwrap();
    let child = registry
        .register(TemplateDef::new("Child").extends("Base"))
        .unwrap();

    assert_eq!(registry.lookup_by_name("Base"), Some(base));
    assert_eq!(registry.lookup_by_name("Child"), Some(child));
    assert_eq!(registry.lookup_by_name("Missing"), None);
    assert_eq!(registry.parent(child), Some(base));
    assert_eq!(registry.name(child), "Child");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_register_requires_known_parent() {
    let mut registry = TemplateRegistry::new();
    let err = registry
        .register(TemplateDef::new("Child").extends("Base"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownParent { .. }));
    assert!(registry.is_empty());
}

#[test]
fn test_register_rejects_duplicate_names() {
    let mut registry = TemplateRegistry::new();
    registry.register(TemplateDef::new("Base")).unwrap();
    let err = registry.register(TemplateDef::new("Base")).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateTemplate { ref name } if name == "Base"));
}

#[test]
fn test_ancestors_and_base_class() {
    let registry = TemplateRegistry::from_definitions(vec![
        TemplateDef::new("C").extends("B"),
        TemplateDef::new("B").extends("A"),
        TemplateDef::new("A"),
    ])
    .unwrap();

    let a = registry.lookup_by_name("A").unwrap();
    let b = registry.lookup_by_name("B").unwrap();
    let c = registry.lookup_by_name("C").unwrap();

    assert_eq!(registry.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
    assert_eq!(registry.ancestors(a).count(), 0);
    assert_eq!(registry.base_class(c), a);
    assert_eq!(registry.base_class(a), a);
}

#[test]
fn test_from_definitions_detects_cycle() {
    let err = TemplateRegistry::from_definitions(vec![
        TemplateDef::new("A").extends("B"),
        TemplateDef::new("B").extends("A"),
    ])
    .unwrap_err();
    match err {
        SchemaError::InheritanceCycle { templates } => {
            assert_eq!(templates, vec!["A".to_string(), "B".to_string()]);
        }
        other => panic!("expected InheritanceCycle, got {:?}", other),
    }
}

#[test]
fn test_from_definitions_detects_missing_parent() {
    let err = TemplateRegistry::from_definitions(vec![
        TemplateDef::new("A"),
        TemplateDef::new("B").extends("Ghost"),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::UnknownParent { ref parent, .. } if parent == "Ghost"
    ));
}

#[test]
fn test_properties_merge_with_own_declarations_winning() {
    let registry = TemplateRegistry::from_definitions(vec![
        TemplateDef::new("Base")
            .property("owner", PropertyDescriptor::single("Account"))
            .property("tags", PropertyDescriptor::list_of("String")),
        TemplateDef::new("Child")
            .extends("Base")
            .property("owner", PropertyDescriptor::single("Customer")),
    ])
    .unwrap();

    let child = registry.lookup_by_name("Child").unwrap();
    let props = registry.properties(child);
    assert_eq!(props.len(), 2);
    assert_eq!(
        props["owner"].value,
        PropertyValue::Single(TypeRef::Template("Customer".to_string()))
    );
    assert_eq!(
        registry.property(child, "tags").unwrap().value,
        PropertyValue::List(TypeRef::Scalar("String".to_string()))
    );
    assert!(registry.property(child, "missing").is_none());
}
