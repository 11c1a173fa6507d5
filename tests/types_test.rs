use docschema::types::*;

#[test]
fn test_type_ref_parse() {
    assert_eq!(TypeRef::parse("String"), TypeRef::Scalar("String".to_string()));
    assert_eq!(TypeRef::parse("Date"), TypeRef::Scalar("Date".to_string()));
    assert_eq!(
        TypeRef::parse("Customer"),
        TypeRef::Template("Customer".to_string())
    );
    assert_eq!(TypeRef::parse("Customer").template_name(), Some("Customer"));
    assert_eq!(TypeRef::parse("Number").template_name(), None);
}

#[test]
fn test_property_descriptor_serializes_as_type_and_of() {
    let json = serde_json::to_value(PropertyDescriptor::list_of("OrderLine")).unwrap();
    assert_eq!(json["type"], "Array");
    assert_eq!(json["of"], "OrderLine");
    assert_eq!(json["persist"], true);

    let single = serde_json::to_value(PropertyDescriptor::single("Customer").transient()).unwrap();
    assert_eq!(single["type"], "Customer");
    assert!(single.get("of").is_none());
    assert_eq!(single["persist"], false);
}

#[test]
fn test_placement_priority() {
    let both = SchemaDeclaration {
        document_of: Some("orders".to_string()),
        sub_document_of: Some("archive".to_string()),
        ..SchemaDeclaration::default()
    };
    assert_eq!(both.placement_or("Order"), "orders");
    assert_eq!(
        SchemaDeclaration::sub_document_of("orders").placement_or("OrderLine"),
        "orders"
    );
    assert_eq!(SchemaDeclaration::default().placement_or("Note"), "Note");
}

#[test]
fn test_storage_name_prefers_table() {
    let mut resolved = ResolvedTemplate {
        collection_name: "orders".to_string(),
        table_name: "tbl_order".to_string(),
        top_owner: None,
        parent_refs: Default::default(),
        child_refs: Default::default(),
    };
    assert_eq!(resolved.storage_name(), "tbl_order");
    resolved.table_name.clear();
    assert_eq!(resolved.storage_name(), "orders");
}

#[test]
fn test_reference_serializes_with_side_tag() {
    let reference = Reference::Child(RefSpec::from(&RelationDecl::cross_document()));
    let json = serde_json::to_value(&reference).unwrap();
    assert_eq!(json["side"], "child");
    assert_eq!(json["cross_document"], true);
    assert!(reference.is_cross_document());
}

#[test]
fn test_declaration_omits_empty_fields() {
    let json = serde_json::to_string(&SchemaDeclaration::document_of("orders")).unwrap();
    assert_eq!(json, r#"{"documentOf":"orders"}"#);
}
