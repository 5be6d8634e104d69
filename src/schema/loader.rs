//! Schema loading
//!
//! Builds a [`Schema`] from its document form under the fixed grammar.
//! Any failure aborts the whole load; the entry points wrap the cause in
//! a single contextual error and never return a partial model.

use crate::document::{self, Node};
use crate::error::{Error, Result};
use crate::schema::grammar::{attrs, nodes, parse_occurrence, STRUCT_VALUE_MODES};
use crate::schema::{
    AttributeDataType, AttributeDef, AttributeTarget, ElementContent, ElementId, EnumTypeDef,
    Schema, ScopeId, StructValue, StructValueType, UnorderedContent,
};

/// Load a schema from its text form
pub fn load_schema(text: &str) -> Result<Schema> {
    document::parse(text)
        .and_then(|root| build_schema(&root))
        .map_err(|e| e.into_load_context("schema"))
}

/// Build a schema from an already parsed document tree
pub fn schema_from_node(root: &Node) -> Result<Schema> {
    build_schema(root).map_err(|e| e.into_load_context("schema"))
}

fn build_schema(root: &Node) -> Result<Schema> {
    root.assert_name(nodes::SCHEMA)?;
    root.assert_attribute_names(&[attrs::ROOT_ELEMENT])?;
    let mut schema = Schema::new();
    let scope = schema.root_scope();
    load_definitions(&mut schema, scope, root)?;

    if let Some(designation) = root.optional_attribute(attrs::ROOT_ELEMENT)? {
        designation.assert_value_count(1)?;
        let name = designation.string(0)?;
        let element = schema.lookup_element(scope, name).ok_or_else(|| {
            Error::RootUndefined(format!("designated root element '{}' is not defined", name))
        })?;
        schema.set_root_element(element);
    }
    schema.resolve_root_element()?;
    Ok(schema)
}

/// Load the four definition kinds of a Schema or Definitions node into a
/// scope, in document order
fn load_definitions(schema: &mut Schema, scope: ScopeId, node: &Node) -> Result<()> {
    node.assert_child_names(&[
        nodes::ENUM_TYPE,
        nodes::STRUCT,
        nodes::ATTRIBUTE,
        nodes::ELEMENT,
    ])?;
    for child in &node.children {
        match child.name() {
            nodes::ENUM_TYPE => load_enum_type(schema, scope, child)?,
            nodes::STRUCT => load_struct(schema, scope, child)?,
            nodes::ATTRIBUTE => load_attribute(schema, scope, child)?,
            nodes::ELEMENT => {
                load_element(schema, scope, child)?;
            }
            other => {
                return Err(Error::Grammar(format!(
                    "unexpected child '{}' on node '{}'",
                    other,
                    node.name()
                )))
            }
        }
    }
    Ok(())
}

fn load_enum_type(schema: &mut Schema, scope: ScopeId, node: &Node) -> Result<()> {
    node.assert_no_children()?;
    node.assert_attribute_names(&[attrs::NAME, attrs::VALUES])?;
    let name = single_value(node, attrs::NAME)?;
    let values = node.required_attribute(attrs::VALUES)?;
    values.assert_value_count_range(1, None)?;
    let def = EnumTypeDef::new(name, values.strings().to_vec())?;
    schema.add_enum_type(scope, def)?;
    Ok(())
}

fn load_struct(schema: &mut Schema, scope: ScopeId, node: &Node) -> Result<()> {
    node.assert_no_children()?;
    node.assert_attribute_names(&[attrs::NAME, attrs::VALUE])?;
    let name = single_value(node, attrs::NAME)?;
    let id = schema.declare_struct(scope, &name)?;
    for value in node.attributes_named(attrs::VALUE) {
        value.assert_value_count(3)?;
        let value_name = value.string(0)?.to_string();
        let optional = value.enum_index(&STRUCT_VALUE_MODES, 1)? == 1;
        let (value_type, nullable) = StructValueType::parse(value.string(2)?, schema, scope)?;
        schema
            .struct_def_mut(id)
            .add_value(StructValue::new(value_name, optional, value_type, nullable))?;
    }
    Ok(())
}

fn load_attribute(schema: &mut Schema, scope: ScopeId, node: &Node) -> Result<()> {
    node.assert_no_children()?;
    node.assert_attribute_names(&[attrs::NAME, attrs::DATA_TYPE])?;
    let name = single_value(node, attrs::NAME)?;
    let id = schema.declare_attribute(scope, &name)?;
    let text = single_value(node, attrs::DATA_TYPE)?;
    let data_type = AttributeDataType::parse(&text, schema, scope)?;
    schema.attribute_mut(id).set_data_type(data_type)?;
    Ok(())
}

/// Load one element declaration
///
/// The element is registered before its content is parsed, so content
/// entries may reference the element itself or anything declared earlier.
fn load_element(schema: &mut Schema, scope: ScopeId, node: &Node) -> Result<ElementId> {
    node.assert_child_names(&[
        nodes::DEFINITIONS,
        nodes::UNORDERED_CONTENT,
        nodes::LIST_CONTENT,
    ])?;
    node.assert_attribute_names(&[attrs::NAME])?;
    let name = single_value(node, attrs::NAME)?;
    let id = schema.declare_element(scope, &name)?;
    let element_scope = schema.element(id).scope();

    if let Some(defs_node) = node.optional_child(nodes::DEFINITIONS)? {
        defs_node.assert_no_attributes()?;
        load_definitions(schema, element_scope, defs_node)?;
    }

    let unordered = node.optional_child(nodes::UNORDERED_CONTENT)?;
    let list = node.optional_child(nodes::LIST_CONTENT)?;
    let content = match (unordered, list) {
        (Some(_), Some(_)) => {
            return Err(Error::Grammar(format!(
                "element '{}' must declare exactly one content model",
                name
            )))
        }
        (None, None) => {
            return Err(Error::Grammar(format!(
                "element '{}' must declare a content model",
                name
            )))
        }
        (None, Some(_)) => {
            return Err(Error::Unsupported("list content is not implemented".to_string()))
        }
        (Some(content_node), None) => load_unordered_content(schema, element_scope, content_node)?,
    };
    schema
        .element_mut(id)
        .set_content(ElementContent::Unordered(content))?;
    Ok(id)
}

fn load_unordered_content(
    schema: &mut Schema,
    scope: ScopeId,
    node: &Node,
) -> Result<UnorderedContent> {
    node.assert_no_children()?;
    node.assert_attribute_names(&[attrs::ELEMENT, attrs::ATTRIBUTE])?;
    let mut content = UnorderedContent::new();

    for entry in node.attributes_named(attrs::ELEMENT) {
        entry.assert_value_count(2)?;
        let child_name = entry.string(0)?;
        let occurs = parse_occurrence(entry, 1)?;
        let element = schema.get_element(scope, child_name)?;
        content.add_element_entry(child_name, element, occurs)?;
    }

    for entry in node.attributes_named(attrs::ATTRIBUTE) {
        entry.assert_value_count_range(2, Some(3))?;
        let attr_name = entry.string(0)?;
        let occurs = parse_occurrence(entry, 1)?;
        let target = if entry.value_count() == 2 {
            AttributeTarget::Declared(schema.get_attribute(scope, attr_name)?)
        } else {
            let data_type = AttributeDataType::parse(entry.string(2)?, schema, scope)?;
            let mut def = AttributeDef::new(attr_name);
            def.set_data_type(data_type)?;
            AttributeTarget::Inline(schema.add_inline_attribute(def))
        };
        content.add_attribute_entry(attr_name, target, occurs)?;
    }

    Ok(content)
}

fn single_value(node: &Node, name: &str) -> Result<String> {
    let attribute = node.required_attribute(name)?;
    attribute.assert_value_count(1)?;
    Ok(attribute.string(0)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBaseType, PredefinedType, ValueTypeDef};

    const PERSON_SCHEMA: &str = "\
Schema RootElement=Person
  EnumType Name=Color Values=Red,Green,Blue
  Struct Name=Point Value=x,Required,number Value=color,Optional,Color
  Attribute Name=Name DataType=string
  Element Name=Person
    UnorderedContent Attribute=Name,Required Attribute=Age,Optional,int
";

    fn unwrap_load(err: Error) -> Error {
        match err {
            Error::Load { source, .. } => *source,
            other => other,
        }
    }

    fn load_err(text: &str) -> Error {
        unwrap_load(load_schema(text).unwrap_err())
    }

    #[test]
    fn test_load_person_schema() {
        let schema = load_schema(PERSON_SCHEMA).unwrap();
        let root = schema.root_scope();

        let color = schema.get_value_type(root, "Color").unwrap();
        let ValueTypeDef::Enum(def) = schema.value_type(color);
        assert_eq!(def.values(), &["Red", "Green", "Blue"]);

        let point = schema.get_struct(root, "Point").unwrap();
        let values = schema.struct_def(point).values();
        assert_eq!(values.len(), 2);
        assert!(!values[0].is_optional());
        assert!(values[1].is_optional());
        assert_eq!(values[1].value_type(), StructValueType::Value(color));

        let person = schema.get_element(root, "Person").unwrap();
        assert_eq!(schema.resolve_root_element().unwrap(), person);
        let content = match schema.element(person).content() {
            Some(ElementContent::Unordered(content)) => content,
            other => panic!("expected unordered content, got {:?}", other),
        };
        assert_eq!(content.attribute_count(), 2);
        let entries: Vec<_> = content.attribute_entries().collect();
        assert_eq!(entries[0].0, "Name");
        assert!(entries[0].1.occurs.is_required());
        assert!(matches!(entries[0].1.target, AttributeTarget::Declared(_)));
        assert_eq!(entries[1].0, "Age");
        assert!(entries[1].1.occurs.is_optional());
        match entries[1].1.target {
            AttributeTarget::Inline(id) => {
                let data_type = schema.attribute(id).data_type().unwrap();
                assert_eq!(
                    data_type.base(),
                    AttributeBaseType::Predefined(PredefinedType::Int)
                );
            }
            other => panic!("expected inline attribute, got {:?}", other),
        }
    }

    #[test]
    fn test_element_may_reference_itself() {
        let text = "\
Schema
  Element Name=Tree
    UnorderedContent Element=Tree,Repeated*
";
        let schema = load_schema(text).unwrap();
        let tree = schema.get_element(schema.root_scope(), "Tree").unwrap();
        let content = match schema.element(tree).content() {
            Some(ElementContent::Unordered(content)) => content,
            other => panic!("expected unordered content, got {:?}", other),
        };
        let (_, entry) = content.element_entries().next().unwrap();
        assert_eq!(entry.element, tree);
    }

    #[test]
    fn test_forward_reference_to_later_sibling_fails() {
        let text = "\
Schema RootElement=A
  Element Name=A
    UnorderedContent Element=B,Required
  Element Name=B
    UnorderedContent Attribute=X,Required,int
";
        let err = load_err(text);
        assert!(matches!(err, Error::NotDefined { kind: "element", .. }));
    }

    #[test]
    fn test_nested_definitions_are_scoped() {
        let text = "\
Schema RootElement=Outer
  Element Name=Outer
    Definitions
      EnumType Name=Mode Values=On,Off
      Element Name=Inner
        UnorderedContent Attribute=Mode,Required,Mode
    UnorderedContent Element=Inner,Repeated+
";
        let schema = load_schema(text).unwrap();
        let root = schema.root_scope();
        let outer = schema.get_element(root, "Outer").unwrap();
        let nested = schema.element(outer).scope();
        assert!(schema.lookup_value_type(root, "Mode").is_none());
        assert!(schema.lookup_value_type(nested, "Mode").is_some());
        assert!(schema.lookup_element(root, "Inner").is_none());
        assert!(schema.lookup_element(nested, "Inner").is_some());
    }

    #[test]
    fn test_wraps_errors_with_load_context() {
        let err = load_schema("Wrong\n").unwrap_err();
        match err {
            Error::Load { context, source } => {
                assert_eq!(context, "schema");
                assert!(matches!(*source, Error::Grammar(_)));
            }
            other => panic!("expected Load, got {:?}", other),
        }
    }

    #[test]
    fn test_root_resolution_failures() {
        assert!(matches!(
            load_err("Schema\n  EnumType Name=E Values=A\n"),
            Error::RootUndefined(_)
        ));

        let two = "\
Schema
  Element Name=A
    UnorderedContent Attribute=X,Required,int
  Element Name=B
    UnorderedContent Attribute=X,Required,int
";
        assert!(matches!(load_err(two), Error::RootAmbiguous(_)));

        let missing = "\
Schema RootElement=Nope
  Element Name=A
    UnorderedContent Attribute=X,Required,int
";
        assert!(matches!(load_err(missing), Error::RootUndefined(_)));
    }

    #[test]
    fn test_list_content_is_unsupported() {
        let text = "\
Schema
  Element Name=Names
    ListContent
";
        assert!(matches!(load_err(text), Error::Unsupported(_)));
    }

    #[test]
    fn test_content_model_must_be_exactly_one() {
        let none = "\
Schema
  Element Name=A
";
        assert!(matches!(load_err(none), Error::Grammar(_)));

        let both = "\
Schema
  Element Name=A
    UnorderedContent Attribute=X,Required,int
    ListContent
";
        assert!(matches!(load_err(both), Error::Grammar(_)));
    }

    #[test]
    fn test_grammar_violations() {
        assert!(matches!(
            load_err("Schema\n  Widget Name=X\n"),
            Error::Grammar(_)
        ));
        assert!(matches!(
            load_err("Schema Extra=1\n"),
            Error::Grammar(_)
        ));
        assert!(matches!(
            load_err("Schema\n  EnumType Values=A\n"),
            Error::Grammar(_)
        ));
        assert!(matches!(
            load_err("Schema\n  Struct Name=S Value=x,Required\n"),
            Error::Grammar(_)
        ));
        assert!(matches!(
            load_err("Schema\n  Struct Name=S Value=x,Sometimes,int\n"),
            Error::Grammar(_)
        ));
    }

    #[test]
    fn test_undefined_references() {
        let attr = "\
Schema
  Element Name=A
    UnorderedContent Attribute=Nope,Required
";
        assert!(matches!(
            load_err(attr),
            Error::NotDefined {
                kind: "attribute",
                ..
            }
        ));

        let ty = "\
Schema
  Struct Name=S Value=x,Required,Missing
";
        assert!(matches!(load_err(ty), Error::NotDefined { kind: "type", .. }));
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let text = "\
Schema
  EnumType Name=E Values=A
  EnumType Name=E Values=B
";
        assert!(matches!(load_err(text), Error::AlreadyDefined { .. }));

        let entries = "\
Schema
  Attribute Name=X DataType=int
  Element Name=A
    UnorderedContent Attribute=X,Required Attribute=X,Optional
";
        assert!(matches!(load_err(entries), Error::AlreadyDefined { .. }));
    }
}
