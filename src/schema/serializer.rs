//! Schema serialization
//!
//! Renders a [`Schema`] back to its document form. The output is
//! canonical: definitions are grouped by kind in declaration order, and a
//! RootElement designation is written only when more than one top-level
//! element would otherwise leave the root ambiguous.

use crate::document::{self, Attribute, Node};
use crate::error::{Error, Result};
use crate::schema::grammar::{attrs, nodes, occurrence_keyword, STRUCT_VALUE_MODES};
use crate::schema::{
    AttributeDef, AttributeTarget, ElementContent, ElementId, OccurrenceRange, Schema, ScopeId,
    StructDef, ValueTypeDef,
};

/// Render a schema to its document form
pub fn schema_to_node(schema: &Schema) -> Result<Node> {
    let mut root = Node::new(nodes::SCHEMA);
    if schema.top_level_element_count() > 1 {
        let element = schema.resolve_root_element()?;
        root.attributes.push(Attribute::single(
            attrs::ROOT_ELEMENT,
            schema.element(element).name(),
        ));
    }
    write_definitions(schema, schema.root_scope(), &mut root)?;
    Ok(root)
}

/// Render a schema to canonical text
pub fn schema_to_string(schema: &Schema) -> Result<String> {
    Ok(document::write(&schema_to_node(schema)?))
}

fn write_definitions(schema: &Schema, scope: ScopeId, parent: &mut Node) -> Result<()> {
    let defs = schema.definitions(scope);
    for (_, id) in defs.value_types().iter() {
        parent.children.push(enum_type_node(schema.value_type(id)));
    }
    for (_, id) in defs.structs().iter() {
        parent
            .children
            .push(struct_node(schema, schema.struct_def(id)));
    }
    for (_, id) in defs.attributes().iter() {
        parent
            .children
            .push(attribute_node(schema, schema.attribute(id))?);
    }
    for (_, id) in defs.elements().iter() {
        parent.children.push(element_node(schema, id)?);
    }
    Ok(())
}

fn enum_type_node(def: &ValueTypeDef) -> Node {
    let ValueTypeDef::Enum(def) = def;
    let mut node = Node::new(nodes::ENUM_TYPE);
    node.attributes.push(Attribute::single(attrs::NAME, def.name()));
    node.attributes
        .push(Attribute::new(attrs::VALUES, def.values().to_vec()));
    node
}

fn struct_node(schema: &Schema, def: &StructDef) -> Node {
    let mut node = Node::new(nodes::STRUCT);
    node.attributes.push(Attribute::single(attrs::NAME, def.name()));
    for value in def.values() {
        let mode = STRUCT_VALUE_MODES[usize::from(value.is_optional())];
        node.attributes.push(Attribute::new(
            attrs::VALUE,
            vec![
                value.name().to_string(),
                mode.to_string(),
                value.render_type(schema),
            ],
        ));
    }
    node
}

fn attribute_node(schema: &Schema, def: &AttributeDef) -> Result<Node> {
    let mut node = Node::new(nodes::ATTRIBUTE);
    node.attributes.push(Attribute::single(attrs::NAME, def.name()));
    node.attributes.push(Attribute::single(
        attrs::DATA_TYPE,
        render_data_type(schema, def)?,
    ));
    Ok(node)
}

fn element_node(schema: &Schema, id: ElementId) -> Result<Node> {
    let element = schema.element(id);
    let mut node = Node::new(nodes::ELEMENT);
    node.attributes
        .push(Attribute::single(attrs::NAME, element.name()));

    if !schema.definitions(element.scope()).is_empty() {
        let mut defs_node = Node::new(nodes::DEFINITIONS);
        write_definitions(schema, element.scope(), &mut defs_node)?;
        node.children.push(defs_node);
    }

    match element.content() {
        Some(ElementContent::Unordered(content)) => {
            let mut content_node = Node::new(nodes::UNORDERED_CONTENT);
            for (name, entry) in content.element_entries() {
                content_node.attributes.push(Attribute::new(
                    attrs::ELEMENT,
                    vec![name.to_string(), keyword_for(entry.occurs)?.to_string()],
                ));
            }
            for (name, entry) in content.attribute_entries() {
                let mut values = vec![name.to_string(), keyword_for(entry.occurs)?.to_string()];
                if let AttributeTarget::Inline(attr_id) = entry.target {
                    values.push(render_data_type(schema, schema.attribute(attr_id))?);
                }
                content_node
                    .attributes
                    .push(Attribute::new(attrs::ATTRIBUTE, values));
            }
            node.children.push(content_node);
        }
        Some(ElementContent::Ordered) => {
            return Err(Error::Unsupported(
                "ordered content cannot be rendered".to_string(),
            ))
        }
        Some(ElementContent::List) => {
            return Err(Error::Unsupported(
                "list content cannot be rendered".to_string(),
            ))
        }
        None => {
            return Err(Error::Grammar(format!(
                "element '{}' has no content model",
                element.name()
            )))
        }
    }
    Ok(node)
}

fn keyword_for(occurs: OccurrenceRange) -> Result<&'static str> {
    occurrence_keyword(&occurs).ok_or_else(|| {
        Error::Unsupported(format!(
            "occurrence range {}..{} has no keyword form",
            occurs.min(),
            occurs
                .max()
                .map_or_else(|| "*".to_string(), |m| m.to_string())
        ))
    })
}

fn render_data_type(schema: &Schema, def: &AttributeDef) -> Result<String> {
    let data_type = def
        .data_type()
        .ok_or_else(|| Error::Grammar(format!("attribute '{}' has no data type", def.name())))?;
    Ok(data_type.render(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_schema;
    use pretty_assertions::assert_eq;

    const CANONICAL: &str = "\
Schema RootElement=Person
  EnumType Name=Color Values=Red,Green,Blue
  Struct Name=Point Value=x,Required,number Value=color,Optional,Color
  Attribute Name=Name DataType=string
  Element Name=Person
    UnorderedContent Attribute=Name,Required Attribute=Age,Optional,int
  Element Name=Team
    Definitions
      Attribute Name=Size DataType=uint[1..N]
    UnorderedContent Element=Person,Repeated+ Attribute=Size,Optional
";

    #[test]
    fn test_canonical_text_is_stable() {
        let schema = load_schema(CANONICAL).unwrap();
        assert_eq!(schema_to_string(&schema).unwrap(), CANONICAL);
    }

    #[test]
    fn test_reload_of_rendered_schema_is_identical() {
        let schema = load_schema(CANONICAL).unwrap();
        let rendered = schema_to_string(&schema).unwrap();
        assert_eq!(load_schema(&rendered).unwrap(), schema);
    }

    #[test]
    fn test_single_element_omits_root_designation() {
        let text = "\
Schema
  Element Name=Only
    UnorderedContent Attribute=X,Required,int
";
        let schema = load_schema(text).unwrap();
        assert_eq!(schema_to_string(&schema).unwrap(), text);
    }

    #[test]
    fn test_designation_written_when_ambiguous() {
        let text = "\
Schema RootElement=B
  Element Name=A
    UnorderedContent Attribute=X,Required,int
  Element Name=B
    UnorderedContent Attribute=X,Required,int
";
        let schema = load_schema(text).unwrap();
        let rendered = schema_to_string(&schema).unwrap();
        assert!(rendered.starts_with("Schema RootElement=B\n"));
    }

    #[test]
    fn test_ambiguous_root_cannot_be_rendered() {
        let mut schema = Schema::new();
        let scope = schema.root_scope();
        for name in ["A", "B"] {
            let id = schema.declare_element(scope, name).unwrap();
            schema
                .element_mut(id)
                .set_content(ElementContent::Unordered(Default::default()))
                .unwrap();
        }
        let err = schema_to_node(&schema).unwrap_err();
        assert!(matches!(err, Error::RootAmbiguous(_)));
    }

    #[test]
    fn test_quoted_values_survive_rendering() {
        let text = "\
Schema
  EnumType Name=Token Values=\"a b\",\"c,d\"
  Element Name=Doc
    UnorderedContent Attribute=Kind,Required,Token
";
        let schema = load_schema(text).unwrap();
        let rendered = schema_to_string(&schema).unwrap();
        assert_eq!(load_schema(&rendered).unwrap(), schema);
        assert!(rendered.contains("Values=\"a b\",\"c,d\""));
    }
}
