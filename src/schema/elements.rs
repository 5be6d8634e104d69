//! Element definitions and content models

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::occurs::OccurrenceRange;
use crate::schema::{AttributeId, ElementId, ScopeId};

/// A schema-declared node type
///
/// Every element owns a nested definition scope chained to the scope it
/// was declared in. Content is a write-once field assigned during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    name: String,
    scope: ScopeId,
    content: Option<ElementContent>,
}

impl ElementDef {
    /// Create an element bound to its nested scope
    pub fn new(name: impl Into<String>, scope: ScopeId) -> Self {
        Self {
            name: name.into(),
            scope,
            content: None,
        }
    }

    /// The element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's nested definition scope
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The content model, if assigned
    pub fn content(&self) -> Option<&ElementContent> {
        self.content.as_ref()
    }

    /// Assign the content model; fails on a second assignment
    pub fn set_content(&mut self, content: ElementContent) -> Result<()> {
        if self.content.is_some() {
            return Err(Error::AlreadySet(format!(
                "content of element '{}'",
                self.name
            )));
        }
        self.content = Some(content);
        Ok(())
    }
}

/// The closed set of element content models
///
/// Only unordered content is implemented; the ordered and list variants
/// are named by the grammar and fail as unsupported wherever consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementContent {
    /// Named children and attributes in no particular order
    Unordered(UnorderedContent),
    /// Sequential children (named, unimplemented)
    Ordered,
    /// Repeated homogeneous children (named, unimplemented)
    List,
}

/// One child-element entry of an unordered content block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementEntry {
    /// The referenced element
    pub element: ElementId,
    /// How often the child may appear
    pub occurs: OccurrenceRange,
}

/// What an attribute entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    /// A previously declared, named attribute
    Declared(AttributeId),
    /// An attribute declared inline at the point of use
    Inline(AttributeId),
}

impl AttributeTarget {
    /// The referenced attribute, regardless of how it was declared
    pub fn attribute(&self) -> AttributeId {
        match self {
            AttributeTarget::Declared(id) | AttributeTarget::Inline(id) => *id,
        }
    }
}

/// One attribute entry of an unordered content block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeEntry {
    /// The referenced or inline-declared attribute
    pub target: AttributeTarget,
    /// How often the attribute may appear
    pub occurs: OccurrenceRange,
}

/// Unordered element content: named child and attribute occurrence entries
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnorderedContent {
    elements: IndexMap<String, ElementEntry>,
    attributes: IndexMap<String, AttributeEntry>,
}

impl UnorderedContent {
    /// Create an empty content block
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child-element entry; entry names must be unique
    pub fn add_element_entry(
        &mut self,
        name: impl Into<String>,
        element: ElementId,
        occurs: OccurrenceRange,
    ) -> Result<()> {
        let name = name.into();
        if self.elements.contains_key(&name) {
            return Err(Error::AlreadyDefined {
                kind: "element entry",
                name,
                scope: "this content block".to_string(),
            });
        }
        self.elements.insert(name, ElementEntry { element, occurs });
        Ok(())
    }

    /// Add an attribute entry; entry names must be unique
    pub fn add_attribute_entry(
        &mut self,
        name: impl Into<String>,
        target: AttributeTarget,
        occurs: OccurrenceRange,
    ) -> Result<()> {
        let name = name.into();
        if self.attributes.contains_key(&name) {
            return Err(Error::AlreadyDefined {
                kind: "attribute entry",
                name,
                scope: "this content block".to_string(),
            });
        }
        self.attributes.insert(name, AttributeEntry { target, occurs });
        Ok(())
    }

    /// Child-element entries, in declaration order
    pub fn element_entries(&self) -> impl Iterator<Item = (&str, &ElementEntry)> {
        self.elements.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Attribute entries, in declaration order
    pub fn attribute_entries(&self) -> impl Iterator<Item = (&str, &AttributeEntry)> {
        self.attributes.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of child-element entries
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of attribute entries
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_write_once() {
        let mut def = ElementDef::new("Person", ScopeId::for_tests(1));
        def.set_content(ElementContent::Unordered(UnorderedContent::new()))
            .unwrap();
        let err = def
            .set_content(ElementContent::Unordered(UnorderedContent::new()))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadySet(_)));
    }

    #[test]
    fn test_duplicate_entries_rejected() {
        let mut content = UnorderedContent::new();
        let element = ElementId::for_tests(0);
        content
            .add_element_entry("Child", element, OccurrenceRange::required())
            .unwrap();
        let err = content
            .add_element_entry("Child", element, OccurrenceRange::optional())
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyDefined { .. }));

        let attribute = AttributeTarget::Declared(AttributeId::for_tests(0));
        content
            .add_attribute_entry("Name", attribute, OccurrenceRange::required())
            .unwrap();
        assert!(content
            .add_attribute_entry("Name", attribute, OccurrenceRange::required())
            .is_err());
    }

    #[test]
    fn test_entries_keep_declaration_order() {
        let mut content = UnorderedContent::new();
        for name in ["B", "A", "C"] {
            content
                .add_attribute_entry(
                    name,
                    AttributeTarget::Declared(AttributeId::for_tests(0)),
                    OccurrenceRange::required(),
                )
                .unwrap();
        }
        let names: Vec<&str> = content.attribute_entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }
}
