//! Chained definition scopes
//!
//! A scope holds four independent namespaces (value types, structs,
//! attributes, elements) plus an optional parent scope. Registration is
//! local and rejects local duplicates only, so an inner scope may shadow
//! a name defined by an ancestor. Lookup walks the parent chain; the walk
//! itself lives on [`crate::schema::Schema`], which owns the scope arena.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::{AttributeId, ElementId, ScopeId, StructId, ValueTypeId};

/// The entity kinds a scope can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    /// Named value types
    ValueType,
    /// Struct definitions
    Struct,
    /// Attribute definitions
    Attribute,
    /// Element definitions
    Element,
}

impl DefKind {
    /// Human-readable kind name, used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::ValueType => "value type",
            DefKind::Struct => "struct",
            DefKind::Attribute => "attribute",
            DefKind::Element => "element",
        }
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One namespace of a scope: a declaration-ordered local name map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace<I> {
    kind: DefKind,
    entries: IndexMap<String, I>,
}

impl<I: Copy> Namespace<I> {
    /// Create an empty namespace for one entity kind
    pub fn new(kind: DefKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// The entity kind this namespace holds
    pub fn kind(&self) -> DefKind {
        self.kind
    }

    /// Register a name locally; fails on a local duplicate
    pub fn add(&mut self, name: &str, id: I, scope: &str) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(Error::AlreadyDefined {
                kind: self.kind.as_str(),
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
        self.entries.insert(name.to_string(), id);
        Ok(())
    }

    /// Look up a name in the local map only
    pub fn get_local(&self, name: &str) -> Option<I> {
        self.entries.get(name).copied()
    }

    /// Iterate local entries, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, I)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Number of local entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the local map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A definition scope: four namespaces plus the parent link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definitions {
    describe: String,
    parent: Option<ScopeId>,
    value_types: Namespace<ValueTypeId>,
    structs: Namespace<StructId>,
    attributes: Namespace<AttributeId>,
    elements: Namespace<ElementId>,
}

impl Definitions {
    /// Create a scope with a human-readable description
    pub fn new(describe: impl Into<String>, parent: Option<ScopeId>) -> Self {
        Self {
            describe: describe.into(),
            parent,
            value_types: Namespace::new(DefKind::ValueType),
            structs: Namespace::new(DefKind::Struct),
            attributes: Namespace::new(DefKind::Attribute),
            elements: Namespace::new(DefKind::Element),
        }
    }

    /// Description used in error messages ("the schema root", "element 'X'")
    pub fn describe(&self) -> &str {
        &self.describe
    }

    /// The parent scope, if any
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// The value-type namespace
    pub fn value_types(&self) -> &Namespace<ValueTypeId> {
        &self.value_types
    }

    /// The value-type namespace, mutably
    pub fn value_types_mut(&mut self) -> &mut Namespace<ValueTypeId> {
        &mut self.value_types
    }

    /// The struct namespace
    pub fn structs(&self) -> &Namespace<StructId> {
        &self.structs
    }

    /// The struct namespace, mutably
    pub fn structs_mut(&mut self) -> &mut Namespace<StructId> {
        &mut self.structs
    }

    /// The attribute namespace
    pub fn attributes(&self) -> &Namespace<AttributeId> {
        &self.attributes
    }

    /// The attribute namespace, mutably
    pub fn attributes_mut(&mut self) -> &mut Namespace<AttributeId> {
        &mut self.attributes
    }

    /// The element namespace
    pub fn elements(&self) -> &Namespace<ElementId> {
        &self.elements
    }

    /// The element namespace, mutably
    pub fn elements_mut(&mut self) -> &mut Namespace<ElementId> {
        &mut self.elements
    }

    /// Whether all four namespaces are empty
    pub fn is_empty(&self) -> bool {
        self.value_types.is_empty()
            && self.structs.is_empty()
            && self.attributes.is_empty()
            && self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_rejects_local_duplicates() {
        let mut namespace: Namespace<StructId> = Namespace::new(DefKind::Struct);
        namespace
            .add("Point", StructId::for_tests(0), "the schema root")
            .unwrap();
        let err = namespace
            .add("Point", StructId::for_tests(1), "the schema root")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyDefined { kind: "struct", .. }
        ));
        assert_eq!(namespace.get_local("Point"), Some(StructId::for_tests(0)));
        assert_eq!(namespace.get_local("Missing"), None);
    }

    #[test]
    fn test_namespace_iteration_order() {
        let mut namespace: Namespace<ElementId> = Namespace::new(DefKind::Element);
        for (index, name) in ["Zeta", "Alpha", "Mid"].iter().enumerate() {
            namespace
                .add(name, ElementId::for_tests(index), "the schema root")
                .unwrap();
        }
        let names: Vec<&str> = namespace.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_definitions_is_empty() {
        let mut defs = Definitions::new("element 'X'", Some(ScopeId::for_tests(0)));
        assert!(defs.is_empty());
        assert_eq!(defs.describe(), "element 'X'");
        assert_eq!(defs.parent(), Some(ScopeId::for_tests(0)));
        defs.elements_mut()
            .add("Y", ElementId::for_tests(0), "element 'X'")
            .unwrap();
        assert!(!defs.is_empty());
    }
}
