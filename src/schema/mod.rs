//! Schema model
//!
//! The in-memory representation of a schema: the definition arena, the
//! chained scope registry, the loader and serializer, and the occurrence
//! and type algebra. A [`Schema`] owns flat arenas of scopes, value types,
//! structs, attributes, and elements; the rest of the model refers to them
//! through copyable typed ids.

pub mod attributes;
pub mod elements;
pub mod grammar;
pub mod loader;
pub mod occurs;
pub mod scope;
pub mod serializer;
pub mod structs;
pub mod types;

pub use attributes::AttributeDef;
pub use elements::{
    AttributeEntry, AttributeTarget, ElementContent, ElementDef, ElementEntry, UnorderedContent,
};
pub use loader::{load_schema, schema_from_node};
pub use occurs::OccurrenceRange;
pub use scope::{DefKind, Definitions, Namespace};
pub use serializer::{schema_to_node, schema_to_string};
pub use structs::{StructDef, StructValue, StructValueType};
pub use types::{
    AttributeBaseType, AttributeDataType, EnumTypeDef, PredefinedType, ValueTypeDef,
};

use crate::error::{Error, Result};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            #[cfg(test)]
            pub(crate) fn for_tests(raw: usize) -> Self {
                Self(raw)
            }
        }
    };
}

arena_id!(
    /// Handle to a definition scope
    ScopeId
);
arena_id!(
    /// Handle to a value type definition
    ValueTypeId
);
arena_id!(
    /// Handle to a struct definition
    StructId
);
arena_id!(
    /// Handle to an attribute definition
    AttributeId
);
arena_id!(
    /// Handle to an element definition
    ElementId
);

/// The root aggregate: definition arenas plus the root-element designation
///
/// Ids handed out by one `Schema` are only meaningful against that same
/// `Schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    scopes: Vec<Definitions>,
    value_types: Vec<ValueTypeDef>,
    structs: Vec<StructDef>,
    attributes: Vec<AttributeDef>,
    elements: Vec<ElementDef>,
    root_element: Option<ElementId>,
}

impl Schema {
    /// Create an empty schema with its root scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Definitions::new("the schema root", None)],
            value_types: Vec::new(),
            structs: Vec::new(),
            attributes: Vec::new(),
            elements: Vec::new(),
            root_element: None,
        }
    }

    /// The top-level definition scope
    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    // ========== Scopes ==========

    /// The definitions held by a scope
    pub fn definitions(&self, scope: ScopeId) -> &Definitions {
        &self.scopes[scope.0]
    }

    /// Human-readable description of a scope, for error messages
    pub fn describe_scope(&self, scope: ScopeId) -> String {
        self.scopes[scope.0].describe().to_string()
    }

    // ========== Registration ==========

    /// Register a fully-built enum type in a scope
    pub fn add_enum_type(&mut self, scope: ScopeId, def: EnumTypeDef) -> Result<ValueTypeId> {
        let id = ValueTypeId(self.value_types.len());
        let describe = self.describe_scope(scope);
        self.scopes[scope.0]
            .value_types_mut()
            .add(def.name(), id, &describe)?;
        self.value_types.push(ValueTypeDef::Enum(def));
        Ok(id)
    }

    /// Declare an empty struct in a scope
    pub fn declare_struct(&mut self, scope: ScopeId, name: &str) -> Result<StructId> {
        let id = StructId(self.structs.len());
        let describe = self.describe_scope(scope);
        self.scopes[scope.0].structs_mut().add(name, id, &describe)?;
        self.structs.push(StructDef::new(name));
        Ok(id)
    }

    /// Declare a named attribute in a scope, with no data type yet
    pub fn declare_attribute(&mut self, scope: ScopeId, name: &str) -> Result<AttributeId> {
        let id = AttributeId(self.attributes.len());
        let describe = self.describe_scope(scope);
        self.scopes[scope.0]
            .attributes_mut()
            .add(name, id, &describe)?;
        self.attributes.push(AttributeDef::new(name));
        Ok(id)
    }

    /// Store an inline attribute without registering it in any namespace
    pub fn add_inline_attribute(&mut self, def: AttributeDef) -> AttributeId {
        let id = AttributeId(self.attributes.len());
        self.attributes.push(def);
        id
    }

    /// Declare an element in a scope, creating its nested scope
    pub fn declare_element(&mut self, scope: ScopeId, name: &str) -> Result<ElementId> {
        let id = ElementId(self.elements.len());
        let describe = self.describe_scope(scope);
        self.scopes[scope.0].elements_mut().add(name, id, &describe)?;
        let nested = ScopeId(self.scopes.len());
        self.scopes
            .push(Definitions::new(format!("element '{}'", name), Some(scope)));
        self.elements.push(ElementDef::new(name, nested));
        Ok(id)
    }

    // ========== Accessors ==========

    /// A value type by id
    pub fn value_type(&self, id: ValueTypeId) -> &ValueTypeDef {
        &self.value_types[id.0]
    }

    /// A struct by id
    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.structs[id.0]
    }

    /// A struct by id, mutably
    pub fn struct_def_mut(&mut self, id: StructId) -> &mut StructDef {
        &mut self.structs[id.0]
    }

    /// An attribute by id
    pub fn attribute(&self, id: AttributeId) -> &AttributeDef {
        &self.attributes[id.0]
    }

    /// An attribute by id, mutably
    pub fn attribute_mut(&mut self, id: AttributeId) -> &mut AttributeDef {
        &mut self.attributes[id.0]
    }

    /// An element by id
    pub fn element(&self, id: ElementId) -> &ElementDef {
        &self.elements[id.0]
    }

    /// An element by id, mutably
    pub fn element_mut(&mut self, id: ElementId) -> &mut ElementDef {
        &mut self.elements[id.0]
    }

    // ========== Lookups ==========

    /// Find a value type through the scope chain
    pub fn lookup_value_type(&self, scope: ScopeId, name: &str) -> Option<ValueTypeId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let defs = &self.scopes[scope_id.0];
            if let Some(found) = defs.value_types().get_local(name) {
                return Some(found);
            }
            current = defs.parent();
        }
        None
    }

    /// Find a struct through the scope chain
    pub fn lookup_struct(&self, scope: ScopeId, name: &str) -> Option<StructId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let defs = &self.scopes[scope_id.0];
            if let Some(found) = defs.structs().get_local(name) {
                return Some(found);
            }
            current = defs.parent();
        }
        None
    }

    /// Find an attribute through the scope chain
    pub fn lookup_attribute(&self, scope: ScopeId, name: &str) -> Option<AttributeId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let defs = &self.scopes[scope_id.0];
            if let Some(found) = defs.attributes().get_local(name) {
                return Some(found);
            }
            current = defs.parent();
        }
        None
    }

    /// Find an element through the scope chain
    pub fn lookup_element(&self, scope: ScopeId, name: &str) -> Option<ElementId> {
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let defs = &self.scopes[scope_id.0];
            if let Some(found) = defs.elements().get_local(name) {
                return Some(found);
            }
            current = defs.parent();
        }
        None
    }

    /// Like [`Self::lookup_value_type`] but failing when not found
    pub fn get_value_type(&self, scope: ScopeId, name: &str) -> Result<ValueTypeId> {
        self.lookup_value_type(scope, name)
            .ok_or_else(|| self.not_defined(DefKind::ValueType, name, scope))
    }

    /// Like [`Self::lookup_struct`] but failing when not found
    pub fn get_struct(&self, scope: ScopeId, name: &str) -> Result<StructId> {
        self.lookup_struct(scope, name)
            .ok_or_else(|| self.not_defined(DefKind::Struct, name, scope))
    }

    /// Like [`Self::lookup_attribute`] but failing when not found
    pub fn get_attribute(&self, scope: ScopeId, name: &str) -> Result<AttributeId> {
        self.lookup_attribute(scope, name)
            .ok_or_else(|| self.not_defined(DefKind::Attribute, name, scope))
    }

    /// Like [`Self::lookup_element`] but failing when not found
    pub fn get_element(&self, scope: ScopeId, name: &str) -> Result<ElementId> {
        self.lookup_element(scope, name)
            .ok_or_else(|| self.not_defined(DefKind::Element, name, scope))
    }

    fn not_defined(&self, kind: DefKind, name: &str, scope: ScopeId) -> Error {
        Error::NotDefined {
            kind: kind.as_str(),
            name: name.to_string(),
            scope: self.describe_scope(scope),
        }
    }

    // ========== Root element ==========

    /// Designate the root element explicitly
    pub fn set_root_element(&mut self, element: ElementId) {
        self.root_element = Some(element);
    }

    /// The explicit root-element designation, if any
    pub fn root_element(&self) -> Option<ElementId> {
        self.root_element
    }

    /// Number of elements declared directly in the root scope
    pub fn top_level_element_count(&self) -> usize {
        self.scopes[0].elements().len()
    }

    /// Resolve the root element: the explicit designation, else the sole
    /// top-level element
    pub fn resolve_root_element(&self) -> Result<ElementId> {
        if let Some(id) = self.root_element {
            return Ok(id);
        }
        let top = self.scopes[0].elements();
        if top.len() > 1 {
            return Err(Error::RootAmbiguous(format!(
                "schema defines {} top-level elements and no RootElement",
                top.len()
            )));
        }
        match top.iter().next() {
            Some((_, id)) => Ok(id),
            None => Err(Error::RootUndefined(
                "schema defines no top-level element".to_string(),
            )),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
