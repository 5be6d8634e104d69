//! Struct definitions
//!
//! A struct is a fixed-shape value aggregate: an ordered list of named
//! values, each typed by a predefined kind or a value type. Struct values
//! are consumed positionally from an attribute's value list, one slot per
//! value, so optional values are only permitted at the tail.

use crate::error::{Error, Result};
use crate::schema::types::PredefinedType;
use crate::schema::{Schema, ScopeId, ValueTypeId};

/// The type of a single struct value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructValueType {
    /// A predefined scalar kind
    Predefined(PredefinedType),
    /// A value type declared in the schema
    Value(ValueTypeId),
}

impl StructValueType {
    /// Parse a struct value type string with optional trailing `?`
    ///
    /// Returns the type and the nullable flag. The name resolves against
    /// predefined kinds first, then value types through the scope chain;
    /// structs are not permitted inside structs.
    pub fn parse(input: &str, schema: &Schema, scope: ScopeId) -> Result<(Self, bool)> {
        let (token, nullable) = match input.strip_suffix('?') {
            Some(stripped) => (stripped, true),
            None => (input, false),
        };
        if token.is_empty() {
            return Err(Error::Grammar(format!(
                "struct value type '{}' has no base type",
                input
            )));
        }
        if let Some(kind) = PredefinedType::from_name(token) {
            return Ok((StructValueType::Predefined(kind), nullable));
        }
        if let Some(id) = schema.lookup_value_type(scope, token) {
            return Ok((StructValueType::Value(id), nullable));
        }
        Err(Error::NotDefined {
            kind: "type",
            name: token.to_string(),
            scope: schema.describe_scope(scope),
        })
    }

    /// Render the type name, without the nullable marker
    pub fn render(&self, schema: &Schema) -> String {
        match self {
            StructValueType::Predefined(kind) => kind.name().to_string(),
            StructValueType::Value(id) => schema.value_type(*id).name().to_string(),
        }
    }
}

/// One named, typed value slot of a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    name: String,
    optional: bool,
    value_type: StructValueType,
    nullable: bool,
}

impl StructValue {
    /// Create a struct value
    pub fn new(
        name: impl Into<String>,
        optional: bool,
        value_type: StructValueType,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            optional,
            value_type,
            nullable,
        }
    }

    /// The value name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the value may be omitted from the tail of the value list
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The value's type
    pub fn value_type(&self) -> StructValueType {
        self.value_type
    }

    /// Whether the value may be null
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Render the type string, with the nullable marker when set
    pub fn render_type(&self, schema: &Schema) -> String {
        let mut out = self.value_type.render(schema);
        if self.nullable {
            out.push('?');
        }
        out
    }
}

/// A struct definition: a name plus its ordered value slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    name: String,
    values: Vec<StructValue>,
}

impl StructDef {
    /// Create an empty struct definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// The struct name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value slots, in declaration order
    pub fn values(&self) -> &[StructValue] {
        &self.values
    }

    /// Append a value slot, enforcing the trailing-optional rule
    pub fn add_value(&mut self, value: StructValue) -> Result<()> {
        if !value.is_optional() && self.has_optional_values() {
            return Err(Error::TypeCombination(format!(
                "required value '{}' cannot follow optional values in struct '{}'",
                value.name(),
                self.name
            )));
        }
        if self.values.iter().any(|v| v.name() == value.name()) {
            return Err(Error::AlreadyDefined {
                kind: "value",
                name: value.name().to_string(),
                scope: format!("struct '{}'", self.name),
            });
        }
        self.values.push(value);
        Ok(())
    }

    /// Whether any value slot is optional
    pub fn has_optional_values(&self) -> bool {
        self.values.iter().any(|v| v.is_optional())
    }

    /// Number of leading required value slots
    pub fn required_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_optional()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::EnumTypeDef;

    fn number_value(name: &str, optional: bool) -> StructValue {
        StructValue::new(
            name,
            optional,
            StructValueType::Predefined(PredefinedType::Number),
            false,
        )
    }

    #[test]
    fn test_required_after_optional_fails() {
        let mut def = StructDef::new("Point");
        def.add_value(number_value("x", false)).unwrap();
        def.add_value(number_value("color", true)).unwrap();
        let err = def.add_value(number_value("y", false)).unwrap_err();
        assert!(matches!(err, Error::TypeCombination(_)));
    }

    #[test]
    fn test_required_then_optional_sequences_succeed() {
        let mut def = StructDef::new("Span");
        def.add_value(number_value("start", false)).unwrap();
        def.add_value(number_value("end", false)).unwrap();
        def.add_value(number_value("weight", true)).unwrap();
        def.add_value(number_value("label", true)).unwrap();
        assert_eq!(def.values().len(), 4);
        assert_eq!(def.required_count(), 2);
        assert!(def.has_optional_values());
    }

    #[test]
    fn test_duplicate_value_names_rejected() {
        let mut def = StructDef::new("Pair");
        def.add_value(number_value("a", false)).unwrap();
        let err = def.add_value(number_value("a", false)).unwrap_err();
        assert!(matches!(err, Error::AlreadyDefined { .. }));
    }

    #[test]
    fn test_value_type_parse_and_render() {
        let mut schema = Schema::new();
        let root = schema.root_scope();
        let color = EnumTypeDef::new("Color", vec!["Red".to_string(), "Blue".to_string()]).unwrap();
        schema.add_enum_type(root, color).unwrap();

        let (kind, nullable) = StructValueType::parse("number", &schema, root).unwrap();
        assert_eq!(kind, StructValueType::Predefined(PredefinedType::Number));
        assert!(!nullable);

        let (kind, nullable) = StructValueType::parse("Color?", &schema, root).unwrap();
        assert!(matches!(kind, StructValueType::Value(_)));
        assert!(nullable);
        assert_eq!(kind.render(&schema), "Color");

        assert!(StructValueType::parse("Missing", &schema, root).is_err());
        assert!(StructValueType::parse("?", &schema, root).is_err());
    }

    #[test]
    fn test_render_type_includes_nullable_marker() {
        let schema = Schema::new();
        let value = StructValue::new(
            "x",
            false,
            StructValueType::Predefined(PredefinedType::Int),
            true,
        );
        assert_eq!(value.render_type(&schema), "int?");
    }
}
