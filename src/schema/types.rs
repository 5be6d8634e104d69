//! Predefined types, value types, and the attribute data-type combinator
//!
//! An attribute's data type is a base kind (predefined scalar, value type,
//! or struct) combined with base nullability, optional array bounds, and
//! array nullability. The canonical text form is `<base>[?][[bounds]][?]`
//! and parsing is its exact inverse, applied right to left.

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::occurs::OccurrenceRange;
use crate::schema::{Schema, ScopeId, StructId, ValueTypeId};

/// The closed set of predefined scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedType {
    /// `true`/`false`/`1`/`0`
    Bool,
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    UInt,
    /// 64-bit floating point
    Number,
    /// Raw text
    String,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Base64-encoded bytes
    Base64,
    /// Combined date and time
    DateTime,
}

impl PredefinedType {
    /// Every predefined kind, in declaration order
    pub const ALL: [PredefinedType; 9] = [
        PredefinedType::Bool,
        PredefinedType::Int,
        PredefinedType::UInt,
        PredefinedType::Number,
        PredefinedType::String,
        PredefinedType::Date,
        PredefinedType::Time,
        PredefinedType::Base64,
        PredefinedType::DateTime,
    ];

    /// Canonical name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            PredefinedType::Bool => "bool",
            PredefinedType::Int => "int",
            PredefinedType::UInt => "uint",
            PredefinedType::Number => "number",
            PredefinedType::String => "string",
            PredefinedType::Date => "date",
            PredefinedType::Time => "time",
            PredefinedType::Base64 => "base64",
            PredefinedType::DateTime => "datetime",
        }
    }

    /// Look up a kind by name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PredefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An enumerated value type: a name plus ordered, distinct labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTypeDef {
    name: String,
    values: Vec<String>,
}

impl EnumTypeDef {
    /// Create an enum type; the label list must be non-empty and distinct
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(Error::Grammar(format!(
                "enum type '{}' must declare at least one value",
                name
            )));
        }
        for (index, value) in values.iter().enumerate() {
            if values[..index].contains(value) {
                return Err(Error::AlreadyDefined {
                    kind: "value",
                    name: value.clone(),
                    scope: format!("enum type '{}'", name),
                });
            }
        }
        Ok(Self { name, values })
    }

    /// The type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The labels, in declaration order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Position of a label, if declared
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.values.iter().position(|v| v == label)
    }
}

/// A named value type beyond the predefined set
///
/// Closed variant set; only the enumerated variant is implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeDef {
    /// Enumerated labels
    Enum(EnumTypeDef),
}

impl ValueTypeDef {
    /// The type name
    pub fn name(&self) -> &str {
        match self {
            ValueTypeDef::Enum(def) => def.name(),
        }
    }
}

/// The base kind of an attribute data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeBaseType {
    /// A predefined scalar kind
    Predefined(PredefinedType),
    /// A value type declared in the schema
    Value(ValueTypeId),
    /// A struct declared in the schema
    Struct(StructId),
}

/// An attribute's complete data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDataType {
    base: AttributeBaseType,
    nullable: bool,
    array: Option<OccurrenceRange>,
    array_nullable: bool,
}

impl AttributeDataType {
    /// Create a data type, checking the combination invariants
    pub fn new(
        schema: &Schema,
        base: AttributeBaseType,
        nullable: bool,
        array: Option<OccurrenceRange>,
        array_nullable: bool,
    ) -> Result<Self> {
        if array_nullable && array.is_none() {
            return Err(Error::TypeCombination(
                "array nullability requires an array".to_string(),
            ));
        }
        if let (Some(_), AttributeBaseType::Struct(id)) = (array, base) {
            let def = schema.struct_def(id);
            if def.has_optional_values() {
                return Err(Error::TypeCombination(format!(
                    "array of struct '{}' is not allowed: the struct has optional values",
                    def.name()
                )));
            }
        }
        Ok(Self {
            base,
            nullable,
            array,
            array_nullable,
        })
    }

    /// A plain, non-nullable, non-array predefined type
    pub fn predefined(kind: PredefinedType) -> Self {
        Self {
            base: AttributeBaseType::Predefined(kind),
            nullable: false,
            array: None,
            array_nullable: false,
        }
    }

    /// The base kind
    pub fn base(&self) -> AttributeBaseType {
        self.base
    }

    /// Whether the base value may be null
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The array bounds, if this is an array type
    pub fn array(&self) -> Option<OccurrenceRange> {
        self.array
    }

    /// Whether the array itself may be null
    pub fn is_array_nullable(&self) -> bool {
        self.array_nullable
    }

    /// Render the canonical `<base>[?][[bounds]][?]` form
    pub fn render(&self, schema: &Schema) -> String {
        let mut out = String::new();
        match self.base {
            AttributeBaseType::Predefined(kind) => out.push_str(kind.name()),
            AttributeBaseType::Value(id) => out.push_str(schema.value_type(id).name()),
            AttributeBaseType::Struct(id) => out.push_str(schema.struct_def(id).name()),
        }
        if self.nullable {
            out.push('?');
        }
        if let Some(range) = self.array {
            out.push('[');
            if let Some(size) = range.fixed_size() {
                out.push_str(&size.to_string());
            } else {
                out.push_str(&range.min().to_string());
                out.push_str("..");
                match range.max() {
                    Some(max) => out.push_str(&max.to_string()),
                    None => out.push('N'),
                }
            }
            out.push(']');
            if self.array_nullable {
                out.push('?');
            }
        }
        out
    }

    /// Parse the canonical form, resolving the base name through `scope`
    pub fn parse(input: &str, schema: &Schema, scope: ScopeId) -> Result<Self> {
        let mut rest = input;
        let mut array_nullable = false;
        if let Some(stripped) = rest.strip_suffix('?') {
            if stripped.ends_with(']') {
                array_nullable = true;
                rest = stripped;
            }
        }
        let array = if rest.ends_with(']') {
            let open = rest.rfind('[').ok_or_else(|| {
                Error::Grammar(format!("data type '{}' has an unmatched ']'", input))
            })?;
            let bounds = parse_bounds(&rest[open + 1..rest.len() - 1], input)?;
            rest = &rest[..open];
            Some(bounds)
        } else {
            None
        };
        let nullable = match rest.strip_suffix('?') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };
        if rest.is_empty() {
            return Err(Error::Grammar(format!(
                "data type '{}' has no base type",
                input
            )));
        }
        let base = resolve_base(rest, schema, scope)?;
        Self::new(schema, base, nullable, array, array_nullable)
    }
}

/// Parse the inside of a `[bounds]` suffix: a fixed size or `min..(max|N)`
fn parse_bounds(bounds: &str, whole: &str) -> Result<OccurrenceRange> {
    if let Some((low, high)) = bounds.split_once("..") {
        let min = parse_bound_number(low, whole)?;
        let max = if high == "N" {
            None
        } else {
            Some(parse_bound_number(high, whole)?)
        };
        OccurrenceRange::new(Some(min), max)
    } else {
        let size = parse_bound_number(bounds, whole)?;
        Ok(OccurrenceRange::fixed(size))
    }
}

fn parse_bound_number(token: &str, whole: &str) -> Result<u32> {
    let value: i64 = token.parse().map_err(|_| {
        Error::Grammar(format!(
            "array bound '{}' in data type '{}' is not a number",
            token, whole
        ))
    })?;
    if value < 0 {
        return Err(Error::Range(format!("negative array bound {}", value)));
    }
    u32::try_from(value).map_err(|_| Error::Range(format!("array bound {} is too large", value)))
}

/// Resolve a base type name: predefined, then value types, then structs
fn resolve_base(token: &str, schema: &Schema, scope: ScopeId) -> Result<AttributeBaseType> {
    if let Some(kind) = PredefinedType::from_name(token) {
        return Ok(AttributeBaseType::Predefined(kind));
    }
    if let Some(id) = schema.lookup_value_type(scope, token) {
        return Ok(AttributeBaseType::Value(id));
    }
    if let Some(id) = schema.lookup_struct(scope, token) {
        return Ok(AttributeBaseType::Struct(id));
    }
    Err(Error::NotDefined {
        kind: "type",
        name: token.to_string(),
        scope: schema.describe_scope(scope),
    })
}
