//! Abstract code emission
//!
//! The generator describes declarations, fields, and method bodies in the
//! symbolic vocabulary below and drives a [`CodeSink`] with them. Nothing
//! here names target-language syntax; a sink owns all of that, so
//! retargeting the generator means writing another sink.

use crate::error::Result;
use crate::schema::{OccurrenceRange, PredefinedType};

/// Opaque handle to a declared construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstructId(usize);

impl ConstructId {
    /// Handle to the construct declared at `index`
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in declaration order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a declared construct is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructKind {
    /// A sum type over declared labels
    Enum {
        /// (raw label, variant identifier) pairs in declaration order
        variants: Vec<(String, String)>,
    },
    /// A product type whose fields are added afterwards
    Record,
}

/// A field or value type in emitted code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A predefined scalar kind
    Scalar(PredefinedType),
    /// A previously declared construct
    Construct(ConstructId),
    /// A value that may be absent
    Optional(Box<TypeRef>),
    /// An ordered collection
    List(Box<TypeRef>),
}

/// Initial value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultExpr {
    /// The scalar kind's zero value
    ScalarZero(PredefinedType),
    /// The first declared variant of an enum construct
    FirstVariant(ConstructId),
    /// A default-constructed record
    EmptyRecord(ConstructId),
    /// No value
    Absent,
    /// An empty collection
    EmptyList,
}

/// Signature of a generated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSig {
    /// Enum: parse the raw label at a value position
    ParseLabel,
    /// Record from a struct: consume positional values starting at an offset
    FromValues,
    /// Record from an element: load and validate one document node
    LoadNode,
    /// Record from the root element: parse a whole document text
    ParseDocument,
}

/// Conversion of one logical value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarPlan {
    /// A predefined scalar through the value extractor
    Predefined(PredefinedType),
    /// A generated enum's label parse
    Enum(ConstructId),
    /// A generated record's positional load
    Record {
        /// The struct construct
        construct: ConstructId,
        /// Leading values that must be present per occupancy
        required: usize,
    },
}

/// How one attribute's raw value list becomes a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuePlan {
    /// Conversion of one logical value
    pub scalar: ScalarPlan,
    /// Whether one logical value may be the null encoding
    pub nullable: bool,
    /// Bounds on the number of logical values, when the type is an array
    pub array: Option<OccurrenceRange>,
    /// Whether the whole array may be the null encoding
    pub array_nullable: bool,
    /// Raw values consumed per logical value
    pub width: usize,
}

/// One emitted statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Assert the loaded node carries the given name
    AssertNodeName(String),
    /// Assert the node's children are drawn from the given names
    AssertChildNames(Vec<String>),
    /// Assert the node has no children
    AssertNoChildren,
    /// Assert the node's attributes are drawn from the given names
    AssertAttributeNames(Vec<String>),
    /// Assert the node has no attributes
    AssertNoAttributes,
    /// Start from the record's default value
    InitRecord,
    /// Bind the attribute of the given name, which must be present once
    BindRequiredAttribute(String),
    /// Bind the child of the given name, which must be present once
    BindRequiredChild(String),
    /// Convert the bound attribute and store the result in a field
    SetFromAttribute {
        /// Target field
        field: String,
        /// Value conversion
        plan: ValuePlan,
        /// Wrap the result in the present-marker of an optional occurrence
        optional: bool,
    },
    /// Convert the bound attribute and append the result to a field
    PushFromAttribute {
        /// Target collection field
        field: String,
        /// Value conversion
        plan: ValuePlan,
    },
    /// Load the bound child node and store the result in a field
    SetFromChild {
        /// Target field
        field: String,
        /// The child element's construct
        construct: ConstructId,
        /// Wrap the result in the present-marker of an optional occurrence
        optional: bool,
    },
    /// Load the bound child node and append the result to a field
    PushFromChild {
        /// Target collection field
        field: String,
        /// The child element's construct
        construct: ConstructId,
    },
    /// Consume the positional value at `offset` past the starting index
    TakeValue {
        /// Target field
        field: String,
        /// Offset from the starting index
        offset: usize,
        /// Value conversion
        scalar: ScalarPlan,
        /// Whether the raw value may be the null encoding
        nullable: bool,
        /// Whether the value must be present at all
        required: bool,
    },
    /// Match the raw label at the given position against the construct's
    /// declared labels, failing on an unknown label
    MatchLabel(ConstructId),
    /// Parse raw text as a document and load its root node
    ParseAndLoadRoot,
    /// Return the completed record
    FinishRecord,
}

/// Header of a nested block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockHeader {
    /// Bind the attribute of the given name, when present
    IfAttributePresent(String),
    /// Iterate occurrences of the attribute of the given name
    ForEachAttribute {
        /// Attribute name
        name: String,
        /// Fail when no occurrence exists
        at_least_one: bool,
    },
    /// Bind the child of the given name, when present
    IfChildPresent(String),
    /// Iterate occurrences of the child of the given name
    ForEachChild {
        /// Child name
        name: String,
        /// Fail when no occurrence exists
        at_least_one: bool,
    },
}

/// One operation of a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyOp {
    /// Append one statement
    Line(Stmt),
    /// Open a nested block
    Open(BlockHeader),
    /// Close the innermost open block
    Close,
}

/// Ordered operations of one method body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodBody {
    ops: Vec<BodyOp>,
}

impl MethodBody {
    /// Create an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one statement
    pub fn line(&mut self, stmt: Stmt) -> &mut Self {
        self.ops.push(BodyOp::Line(stmt));
        self
    }

    /// Open a nested block
    pub fn open(&mut self, header: BlockHeader) -> &mut Self {
        self.ops.push(BodyOp::Open(header));
        self
    }

    /// Close the innermost open block
    pub fn close(&mut self) -> &mut Self {
        self.ops.push(BodyOp::Close);
        self
    }

    /// The operations in order
    pub fn ops(&self) -> &[BodyOp] {
        &self.ops
    }
}

/// Target-language emission contract
///
/// The generator calls `declare` for every construct before it emits any
/// field or method that refers to one, so a sink may resolve handles
/// immediately.
pub trait CodeSink {
    /// Identifier spellings declarations must stay clear of; a target
    /// lists the names its rendered code spells without qualification
    fn reserved_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Declare a named construct and return its handle
    fn declare(&mut self, name: &str, kind: ConstructKind) -> Result<ConstructId>;

    /// Add a field to a previously declared record
    fn add_field(
        &mut self,
        construct: ConstructId,
        name: &str,
        ty: TypeRef,
        default: DefaultExpr,
    ) -> Result<()>;

    /// Add a method to a previously declared construct
    fn add_method(&mut self, construct: ConstructId, sig: MethodSig, body: MethodBody)
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_builder_preserves_order() {
        let mut body = MethodBody::new();
        body.line(Stmt::InitRecord)
            .open(BlockHeader::IfAttributePresent("Age".to_string()))
            .line(Stmt::FinishRecord)
            .close();
        assert_eq!(body.ops().len(), 4);
        assert!(matches!(body.ops()[0], BodyOp::Line(Stmt::InitRecord)));
        assert!(matches!(body.ops()[1], BodyOp::Open(_)));
        assert!(matches!(body.ops()[3], BodyOp::Close));
    }
}
