//! Code generation
//!
//! Walks a schema in dependency order and emits one construct per enum,
//! struct, and element, together with the loading logic that validates a
//! document instance against the schema. All emission goes through the
//! [`CodeSink`] contract; the generator itself knows no target syntax.
//!
//! Order matters: every scope's value types are generated first (root
//! scope, then each element's nested scope, depth-first), then all
//! structs, then all elements. Element generation is two-phase: every
//! element record is declared before any load body is emitted, so
//! self-references and references across scopes always resolve.

pub mod emit;
pub mod names;
pub mod rust;

pub use emit::{
    BlockHeader, BodyOp, CodeSink, ConstructId, ConstructKind, DefaultExpr, MethodBody, MethodSig,
    ScalarPlan, Stmt, TypeRef, ValuePlan,
};
pub use names::{Case, EntityRef, NameAllocator, NamePool};
pub use rust::RustSink;

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::schema::{
    AttributeBaseType, AttributeDataType, ElementContent, ElementId, OccurrenceRange, Schema,
    ScopeId, StructId, StructValueType, UnorderedContent, ValueTypeDef, ValueTypeId,
};

/// Generate bindings for a schema through a sink
pub fn generate(schema: &Schema, sink: &mut dyn CodeSink) -> Result<()> {
    Generator::new(schema).run(sink)
}

/// The four occurrence shapes an entry may take in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Required,
    Optional,
    Plus,
    Star,
}

impl Shape {
    fn of(occurs: OccurrenceRange) -> Result<Self> {
        if occurs.is_required() {
            Ok(Shape::Required)
        } else if occurs.is_optional() {
            Ok(Shape::Optional)
        } else if occurs.is_repeated_plus() {
            Ok(Shape::Plus)
        } else if occurs.is_repeated_star() {
            Ok(Shape::Star)
        } else {
            Err(Error::Unsupported(format!(
                "occurrence {}..{} has no generated form",
                occurs.min(),
                occurs
                    .max()
                    .map_or_else(|| "*".to_string(), |m| m.to_string())
            )))
        }
    }
}

struct Generator<'a> {
    schema: &'a Schema,
    names: NameAllocator,
}

impl<'a> Generator<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            names: NameAllocator::new(),
        }
    }

    fn run(&mut self, sink: &mut dyn CodeSink) -> Result<()> {
        let schema = self.schema;
        check_containment_cycles(schema)?;
        for name in sink.reserved_names() {
            self.names.reserve(name);
        }
        let scopes = scopes_in_order(schema);

        for &scope in &scopes {
            for (_, id) in schema.definitions(scope).value_types().iter() {
                self.declare_enum(id, sink)?;
            }
        }
        for &scope in &scopes {
            for (_, id) in schema.definitions(scope).structs().iter() {
                self.declare_struct(id, sink)?;
            }
        }
        for &scope in &scopes {
            for (_, id) in schema.definitions(scope).elements().iter() {
                self.declare_element(id, sink)?;
            }
        }

        let root = schema.resolve_root_element().ok();
        for &scope in &scopes {
            for (_, id) in schema.definitions(scope).elements().iter() {
                self.emit_element(id, root == Some(id), sink)?;
            }
        }
        Ok(())
    }

    fn declare_enum(&mut self, id: ValueTypeId, sink: &mut dyn CodeSink) -> Result<()> {
        let ValueTypeDef::Enum(def) = self.schema.value_type(id);
        let name = self.names.claim(def.name(), Case::UpperFirst)?;
        let mut variant_pool = NamePool::new();
        let variants = def
            .values()
            .iter()
            .map(|label| Ok((label.clone(), variant_pool.claim(label, Case::UpperFirst)?)))
            .collect::<Result<Vec<_>>>()?;
        let construct = sink.declare(&name, ConstructKind::Enum { variants })?;
        self.names
            .register(EntityRef::ValueType(id), name, construct)?;

        let mut body = MethodBody::new();
        body.line(Stmt::MatchLabel(construct));
        sink.add_method(construct, MethodSig::ParseLabel, body)
    }

    fn declare_struct(&mut self, id: StructId, sink: &mut dyn CodeSink) -> Result<()> {
        let def = self.schema.struct_def(id);
        let name = self.names.claim(def.name(), Case::UpperFirst)?;
        let construct = sink.declare(&name, ConstructKind::Record)?;
        self.names.register(EntityRef::Struct(id), name, construct)?;

        let mut fields = NamePool::new();
        let mut body = MethodBody::new();
        body.line(Stmt::InitRecord);
        for (offset, value) in def.values().iter().enumerate() {
            let field = fields.claim(value.name(), Case::LowerFirst)?;
            let (scalar, base_ty, base_default) = match value.value_type() {
                StructValueType::Predefined(kind) => (
                    ScalarPlan::Predefined(kind),
                    TypeRef::Scalar(kind),
                    DefaultExpr::ScalarZero(kind),
                ),
                StructValueType::Value(value_type) => {
                    let target = self.names.construct_of(EntityRef::ValueType(value_type))?;
                    (
                        ScalarPlan::Enum(target),
                        TypeRef::Construct(target),
                        DefaultExpr::FirstVariant(target),
                    )
                }
            };
            let (ty, default) = if value.is_nullable() {
                (TypeRef::Optional(Box::new(base_ty)), DefaultExpr::Absent)
            } else {
                (base_ty, base_default)
            };
            sink.add_field(construct, &field, ty, default)?;
            body.line(Stmt::TakeValue {
                field,
                offset,
                scalar,
                nullable: value.is_nullable(),
                required: !value.is_optional(),
            });
        }
        body.line(Stmt::FinishRecord);
        sink.add_method(construct, MethodSig::FromValues, body)
    }

    fn declare_element(&mut self, id: ElementId, sink: &mut dyn CodeSink) -> Result<()> {
        let name = self
            .names
            .claim(self.schema.element(id).name(), Case::UpperFirst)?;
        let construct = sink.declare(&name, ConstructKind::Record)?;
        self.names.register(EntityRef::Element(id), name, construct)
    }

    fn emit_element(&mut self, id: ElementId, is_root: bool, sink: &mut dyn CodeSink) -> Result<()> {
        let schema = self.schema;
        let element = schema.element(id);
        let construct = self.names.construct_of(EntityRef::Element(id))?;
        let content = match element.content() {
            Some(ElementContent::Unordered(content)) => content,
            Some(ElementContent::Ordered) => {
                return Err(Error::Unsupported(format!(
                    "element '{}' has ordered content",
                    element.name()
                )))
            }
            Some(ElementContent::List) => {
                return Err(Error::Unsupported(format!(
                    "element '{}' has list content",
                    element.name()
                )))
            }
            None => {
                return Err(Error::Grammar(format!(
                    "element '{}' has no content model",
                    element.name()
                )))
            }
        };

        let mut body = MethodBody::new();
        body.line(Stmt::AssertNodeName(element.name().to_string()));
        if content.element_count() == 0 {
            body.line(Stmt::AssertNoChildren);
        } else {
            let allowed = content.element_entries().map(|(n, _)| n.to_string()).collect();
            body.line(Stmt::AssertChildNames(allowed));
        }
        if content.attribute_count() == 0 {
            body.line(Stmt::AssertNoAttributes);
        } else {
            let allowed = content
                .attribute_entries()
                .map(|(n, _)| n.to_string())
                .collect();
            body.line(Stmt::AssertAttributeNames(allowed));
        }
        body.line(Stmt::InitRecord);

        let mut fields = NamePool::new();
        self.emit_child_entries(content, &mut fields, &mut body, construct, sink)?;
        self.emit_attribute_entries(content, &mut fields, &mut body, construct, sink)?;

        body.line(Stmt::FinishRecord);
        sink.add_method(construct, MethodSig::LoadNode, body)?;

        if is_root {
            let mut body = MethodBody::new();
            body.line(Stmt::ParseAndLoadRoot);
            sink.add_method(construct, MethodSig::ParseDocument, body)?;
        }
        Ok(())
    }

    fn emit_child_entries(
        &mut self,
        content: &UnorderedContent,
        fields: &mut NamePool,
        body: &mut MethodBody,
        construct: ConstructId,
        sink: &mut dyn CodeSink,
    ) -> Result<()> {
        for (entry_name, entry) in content.element_entries() {
            let field = fields.claim(entry_name, Case::LowerFirst)?;
            let child = self.names.construct_of(EntityRef::Element(entry.element))?;
            let shape = Shape::of(entry.occurs)?;
            let (ty, default) = match shape {
                Shape::Required => (TypeRef::Construct(child), DefaultExpr::EmptyRecord(child)),
                Shape::Optional => (
                    TypeRef::Optional(Box::new(TypeRef::Construct(child))),
                    DefaultExpr::Absent,
                ),
                Shape::Plus | Shape::Star => (
                    TypeRef::List(Box::new(TypeRef::Construct(child))),
                    DefaultExpr::EmptyList,
                ),
            };
            sink.add_field(construct, &field, ty, default)?;

            match shape {
                Shape::Required => {
                    body.line(Stmt::BindRequiredChild(entry_name.to_string()));
                    body.line(Stmt::SetFromChild {
                        field,
                        construct: child,
                        optional: false,
                    });
                }
                Shape::Optional => {
                    body.open(BlockHeader::IfChildPresent(entry_name.to_string()));
                    body.line(Stmt::SetFromChild {
                        field,
                        construct: child,
                        optional: true,
                    });
                    body.close();
                }
                Shape::Plus | Shape::Star => {
                    body.open(BlockHeader::ForEachChild {
                        name: entry_name.to_string(),
                        at_least_one: shape == Shape::Plus,
                    });
                    body.line(Stmt::PushFromChild {
                        field,
                        construct: child,
                    });
                    body.close();
                }
            }
        }
        Ok(())
    }

    fn emit_attribute_entries(
        &mut self,
        content: &UnorderedContent,
        fields: &mut NamePool,
        body: &mut MethodBody,
        construct: ConstructId,
        sink: &mut dyn CodeSink,
    ) -> Result<()> {
        for (entry_name, entry) in content.attribute_entries() {
            let field = fields.claim(entry_name, Case::LowerFirst)?;
            let def = self.schema.attribute(entry.target.attribute());
            let data_type = def.data_type().ok_or_else(|| {
                Error::Grammar(format!("attribute '{}' has no data type", def.name()))
            })?;
            let shape = Shape::of(entry.occurs)?;
            let plan = self.value_plan(entry_name, data_type)?;
            let (ty, default) = field_type(&plan, shape);
            sink.add_field(construct, &field, ty, default)?;

            match shape {
                Shape::Required => {
                    body.line(Stmt::BindRequiredAttribute(entry_name.to_string()));
                    body.line(Stmt::SetFromAttribute {
                        field,
                        plan,
                        optional: false,
                    });
                }
                Shape::Optional => {
                    body.open(BlockHeader::IfAttributePresent(entry_name.to_string()));
                    body.line(Stmt::SetFromAttribute {
                        field,
                        plan,
                        optional: true,
                    });
                    body.close();
                }
                Shape::Plus | Shape::Star => {
                    body.open(BlockHeader::ForEachAttribute {
                        name: entry_name.to_string(),
                        at_least_one: shape == Shape::Plus,
                    });
                    body.line(Stmt::PushFromAttribute { field, plan });
                    body.close();
                }
            }
        }
        Ok(())
    }

    /// Build the conversion plan for one attribute data type
    fn value_plan(&self, attribute_name: &str, data_type: AttributeDataType) -> Result<ValuePlan> {
        let (scalar, width) = match data_type.base() {
            AttributeBaseType::Predefined(kind) => (ScalarPlan::Predefined(kind), 1),
            AttributeBaseType::Value(id) => (
                ScalarPlan::Enum(self.names.construct_of(EntityRef::ValueType(id))?),
                1,
            ),
            AttributeBaseType::Struct(id) => {
                let def = self.schema.struct_def(id);
                if data_type.array().is_some() {
                    if data_type.is_nullable() {
                        return Err(Error::Unsupported(format!(
                            "attribute '{}': an array of nullable struct values has no positional form",
                            attribute_name
                        )));
                    }
                    if def.values().is_empty() {
                        return Err(Error::Unsupported(format!(
                            "attribute '{}': an array of '{}' needs at least one struct value",
                            attribute_name,
                            def.name()
                        )));
                    }
                }
                (
                    ScalarPlan::Record {
                        construct: self.names.construct_of(EntityRef::Struct(id))?,
                        required: def.required_count(),
                    },
                    def.values().len(),
                )
            }
        };
        Ok(ValuePlan {
            scalar,
            nullable: data_type.is_nullable(),
            array: data_type.array(),
            array_nullable: data_type.is_array_nullable(),
            width,
        })
    }
}

/// Field type and default for an attribute entry, from the inside out:
/// base, base nullability, array, array nullability, then occurrence
fn field_type(plan: &ValuePlan, shape: Shape) -> (TypeRef, DefaultExpr) {
    let mut ty = match plan.scalar {
        ScalarPlan::Predefined(kind) => TypeRef::Scalar(kind),
        ScalarPlan::Enum(c) | ScalarPlan::Record { construct: c, .. } => TypeRef::Construct(c),
    };
    let mut default = match plan.scalar {
        ScalarPlan::Predefined(kind) => DefaultExpr::ScalarZero(kind),
        ScalarPlan::Enum(c) => DefaultExpr::FirstVariant(c),
        ScalarPlan::Record { construct, .. } => DefaultExpr::EmptyRecord(construct),
    };
    if plan.nullable {
        ty = TypeRef::Optional(Box::new(ty));
        default = DefaultExpr::Absent;
    }
    if plan.array.is_some() {
        ty = TypeRef::List(Box::new(ty));
        default = DefaultExpr::EmptyList;
    }
    if plan.array_nullable {
        ty = TypeRef::Optional(Box::new(ty));
        default = DefaultExpr::Absent;
    }
    match shape {
        Shape::Required => (ty, default),
        Shape::Optional => (TypeRef::Optional(Box::new(ty)), DefaultExpr::Absent),
        Shape::Plus | Shape::Star => (TypeRef::List(Box::new(ty)), DefaultExpr::EmptyList),
    }
}

/// Every scope in generation order: a scope before its elements' nested
/// scopes, elements in declaration order
fn scopes_in_order(schema: &Schema) -> Vec<ScopeId> {
    let mut out = Vec::new();
    collect_scopes(schema, schema.root_scope(), &mut out);
    out
}

fn collect_scopes(schema: &Schema, scope: ScopeId, out: &mut Vec<ScopeId>) {
    out.push(scope);
    for (_, id) in schema.definitions(scope).elements().iter() {
        collect_scopes(schema, schema.element(id).scope(), out);
    }
}

/// Fail on containment cycles: an element reached from itself through
/// required and optional entries alone would nest records without limit
fn check_containment_cycles(schema: &Schema) -> Result<()> {
    let mut in_progress = HashSet::new();
    let mut done = HashSet::new();
    for &scope in &scopes_in_order(schema) {
        for (_, id) in schema.definitions(scope).elements().iter() {
            visit_containment(schema, id, &mut in_progress, &mut done)?;
        }
    }
    Ok(())
}

fn visit_containment(
    schema: &Schema,
    id: ElementId,
    in_progress: &mut HashSet<ElementId>,
    done: &mut HashSet<ElementId>,
) -> Result<()> {
    if done.contains(&id) {
        return Ok(());
    }
    if !in_progress.insert(id) {
        return Err(Error::Unsupported(format!(
            "element '{}' contains itself through required or optional entries",
            schema.element(id).name()
        )));
    }
    if let Some(ElementContent::Unordered(content)) = schema.element(id).content() {
        for (_, entry) in content.element_entries() {
            if entry.occurs.is_required() || entry.occurs.is_optional() {
                visit_containment(schema, entry.element, in_progress, done)?;
            }
        }
    }
    in_progress.remove(&id);
    done.insert(id);
    Ok(())
}
