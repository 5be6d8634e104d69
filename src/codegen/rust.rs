//! Rust source emission
//!
//! [`RustSink`] renders the symbolic emission vocabulary as Rust source.
//! Generated code reaches the `document`, `values`, and `error` modules of
//! this crate through a configurable crate path, and uses `chrono` types
//! for the date and time scalars. This is the only module that contains
//! Rust syntax; retargeting the generator means implementing [`CodeSink`]
//! for another language.

use crate::codegen::emit::{
    BlockHeader, BodyOp, CodeSink, ConstructId, ConstructKind, DefaultExpr, MethodBody, MethodSig,
    ScalarPlan, Stmt, TypeRef, ValuePlan,
};
use crate::error::{Error, Result};
use crate::schema::{OccurrenceRange, PredefinedType};

const DEFAULT_CRATE_PATH: &str = "stanzaschema";

/// Rust keywords that print with a raw-identifier prefix
const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Prelude spellings rendered code names without qualification
const PRELUDE_NAMES: &[&str] = &["Default", "Option", "String", "Vec"];

/// Rust implementation of the emission contract
#[derive(Debug)]
pub struct RustSink {
    crate_path: String,
    constructs: Vec<Construct>,
}

#[derive(Debug)]
struct Construct {
    name: String,
    kind: ConstructKind,
    fields: Vec<FieldDecl>,
    methods: Vec<Method>,
}

#[derive(Debug)]
struct FieldDecl {
    name: String,
    ty: TypeRef,
}

#[derive(Debug)]
struct Method {
    sig: MethodSig,
    body: MethodBody,
}

impl RustSink {
    /// Sink whose generated code names this crate as `stanzaschema`
    pub fn new() -> Self {
        Self::with_crate_path(DEFAULT_CRATE_PATH)
    }

    /// Sink whose generated code reaches this crate through `path`
    pub fn with_crate_path(path: impl Into<String>) -> Self {
        Self {
            crate_path: path.into(),
            constructs: Vec::new(),
        }
    }

    /// Render everything declared so far as one source file
    pub fn source(&self) -> Result<String> {
        let mut out = String::new();
        out.push_str("// Generated by stanzaschema. Do not edit.\n");
        for construct in &self.constructs {
            out.push('\n');
            match &construct.kind {
                ConstructKind::Enum { variants } => {
                    self.render_enum(construct, variants, &mut out)?
                }
                ConstructKind::Record => self.render_record(construct, &mut out)?,
            }
        }
        Ok(out)
    }

    fn construct(&self, id: ConstructId) -> Result<&Construct> {
        self.constructs
            .get(id.index())
            .ok_or_else(|| Error::Name(format!("construct #{} was never declared", id.index())))
    }

    fn construct_mut(&mut self, id: ConstructId) -> Result<&mut Construct> {
        self.constructs
            .get_mut(id.index())
            .ok_or_else(|| Error::Name(format!("construct #{} was never declared", id.index())))
    }

    fn construct_ident(&self, id: ConstructId) -> Result<String> {
        Ok(ident(&self.construct(id)?.name))
    }

    /// Reject a default a derived `Default` cannot reproduce
    fn check_default(&self, default: &DefaultExpr) -> Result<()> {
        match default {
            DefaultExpr::FirstVariant(id) => {
                if !matches!(self.construct(*id)?.kind, ConstructKind::Enum { .. }) {
                    return Err(Error::Unsupported(
                        "a first-variant default needs an enum construct".to_string(),
                    ));
                }
            }
            DefaultExpr::EmptyRecord(id) => {
                if !matches!(self.construct(*id)?.kind, ConstructKind::Record) {
                    return Err(Error::Unsupported(
                        "an empty-record default needs a record construct".to_string(),
                    ));
                }
            }
            DefaultExpr::ScalarZero(_) | DefaultExpr::Absent | DefaultExpr::EmptyList => {}
        }
        Ok(())
    }

    fn render_enum(
        &self,
        construct: &Construct,
        variants: &[(String, String)],
        out: &mut String,
    ) -> Result<()> {
        let name = ident(&construct.name);
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
        out.push_str(&format!("pub enum {} {{\n", name));
        for (_, variant) in variants {
            out.push_str(&format!("    {},\n", ident(variant)));
        }
        out.push_str("}\n");

        if let Some((_, first)) = variants.first() {
            out.push('\n');
            out.push_str(&format!("impl Default for {} {{\n", name));
            out.push_str("    fn default() -> Self {\n");
            out.push_str(&format!("        {}::{}\n", name, ident(first)));
            out.push_str("    }\n");
            out.push_str("}\n");
        }
        self.render_methods(construct, out)
    }

    fn render_record(&self, construct: &Construct, out: &mut String) -> Result<()> {
        let name = ident(&construct.name);
        out.push_str("#[derive(Debug, Clone, PartialEq, Default)]\n");
        out.push_str(&format!("pub struct {} {{\n", name));
        for field in &construct.fields {
            out.push_str(&format!(
                "    pub {}: {},\n",
                ident(&field.name),
                self.type_text(&field.ty)?
            ));
        }
        out.push_str("}\n");
        self.render_methods(construct, out)
    }

    fn render_methods(&self, construct: &Construct, out: &mut String) -> Result<()> {
        if construct.methods.is_empty() {
            return Ok(());
        }
        out.push('\n');
        out.push_str(&format!("impl {} {{\n", ident(&construct.name)));
        for (i, method) in construct.methods.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.render_method(method, out)?;
        }
        out.push_str("}\n");
        Ok(())
    }

    fn render_method(&self, method: &Method, out: &mut String) -> Result<()> {
        let p = &self.crate_path;
        let (doc, signature) = match method.sig {
            MethodSig::ParseLabel => (
                "/// Parse the label at a value position",
                format!(
                    "pub fn parse(attribute: &{}::document::Attribute, index: usize) -> {}::error::Result<Self>",
                    p, p
                ),
            ),
            MethodSig::FromValues => (
                "/// Read one group of positional values starting at `start`",
                format!(
                    "pub fn from_values(attribute: &{}::document::Attribute, start: usize) -> {}::error::Result<Self>",
                    p, p
                ),
            ),
            MethodSig::LoadNode => (
                "/// Load and validate one document node",
                format!(
                    "pub fn load(node: &{}::document::Node) -> {}::error::Result<Self>",
                    p, p
                ),
            ),
            MethodSig::ParseDocument => (
                "/// Parse a document text and load its root node",
                format!(
                    "pub fn parse_document(text: &str) -> {}::error::Result<Self>",
                    p
                ),
            ),
        };
        push_line(out, 1, doc);
        push_line(out, 1, &format!("{} {{", signature));
        let mut depth = 2usize;
        for op in method.body.ops() {
            match op {
                BodyOp::Line(stmt) => self.render_stmt(stmt, depth, out)?,
                BodyOp::Open(header) => {
                    self.render_header(header, depth, out);
                    depth += 1;
                }
                BodyOp::Close => {
                    depth = depth.saturating_sub(1);
                    push_line(out, depth, "}");
                }
            }
        }
        push_line(out, 1, "}");
        Ok(())
    }

    fn render_header(&self, header: &BlockHeader, depth: usize, out: &mut String) {
        let text = match header {
            BlockHeader::IfAttributePresent(name) => format!(
                "if let Some(attribute) = node.optional_attribute({})? {{",
                lit(name)
            ),
            BlockHeader::ForEachAttribute {
                name,
                at_least_one: true,
            } => format!(
                "for attribute in node.attributes_at_least_one({})? {{",
                lit(name)
            ),
            BlockHeader::ForEachAttribute {
                name,
                at_least_one: false,
            } => format!("for attribute in node.attributes_named({}) {{", lit(name)),
            BlockHeader::IfChildPresent(name) => {
                format!("if let Some(child) = node.optional_child({})? {{", lit(name))
            }
            BlockHeader::ForEachChild {
                name,
                at_least_one: true,
            } => format!("for child in node.children_at_least_one({})? {{", lit(name)),
            BlockHeader::ForEachChild {
                name,
                at_least_one: false,
            } => format!("for child in node.children_named({}) {{", lit(name)),
        };
        push_line(out, depth, &text);
    }

    fn render_stmt(&self, stmt: &Stmt, depth: usize, out: &mut String) -> Result<()> {
        match stmt {
            Stmt::AssertNodeName(name) => {
                push_line(out, depth, &format!("node.assert_name({})?;", lit(name)));
            }
            Stmt::AssertChildNames(names) => {
                push_line(
                    out,
                    depth,
                    &format!("node.assert_child_names(&[{}])?;", lit_list(names)),
                );
            }
            Stmt::AssertNoChildren => push_line(out, depth, "node.assert_no_children()?;"),
            Stmt::AssertAttributeNames(names) => {
                push_line(
                    out,
                    depth,
                    &format!("node.assert_attribute_names(&[{}])?;", lit_list(names)),
                );
            }
            Stmt::AssertNoAttributes => push_line(out, depth, "node.assert_no_attributes()?;"),
            Stmt::InitRecord => push_line(out, depth, "let mut out = Self::default();"),
            Stmt::BindRequiredAttribute(name) => {
                push_line(
                    out,
                    depth,
                    &format!("let attribute = node.required_attribute({})?;", lit(name)),
                );
            }
            Stmt::BindRequiredChild(name) => {
                push_line(
                    out,
                    depth,
                    &format!("let child = node.required_child({})?;", lit(name)),
                );
            }
            Stmt::SetFromChild {
                field,
                construct,
                optional,
            } => {
                let call = format!("{}::load(child)?", self.construct_ident(*construct)?);
                let expr = if *optional {
                    format!("Some({})", call)
                } else {
                    call
                };
                push_line(out, depth, &format!("out.{} = {};", ident(field), expr));
            }
            Stmt::PushFromChild { field, construct } => {
                push_line(
                    out,
                    depth,
                    &format!(
                        "out.{}.push({}::load(child)?);",
                        ident(field),
                        self.construct_ident(*construct)?
                    ),
                );
            }
            Stmt::SetFromAttribute {
                field,
                plan,
                optional,
            } => {
                self.render_conversion(plan, depth, out)?;
                let expr = if *optional { "Some(value)" } else { "value" };
                push_line(out, depth, &format!("out.{} = {};", ident(field), expr));
            }
            Stmt::PushFromAttribute { field, plan } => {
                self.render_conversion(plan, depth, out)?;
                push_line(out, depth, &format!("out.{}.push(value);", ident(field)));
            }
            Stmt::TakeValue {
                field,
                offset,
                scalar,
                nullable,
                required,
            } => self.render_take_value(field, *offset, *scalar, *nullable, *required, depth, out)?,
            Stmt::MatchLabel(id) => self.render_match_label(*id, depth, out)?,
            Stmt::ParseAndLoadRoot => {
                push_line(
                    out,
                    depth,
                    &format!("let root = {}::document::parse(text)?;", self.crate_path),
                );
                push_line(out, depth, "Self::load(&root)");
            }
            Stmt::FinishRecord => push_line(out, depth, "Ok(out)"),
        }
        Ok(())
    }

    fn render_match_label(&self, id: ConstructId, depth: usize, out: &mut String) -> Result<()> {
        let target = self.construct(id)?;
        let variants = match &target.kind {
            ConstructKind::Enum { variants } => variants,
            ConstructKind::Record => {
                return Err(Error::Unsupported(
                    "label matching needs an enum construct".to_string(),
                ))
            }
        };
        let name = ident(&target.name);
        push_line(out, depth, "match attribute.string(index)? {");
        for (label, variant) in variants {
            push_line(
                out,
                depth + 1,
                &format!("{} => Ok({}::{}),", lit(label), name, ident(variant)),
            );
        }
        push_line(
            out,
            depth + 1,
            &format!(
                "other => Err({}::error::Error::Value(format!(\"'{{}}' is not a valid {}\", other))),",
                self.crate_path, target.name
            ),
        );
        push_line(out, depth, "}");
        Ok(())
    }

    fn render_take_value(
        &self,
        field: &str,
        offset: usize,
        scalar: ScalarPlan,
        nullable: bool,
        required: bool,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        let index = if offset == 0 {
            "start".to_string()
        } else {
            format!("start + {}", offset)
        };
        let expr = self.scalar_expr(scalar, &index)?;
        let field = ident(field);
        match (required, nullable) {
            (true, false) => {
                push_line(out, depth, &format!("out.{} = {};", field, expr));
            }
            (true, true) => {
                push_line(
                    out,
                    depth,
                    &format!("if !attribute.string({})?.is_empty() {{", index),
                );
                push_line(out, depth + 1, &format!("out.{} = Some({});", field, expr));
                push_line(out, depth, "}");
            }
            (false, false) => {
                push_line(
                    out,
                    depth,
                    &format!("if {} < attribute.value_count() {{", index),
                );
                push_line(out, depth + 1, &format!("out.{} = {};", field, expr));
                push_line(out, depth, "}");
            }
            (false, true) => {
                push_line(
                    out,
                    depth,
                    &format!(
                        "if {} < attribute.value_count() && !attribute.string({})?.is_empty() {{",
                        index, index
                    ),
                );
                push_line(out, depth + 1, &format!("out.{} = Some({});", field, expr));
                push_line(out, depth, "}");
            }
        }
        Ok(())
    }

    /// Write the lines computing one attribute conversion into `value`
    fn render_conversion(&self, plan: &ValuePlan, depth: usize, out: &mut String) -> Result<()> {
        match plan.array {
            None => self.render_single(plan, depth, out),
            Some(bounds) => self.render_array(plan, bounds, depth, out),
        }
    }

    fn render_single(&self, plan: &ValuePlan, depth: usize, out: &mut String) -> Result<()> {
        if let ScalarPlan::Record { required, .. } = plan.scalar {
            let call = self.scalar_expr(plan.scalar, "0")?;
            let assert = format!(
                "attribute.assert_value_count_range({}, Some({}))?;",
                required, plan.width
            );
            if plan.nullable {
                push_line(
                    out,
                    depth,
                    "let value = if attribute.value_count() == 1 && attribute.string(0)?.is_empty() {",
                );
                push_line(out, depth + 1, "None");
                push_line(out, depth, "} else {");
                push_line(out, depth + 1, &assert);
                push_line(out, depth + 1, &format!("Some({})", call));
                push_line(out, depth, "};");
            } else {
                push_line(out, depth, &assert);
                push_line(out, depth, &format!("let value = {};", call));
            }
            return Ok(());
        }

        push_line(out, depth, "attribute.assert_value_count(1)?;");
        let expr = self.scalar_expr(plan.scalar, "0")?;
        if plan.nullable {
            push_line(out, depth, "let value = if attribute.string(0)?.is_empty() {");
            push_line(out, depth + 1, "None");
            push_line(out, depth, "} else {");
            push_line(out, depth + 1, &format!("Some({})", expr));
            push_line(out, depth, "};");
        } else {
            push_line(out, depth, &format!("let value = {};", expr));
        }
        Ok(())
    }

    fn render_array(
        &self,
        plan: &ValuePlan,
        bounds: OccurrenceRange,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        if plan.array_nullable {
            push_line(
                out,
                depth,
                "let value = if attribute.value_count() == 1 && attribute.string(0)?.is_empty() {",
            );
            push_line(out, depth + 1, "None");
            push_line(out, depth, "} else {");
            self.render_array_core(plan, bounds, depth + 1, out)?;
            push_line(out, depth + 1, "Some(items)");
            push_line(out, depth, "};");
        } else {
            self.render_array_core(plan, bounds, depth, out)?;
            push_line(out, depth, "let value = items;");
        }
        Ok(())
    }

    fn render_array_core(
        &self,
        plan: &ValuePlan,
        bounds: OccurrenceRange,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        let min = bounds.min() as usize * plan.width;
        let max_text = match bounds.max() {
            Some(max) => format!("Some({})", max as usize * plan.width),
            None => "None".to_string(),
        };
        push_line(
            out,
            depth,
            &format!(
                "attribute.assert_value_count_range({}, {})?;",
                min, max_text
            ),
        );
        if let ScalarPlan::Record { .. } = plan.scalar {
            push_line(
                out,
                depth,
                &format!("if attribute.value_count() % {} != 0 {{", plan.width),
            );
            push_line(
                out,
                depth + 1,
                &format!(
                    "return Err({}::error::Error::Value(format!(",
                    self.crate_path
                ),
            );
            push_line(
                out,
                depth + 2,
                &format!(
                    "\"attribute '{{}}' expects groups of {} values\",",
                    plan.width
                ),
            );
            push_line(out, depth + 2, "attribute.name");
            push_line(out, depth + 1, ")));");
            push_line(out, depth, "}");
            push_line(out, depth, "let mut items = Vec::new();");
            push_line(out, depth, "let mut start = 0;");
            push_line(out, depth, "while start < attribute.value_count() {");
            let call = self.scalar_expr(plan.scalar, "start")?;
            push_line(out, depth + 1, &format!("items.push({});", call));
            push_line(out, depth + 1, &format!("start += {};", plan.width));
            push_line(out, depth, "}");
        } else {
            push_line(out, depth, "let mut items = Vec::new();");
            push_line(out, depth, "for index in 0..attribute.value_count() {");
            let expr = self.scalar_expr(plan.scalar, "index")?;
            if plan.nullable {
                push_line(out, depth + 1, "if attribute.string(index)?.is_empty() {");
                push_line(out, depth + 2, "items.push(None);");
                push_line(out, depth + 1, "} else {");
                push_line(out, depth + 2, &format!("items.push(Some({}));", expr));
                push_line(out, depth + 1, "}");
            } else {
                push_line(out, depth + 1, &format!("items.push({});", expr));
            }
            push_line(out, depth, "}");
        }
        Ok(())
    }

    /// The expression converting the raw value at `index`
    fn scalar_expr(&self, plan: ScalarPlan, index: &str) -> Result<String> {
        let p = &self.crate_path;
        Ok(match plan {
            ScalarPlan::Predefined(kind) => match kind {
                PredefinedType::String => format!("attribute.string({})?.to_string()", index),
                PredefinedType::Bool => {
                    format!("{}::values::parse_bool(attribute.string({})?)?", p, index)
                }
                PredefinedType::Int => {
                    format!("{}::values::parse_int(attribute.string({})?)?", p, index)
                }
                PredefinedType::UInt => {
                    format!("{}::values::parse_uint(attribute.string({})?)?", p, index)
                }
                PredefinedType::Number => {
                    format!("{}::values::parse_number(attribute.string({})?)?", p, index)
                }
                PredefinedType::Date => {
                    format!("{}::values::parse_date(attribute.string({})?)?", p, index)
                }
                PredefinedType::Time => {
                    format!("{}::values::parse_time(attribute.string({})?)?", p, index)
                }
                PredefinedType::DateTime => {
                    format!("{}::values::parse_date_time(attribute.string({})?)?", p, index)
                }
                PredefinedType::Base64 => {
                    format!("{}::values::parse_base64(attribute.string({})?)?", p, index)
                }
            },
            ScalarPlan::Enum(id) => {
                format!("{}::parse(attribute, {})?", self.construct_ident(id)?, index)
            }
            ScalarPlan::Record { construct, .. } => format!(
                "{}::from_values(attribute, {})?",
                self.construct_ident(construct)?,
                index
            ),
        })
    }

    fn type_text(&self, ty: &TypeRef) -> Result<String> {
        Ok(match ty {
            TypeRef::Scalar(kind) => scalar_type(*kind).to_string(),
            TypeRef::Construct(id) => self.construct_ident(*id)?,
            TypeRef::Optional(inner) => format!("Option<{}>", self.type_text(inner)?),
            TypeRef::List(inner) => format!("Vec<{}>", self.type_text(inner)?),
        })
    }
}

impl Default for RustSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSink for RustSink {
    fn reserved_names(&self) -> &'static [&'static str] {
        PRELUDE_NAMES
    }

    fn declare(&mut self, name: &str, kind: ConstructKind) -> Result<ConstructId> {
        self.constructs.push(Construct {
            name: name.to_string(),
            kind,
            fields: Vec::new(),
            methods: Vec::new(),
        });
        Ok(ConstructId::new(self.constructs.len() - 1))
    }

    fn add_field(
        &mut self,
        construct: ConstructId,
        name: &str,
        ty: TypeRef,
        default: DefaultExpr,
    ) -> Result<()> {
        self.check_default(&default)?;
        let target = self.construct_mut(construct)?;
        if !matches!(target.kind, ConstructKind::Record) {
            return Err(Error::Unsupported(format!(
                "'{}' is not a record",
                target.name
            )));
        }
        target.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
        });
        Ok(())
    }

    fn add_method(
        &mut self,
        construct: ConstructId,
        sig: MethodSig,
        body: MethodBody,
    ) -> Result<()> {
        self.construct_mut(construct)?.methods.push(Method { sig, body });
        Ok(())
    }
}

/// The Rust type of a predefined scalar kind
fn scalar_type(kind: PredefinedType) -> &'static str {
    match kind {
        PredefinedType::Bool => "bool",
        PredefinedType::Int => "i64",
        PredefinedType::UInt => "u64",
        PredefinedType::Number => "f64",
        PredefinedType::String => "String",
        PredefinedType::Date => "chrono::NaiveDate",
        PredefinedType::Time => "chrono::NaiveTime",
        PredefinedType::DateTime => "chrono::NaiveDateTime",
        PredefinedType::Base64 => "Vec<u8>",
    }
}

/// Print a pool identifier, escaping Rust keywords
fn ident(name: &str) -> String {
    if matches!(name, "self" | "Self" | "super" | "crate" | "_") {
        format!("{}_", name)
    } else if RESERVED.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

fn lit(text: &str) -> String {
    format!("{:?}", text)
}

fn lit_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| lit(item))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str("    ");
    }
    out.push_str(text);
    out.push('\n');
}
