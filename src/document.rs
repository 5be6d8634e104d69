//! Stanza document trees
//!
//! This module provides the generic document substrate: a tree of named
//! nodes carrying named, multi-valued attributes, together with the text
//! parser, the canonical writer, and the query methods the schema loader
//! and generated bindings are written against.
//!
//! The text form is line oriented. Each node is one line: the node name
//! followed by its attributes, nested children indented by exactly two
//! spaces per level:
//!
//! ```text
//! Person Name=Ada Age=36
//!   Address Street="12 Main St" City=Springfield
//! ```
//!
//! An attribute is `name=value,value,...`. A value is a bare token or a
//! double-quoted string with `\"`, `\\`, `\n` and `\t` escapes; the empty
//! value is written `""`. The same attribute name may appear several times
//! on one node. Lines whose first non-blank character is `#` are comments;
//! blank lines are ignored. A document has exactly one root node.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static NAME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Check if a string is a valid node or attribute name
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// Validate a node or attribute name and return an error if invalid
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("invalid name: '{}'", name)))
    }
}

/// A named attribute holding one or more string values
///
/// An attribute always carries at least one value; `name=` in text form is
/// a single empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute values, in written order
    pub values: Vec<String>,
}

impl Attribute {
    /// Create a new attribute with the given values
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a new attribute with a single value
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Number of values carried by this attribute
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Assert this attribute carries exactly `expected` values
    pub fn assert_value_count(&self, expected: usize) -> Result<()> {
        if self.values.len() != expected {
            return Err(Error::Grammar(format!(
                "attribute '{}' must have exactly {} value(s), found {}",
                self.name,
                expected,
                self.values.len()
            )));
        }
        Ok(())
    }

    /// Assert the value count lies in `min..=max`; `None` means unbounded
    pub fn assert_value_count_range(&self, min: usize, max: Option<usize>) -> Result<()> {
        let count = self.values.len();
        let ok = count >= min && max.map_or(true, |m| count <= m);
        if !ok {
            let expected = match max {
                Some(m) => format!("between {} and {}", min, m),
                None => format!("at least {}", min),
            };
            return Err(Error::Grammar(format!(
                "attribute '{}' must have {} value(s), found {}",
                self.name, expected, count
            )));
        }
        Ok(())
    }

    /// Get the value at position `index`
    pub fn string(&self, index: usize) -> Result<&str> {
        self.values.get(index).map(|s| s.as_str()).ok_or_else(|| {
            Error::Grammar(format!(
                "attribute '{}' has no value at position {}",
                self.name, index
            ))
        })
    }

    /// Get all values
    pub fn strings(&self) -> &[String] {
        &self.values
    }

    /// Resolve the value at `index` to its position in `allowed`
    pub fn enum_index(&self, allowed: &[&str], index: usize) -> Result<usize> {
        let value = self.string(index)?;
        allowed.iter().position(|label| *label == value).ok_or_else(|| {
            Error::Grammar(format!(
                "attribute '{}' value '{}' must be one of: {}",
                self.name,
                value,
                allowed.join(", ")
            ))
        })
    }
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node name
    pub name: String,
    /// Attributes, in written order; the same name may repeat
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new node with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get the node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an attribute
    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Append a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Assert the node carries the given name
    pub fn assert_name(&self, expected: &str) -> Result<()> {
        if self.name != expected {
            return Err(Error::Grammar(format!(
                "expected node '{}', found '{}'",
                expected, self.name
            )));
        }
        Ok(())
    }

    /// Assert every child name is one of `allowed`
    pub fn assert_child_names(&self, allowed: &[&str]) -> Result<()> {
        for child in &self.children {
            if !allowed.contains(&child.name.as_str()) {
                return Err(Error::Grammar(format!(
                    "unexpected child '{}' on node '{}'",
                    child.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Assert the node has no children at all
    pub fn assert_no_children(&self) -> Result<()> {
        if let Some(child) = self.children.first() {
            return Err(Error::Grammar(format!(
                "node '{}' permits no children, found '{}'",
                self.name, child.name
            )));
        }
        Ok(())
    }

    /// Assert every attribute name is one of `allowed`
    pub fn assert_attribute_names(&self, allowed: &[&str]) -> Result<()> {
        for attribute in &self.attributes {
            if !allowed.contains(&attribute.name.as_str()) {
                return Err(Error::Grammar(format!(
                    "unexpected attribute '{}' on node '{}'",
                    attribute.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Assert the node has no attributes at all
    pub fn assert_no_attributes(&self) -> Result<()> {
        if let Some(attribute) = self.attributes.first() {
            return Err(Error::Grammar(format!(
                "node '{}' permits no attributes, found '{}'",
                self.name, attribute.name
            )));
        }
        Ok(())
    }

    /// Fetch the single child with the given name; fails on zero or many
    pub fn required_child(&self, name: &str) -> Result<&Node> {
        match self.optional_child(name)? {
            Some(child) => Ok(child),
            None => Err(Error::Grammar(format!(
                "node '{}' requires exactly one '{}' child, found none",
                self.name, name
            ))),
        }
    }

    /// Fetch the child with the given name if present; fails on many
    pub fn optional_child(&self, name: &str) -> Result<Option<&Node>> {
        let mut found = self.children.iter().filter(|c| c.name == name);
        let first = found.next();
        if found.next().is_some() {
            return Err(Error::Grammar(format!(
                "node '{}' permits at most one '{}' child",
                self.name, name
            )));
        }
        Ok(first)
    }

    /// Iterate children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Collect children with the given name, failing if there are none
    pub fn children_at_least_one(&self, name: &str) -> Result<Vec<&Node>> {
        let found: Vec<&Node> = self.children.iter().filter(|c| c.name == name).collect();
        if found.is_empty() {
            return Err(Error::Grammar(format!(
                "node '{}' requires at least one '{}' child",
                self.name, name
            )));
        }
        Ok(found)
    }

    /// Fetch the single attribute with the given name; fails on zero or many
    pub fn required_attribute(&self, name: &str) -> Result<&Attribute> {
        match self.optional_attribute(name)? {
            Some(attribute) => Ok(attribute),
            None => Err(Error::Grammar(format!(
                "node '{}' requires attribute '{}'",
                self.name, name
            ))),
        }
    }

    /// Fetch the attribute with the given name if present; fails on many
    pub fn optional_attribute(&self, name: &str) -> Result<Option<&Attribute>> {
        let mut found = self.attributes.iter().filter(|a| a.name == name);
        let first = found.next();
        if found.next().is_some() {
            return Err(Error::Grammar(format!(
                "node '{}' permits at most one '{}' attribute",
                self.name, name
            )));
        }
        Ok(first)
    }

    /// Iterate attributes with the given name, in written order
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attribute> {
        self.attributes.iter().filter(move |a| a.name == name)
    }

    /// Collect attributes with the given name, failing if there are none
    pub fn attributes_at_least_one(&self, name: &str) -> Result<Vec<&Attribute>> {
        let found: Vec<&Attribute> = self.attributes.iter().filter(|a| a.name == name).collect();
        if found.is_empty() {
            return Err(Error::Grammar(format!(
                "node '{}' requires at least one '{}' attribute",
                self.name, name
            )));
        }
        Ok(found)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", write(self))
    }
}

// ========== Parsing ==========

/// Parse a document from text, returning its root node
pub fn parse(text: &str) -> Result<Node> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let unindented = raw.trim_start_matches(' ');
        let indent = raw.len() - unindented.len();
        let content = unindented.trim_end();
        if content.is_empty() {
            continue;
        }
        if content.starts_with('#') {
            continue;
        }
        if content.starts_with('\t') {
            return Err(Error::Grammar(format!(
                "line {}: tab indentation is not allowed",
                line_no
            )));
        }
        if indent % 2 != 0 {
            return Err(Error::Grammar(format!(
                "line {}: indentation must be a multiple of two spaces",
                line_no
            )));
        }
        let depth = indent / 2;
        if depth > stack.len() {
            return Err(Error::Grammar(format!(
                "line {}: indentation skips a level",
                line_no
            )));
        }
        while stack.len() > depth {
            close_top(&mut stack, &mut roots);
        }
        let node = parse_node_line(content, line_no)?;
        stack.push(node);
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    if roots.is_empty() {
        return Err(Error::Grammar("document is empty".to_string()));
    }
    if roots.len() > 1 {
        return Err(Error::Grammar(format!(
            "document must have exactly one root node, found {}",
            roots.len()
        )));
    }
    Ok(roots.remove(0))
}

fn close_top(stack: &mut Vec<Node>, roots: &mut Vec<Node>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.add_child(node),
            None => roots.push(node),
        }
    }
}

/// Parse one node line: name followed by `attr=value,value` groups
fn parse_node_line(line: &str, line_no: usize) -> Result<Node> {
    let mut rest = line;
    let name = take_name(&mut rest, line_no, "a node name")?;
    let mut node = Node::new(name);

    loop {
        rest = rest.trim_start_matches([' ', '\t']);
        if rest.is_empty() {
            break;
        }
        let attr_name = take_name(&mut rest, line_no, "an attribute name")?;
        rest = rest.strip_prefix('=').ok_or_else(|| {
            Error::Grammar(format!(
                "line {}: expected '=' after attribute '{}'",
                line_no, attr_name
            ))
        })?;
        let mut values = vec![take_value(&mut rest, line_no)?];
        while let Some(after) = rest.strip_prefix(',') {
            rest = after;
            values.push(take_value(&mut rest, line_no)?);
        }
        if let Some(next) = rest.chars().next() {
            if next != ' ' && next != '\t' {
                return Err(Error::Grammar(format!(
                    "line {}: unexpected character '{}'",
                    line_no, next
                )));
            }
        }
        node.push_attribute(Attribute::new(attr_name, values));
    }

    Ok(node)
}

fn take_name(rest: &mut &str, line_no: usize, what: &str) -> Result<String> {
    match NAME_PREFIX.find(rest) {
        Some(m) => {
            let name = rest[..m.end()].to_string();
            *rest = &rest[m.end()..];
            Ok(name)
        }
        None => Err(Error::Grammar(format!(
            "line {}: expected {}",
            line_no, what
        ))),
    }
}

fn take_value(rest: &mut &str, line_no: usize) -> Result<String> {
    if let Some(after) = rest.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = after.char_indices();
        loop {
            match chars.next() {
                Some((i, '"')) => {
                    *rest = &after[i + 1..];
                    return Ok(value);
                }
                Some((_, '\\')) => match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => {
                        return Err(Error::Grammar(format!(
                            "line {}: invalid escape '\\{}'",
                            line_no, other
                        )))
                    }
                    None => break,
                },
                Some((_, c)) => value.push(c),
                None => break,
            }
        }
        Err(Error::Grammar(format!(
            "line {}: unterminated quoted value",
            line_no
        )))
    } else {
        let end = rest
            .find([' ', '\t', '"', ',', '=', '#'])
            .unwrap_or(rest.len());
        let value = rest[..end].to_string();
        *rest = &rest[end..];
        Ok(value)
    }
}

// ========== Writing ==========

/// Write a node tree to canonical text
pub fn write(root: &Node) -> String {
    let mut out = String::new();
    write_node(root, 0, &mut out);
    out
}

fn write_node(node: &Node, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.name);
    for attribute in &node.attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push('=');
        for (i, value) in attribute.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_value(value, out);
        }
    }
    out.push('\n');
    for child in &node.children {
        write_node(child, depth + 1, out);
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ' ' | '\t' | '\n' | '"' | ',' | '=' | '#' | '\\'))
}

fn write_value(value: &str, out: &mut String) {
    if !needs_quoting(value) {
        out.push_str(value);
        return;
    }
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_tree() -> Node {
        let mut root = Node::new("Person");
        root.push_attribute(Attribute::single("Name", "Ada"));
        root.push_attribute(Attribute::single("Age", "36"));
        let mut address = Node::new("Address");
        address.push_attribute(Attribute::single("Street", "12 Main St"));
        address.push_attribute(Attribute::single("City", "Springfield"));
        root.add_child(address);
        root
    }

    #[test]
    fn test_parse_simple() {
        let root = parse("Person Name=Ada Age=36\n").unwrap();
        assert_eq!(root.name(), "Person");
        assert_eq!(root.attributes.len(), 2);
        assert_eq!(root.attributes[0].values, vec!["Ada"]);
    }

    #[test]
    fn test_parse_nested() {
        let text = "Person Name=Ada\n  Address City=Springfield\n    Geo Lat=1 Lon=2\n  Address City=Shelbyville\n";
        let root = parse(text).unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name(), "Address");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].name(), "Geo");
        assert_eq!(root.children[1].attributes[0].values, vec!["Shelbyville"]);
    }

    #[test]
    fn test_parse_multi_values_and_repeats() {
        let root = parse("Palette Color=Red,Green,Blue Color=Cyan\n").unwrap();
        assert_eq!(root.attributes.len(), 2);
        assert_eq!(root.attributes[0].values, vec!["Red", "Green", "Blue"]);
        assert_eq!(root.attributes[1].values, vec!["Cyan"]);
    }

    #[test]
    fn test_parse_quoted_and_empty_values() {
        let root = parse(r#"Note Text="a, b \"c\"" Tag="" List=1,,2"#).unwrap();
        assert_eq!(root.attributes[0].values, vec!["a, b \"c\""]);
        assert_eq!(root.attributes[1].values, vec![""]);
        assert_eq!(root.attributes[2].values, vec!["1", "", "2"]);
    }

    #[test]
    fn test_parse_comments_and_blanks() {
        let text = "# heading\n\nPerson Name=Ada\n  # nested comment\n  Address City=X\n";
        let root = parse(text).unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_parse_rejects_tabs_and_bad_indent() {
        assert!(matches!(parse("Root\n\tChild\n"), Err(Error::Grammar(_))));
        assert!(matches!(parse("Root\n Child\n"), Err(Error::Grammar(_))));
        assert!(matches!(parse("Root\n    Child\n"), Err(Error::Grammar(_))));
    }

    #[test]
    fn test_parse_rejects_multiple_roots() {
        let err = parse("A\nB\n").unwrap_err();
        assert!(format!("{}", err).contains("exactly one root"));
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        assert!(parse("# only a comment\n").is_err());
    }

    #[test]
    fn test_parse_rejects_unterminated_quote() {
        assert!(parse("Note Text=\"oops\n").is_err());
    }

    #[test]
    fn test_write_canonical() {
        let text = write(&person_tree());
        assert_eq!(
            text,
            "Person Name=Ada Age=36\n  Address Street=\"12 Main St\" City=Springfield\n"
        );
    }

    #[test]
    fn test_write_parse_round_trip() {
        let tree = person_tree();
        let reparsed = parse(&write(&tree)).unwrap();
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn test_round_trip_awkward_values() {
        let mut node = Node::new("Raw");
        node.push_attribute(Attribute::new(
            "V",
            vec![
                String::new(),
                "a b".to_string(),
                "x=y".to_string(),
                "q\"q".to_string(),
                "back\\slash".to_string(),
                "line\nbreak".to_string(),
                "#hash".to_string(),
            ],
        ));
        let reparsed = parse(&write(&node)).unwrap();
        assert_eq!(reparsed, node);
    }

    #[test]
    fn test_assert_name() {
        let node = Node::new("Person");
        assert!(node.assert_name("Person").is_ok());
        assert!(node.assert_name("Animal").is_err());
    }

    #[test]
    fn test_child_queries() {
        let root = person_tree();
        assert!(root.assert_child_names(&["Address"]).is_ok());
        assert!(root.assert_child_names(&["Other"]).is_err());
        assert!(root.required_child("Address").is_ok());
        assert!(root.required_child("Missing").is_err());
        assert!(root.optional_child("Missing").unwrap().is_none());
        assert_eq!(root.children_named("Address").count(), 1);
        assert!(root.children_at_least_one("Address").is_ok());
        assert!(root.children_at_least_one("Missing").is_err());
        assert!(Node::new("Leaf").assert_no_children().is_ok());
        assert!(root.assert_no_children().is_err());
    }

    #[test]
    fn test_attribute_queries() {
        let root = person_tree();
        assert!(root.assert_attribute_names(&["Name", "Age"]).is_ok());
        assert!(root.assert_attribute_names(&["Name"]).is_err());
        assert!(root.required_attribute("Name").is_ok());
        assert!(root.required_attribute("Missing").is_err());
        assert!(root.optional_attribute("Age").unwrap().is_some());
        assert!(Node::new("Bare").assert_no_attributes().is_ok());

        let multi = parse("Palette Color=Red Color=Green\n").unwrap();
        assert_eq!(multi.attributes_named("Color").count(), 2);
        assert!(multi.optional_attribute("Color").is_err());
        assert!(multi.attributes_at_least_one("Color").is_ok());
        assert!(multi.attributes_at_least_one("Shade").is_err());
    }

    #[test]
    fn test_query_results_borrow_only_the_node() {
        let root = parse("Person Name=Ada\n  Address City=X\n  Pet Name=Rex\n  Pet Name=Tom\n").unwrap();
        // the name strings die before the fetched references do
        let (address, pets, name, names) = {
            let child = String::from("Address");
            let repeated = String::from("Pet");
            let attr = String::from("Name");
            (
                root.optional_child(&child).unwrap(),
                root.children_at_least_one(&repeated).unwrap(),
                root.optional_attribute(&attr).unwrap(),
                root.attributes_at_least_one(&attr).unwrap(),
            )
        };
        assert_eq!(address.map(Node::name), Some("Address"));
        assert_eq!(pets.len(), 2);
        assert!(name.is_some());
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_value_queries() {
        let node = parse("Point V=1,2,3\n").unwrap();
        let attr = node.required_attribute("V").unwrap();
        assert_eq!(attr.value_count(), 3);
        assert!(attr.assert_value_count(3).is_ok());
        assert!(attr.assert_value_count(2).is_err());
        assert!(attr.assert_value_count_range(1, Some(3)).is_ok());
        assert!(attr.assert_value_count_range(4, None).is_err());
        assert_eq!(attr.string(1).unwrap(), "2");
        assert!(attr.string(5).is_err());
        assert_eq!(attr.strings(), &["1", "2", "3"]);
    }

    #[test]
    fn test_enum_index() {
        let node = parse("Rule Occurs=Optional\n").unwrap();
        let attr = node.required_attribute("Occurs").unwrap();
        let labels = ["Required", "Optional", "Repeated+", "Repeated*"];
        assert_eq!(attr.enum_index(&labels, 0).unwrap(), 1);
        let bad = parse("Rule Occurs=Sometimes\n").unwrap();
        let attr = bad.required_attribute("Occurs").unwrap();
        assert!(attr.enum_index(&labels, 0).is_err());
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("Person"));
        assert!(is_valid_name("_x9"));
        assert!(!is_valid_name("9x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
        assert!(validate_name("ok").is_ok());
        assert!(validate_name("not ok").is_err());
    }
}
