// Generated by stanzaschema. Do not edit.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Default for Color {
    fn default() -> Self {
        Color::Red
    }
}

impl Color {
    /// Parse the label at a value position
    pub fn parse(attribute: &stanzaschema::document::Attribute, index: usize) -> stanzaschema::error::Result<Self> {
        match attribute.string(index)? {
            "Red" => Ok(Color::Red),
            "Green" => Ok(Color::Green),
            "Blue" => Ok(Color::Blue),
            other => Err(stanzaschema::error::Error::Value(format!("'{}' is not a valid Color", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Read one group of positional values starting at `start`
    pub fn from_values(attribute: &stanzaschema::document::Attribute, start: usize) -> stanzaschema::error::Result<Self> {
        let mut out = Self::default();
        out.x = stanzaschema::values::parse_number(attribute.string(start)?)?;
        out.y = stanzaschema::values::parse_number(attribute.string(start + 1)?)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pet {
    pub name: String,
}

impl Pet {
    /// Load and validate one document node
    pub fn load(node: &stanzaschema::document::Node) -> stanzaschema::error::Result<Self> {
        node.assert_name("Pet")?;
        node.assert_no_children()?;
        node.assert_attribute_names(&["Name"])?;
        let mut out = Self::default();
        let attribute = node.required_attribute("Name")?;
        attribute.assert_value_count(1)?;
        let value = attribute.string(0)?.to_string();
        out.name = value;
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Person {
    pub pet: Vec<Pet>,
    pub name: String,
    pub age: Option<Option<i64>>,
    pub eyes: Color,
    pub home: Option<Point>,
    pub scores: Option<Vec<i64>>,
}

impl Person {
    /// Load and validate one document node
    pub fn load(node: &stanzaschema::document::Node) -> stanzaschema::error::Result<Self> {
        node.assert_name("Person")?;
        node.assert_child_names(&["Pet"])?;
        node.assert_attribute_names(&["Name", "Age", "Eyes", "Home", "Scores"])?;
        let mut out = Self::default();
        for child in node.children_named("Pet") {
            out.pet.push(Pet::load(child)?);
        }
        let attribute = node.required_attribute("Name")?;
        attribute.assert_value_count(1)?;
        let value = attribute.string(0)?.to_string();
        out.name = value;
        if let Some(attribute) = node.optional_attribute("Age")? {
            attribute.assert_value_count(1)?;
            let value = if attribute.string(0)?.is_empty() {
                None
            } else {
                Some(stanzaschema::values::parse_int(attribute.string(0)?)?)
            };
            out.age = Some(value);
        }
        let attribute = node.required_attribute("Eyes")?;
        attribute.assert_value_count(1)?;
        let value = Color::parse(attribute, 0)?;
        out.eyes = value;
        if let Some(attribute) = node.optional_attribute("Home")? {
            attribute.assert_value_count_range(2, Some(2))?;
            let value = Point::from_values(attribute, 0)?;
            out.home = Some(value);
        }
        if let Some(attribute) = node.optional_attribute("Scores")? {
            attribute.assert_value_count_range(0, None)?;
            let mut items = Vec::new();
            for index in 0..attribute.value_count() {
                items.push(stanzaschema::values::parse_int(attribute.string(index)?)?);
            }
            let value = items;
            out.scores = Some(value);
        }
        Ok(out)
    }

    /// Parse a document text and load its root node
    pub fn parse_document(text: &str) -> stanzaschema::error::Result<Self> {
        let root = stanzaschema::document::parse(text)?;
        Self::load(&root)
    }
}
