//! Schema grammar names
//!
//! Node names, attribute names, and keyword tables of the schema document
//! grammar, shared by the loader and the serializer.

use crate::document::Attribute;
use crate::error::Result;
use crate::schema::occurs::OccurrenceRange;

/// Schema grammar node names
pub mod nodes {
    /// Document root
    pub const SCHEMA: &str = "Schema";
    /// Enumerated value type declaration
    pub const ENUM_TYPE: &str = "EnumType";
    /// Struct declaration
    pub const STRUCT: &str = "Struct";
    /// Named attribute declaration
    pub const ATTRIBUTE: &str = "Attribute";
    /// Element declaration
    pub const ELEMENT: &str = "Element";
    /// Nested definition scope of an element
    pub const DEFINITIONS: &str = "Definitions";
    /// Unordered element content
    pub const UNORDERED_CONTENT: &str = "UnorderedContent";
    /// List element content (named, unimplemented)
    pub const LIST_CONTENT: &str = "ListContent";
}

/// Schema grammar attribute names
pub mod attrs {
    /// Root element designation on the Schema node
    pub const ROOT_ELEMENT: &str = "RootElement";
    /// Entity name
    pub const NAME: &str = "Name";
    /// Enum labels
    pub const VALUES: &str = "Values";
    /// One struct value declaration
    pub const VALUE: &str = "Value";
    /// Data type string of an attribute declaration
    pub const DATA_TYPE: &str = "DataType";
    /// Child element entry in unordered content
    pub const ELEMENT: &str = "Element";
    /// Attribute entry in unordered content
    pub const ATTRIBUTE: &str = "Attribute";
}

/// Occurrence keywords, in grammar order
pub const OCCURRENCE_KEYWORDS: [&str; 4] = ["Required", "Optional", "Repeated+", "Repeated*"];

/// Requiredness labels of a struct value, in grammar order
pub const STRUCT_VALUE_MODES: [&str; 2] = ["Required", "Optional"];

/// Parse the occurrence keyword at `index` of an attribute's value list
pub fn parse_occurrence(attribute: &Attribute, index: usize) -> Result<OccurrenceRange> {
    let position = attribute.enum_index(&OCCURRENCE_KEYWORDS, index)?;
    Ok(match position {
        0 => OccurrenceRange::required(),
        1 => OccurrenceRange::optional(),
        2 => OccurrenceRange::repeated_plus(),
        _ => OccurrenceRange::repeated_star(),
    })
}

/// The keyword for a range matching one of the four grammar shapes
pub fn occurrence_keyword(range: &OccurrenceRange) -> Option<&'static str> {
    if range.is_required() {
        Some(OCCURRENCE_KEYWORDS[0])
    } else if range.is_optional() {
        Some(OCCURRENCE_KEYWORDS[1])
    } else if range.is_repeated_plus() {
        Some(OCCURRENCE_KEYWORDS[2])
    } else if range.is_repeated_star() {
        Some(OCCURRENCE_KEYWORDS[3])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_occurrence() {
        let attribute = Attribute::new(
            "Element",
            vec!["Child".to_string(), "Repeated+".to_string()],
        );
        let range = parse_occurrence(&attribute, 1).unwrap();
        assert!(range.is_repeated_plus());

        let bad = Attribute::new("Element", vec!["Child".to_string(), "Twice".to_string()]);
        assert!(parse_occurrence(&bad, 1).is_err());
    }

    #[test]
    fn test_occurrence_keyword_round_trip() {
        for keyword in OCCURRENCE_KEYWORDS {
            let attribute = Attribute::single("X", keyword);
            let range = parse_occurrence(&attribute, 0).unwrap();
            assert_eq!(occurrence_keyword(&range), Some(keyword));
        }
        assert_eq!(occurrence_keyword(&OccurrenceRange::fixed(3)), None);
    }
}
