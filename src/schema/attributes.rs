//! Attribute definitions

use crate::error::{Error, Result};
use crate::schema::types::AttributeDataType;

/// A named attribute declaration
///
/// The data type is a write-once field: it is unset at declaration and
/// assigned exactly once during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    name: String,
    data_type: Option<AttributeDataType>,
}

impl AttributeDef {
    /// Create an attribute with no data type assigned yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    /// The attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data type, if assigned
    pub fn data_type(&self) -> Option<AttributeDataType> {
        self.data_type
    }

    /// Assign the data type; fails on a second assignment
    pub fn set_data_type(&mut self, data_type: AttributeDataType) -> Result<()> {
        if self.data_type.is_some() {
            return Err(Error::AlreadySet(format!(
                "data type of attribute '{}'",
                self.name
            )));
        }
        self.data_type = Some(data_type);
        Ok(())
    }
}
