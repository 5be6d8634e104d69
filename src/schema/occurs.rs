//! Occurrence ranges
//!
//! Cardinality constraints used by element content entries and by array
//! bounds in attribute data types. A range is a minimum count plus an
//! optional maximum, `None` meaning unbounded.

use crate::error::{Error, Result};

/// Occurrence bounds (min, max); `None` for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceRange {
    min: u32,
    max: Option<u32>,
}

impl OccurrenceRange {
    /// Create new occurrence bounds
    ///
    /// An unset minimum normalizes to 0, so "zero or more" has exactly one
    /// encoding. Fails if both bounds are present and `max < min`.
    pub fn new(min: Option<u32>, max: Option<u32>) -> Result<Self> {
        let min = min.unwrap_or(0);
        if let Some(max_value) = max {
            if max_value < min {
                return Err(Error::Range(format!(
                    "max {} is less than min {}",
                    max_value, min
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Exactly once (1, 1)
    pub fn required() -> Self {
        Self {
            min: 1,
            max: Some(1),
        }
    }

    /// Zero or one (0, 1)
    pub fn optional() -> Self {
        Self {
            min: 0,
            max: Some(1),
        }
    }

    /// One or more (1, unbounded)
    pub fn repeated_plus() -> Self {
        Self { min: 1, max: None }
    }

    /// Zero or more (0, unbounded)
    pub fn repeated_star() -> Self {
        Self { min: 0, max: None }
    }

    /// Exactly `n` times (n, n)
    pub fn fixed(n: u32) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Minimum number of occurrences
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Maximum number of occurrences (None = unbounded)
    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Check if the range has no upper bound
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Check for the (1, 1) shape
    pub fn is_required(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// Check for the (0, 1) shape
    pub fn is_optional(&self) -> bool {
        self.min == 0 && self.max == Some(1)
    }

    /// Check for the (1, unbounded) shape
    pub fn is_repeated_plus(&self) -> bool {
        self.min == 1 && self.max.is_none()
    }

    /// Check for the (0, unbounded) shape
    pub fn is_repeated_star(&self) -> bool {
        self.min == 0 && self.max.is_none()
    }

    /// The fixed size when min and max coincide
    pub fn fixed_size(&self) -> Option<u32> {
        match self.max {
            Some(max) if max == self.min => Some(max),
            _ => None,
        }
    }

    /// Check if a count satisfies the range
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl Default for OccurrenceRange {
    fn default() -> Self {
        Self::required()
    }
}
