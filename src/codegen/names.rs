//! Identifier allocation
//!
//! Generated identifiers must be legal in the target language and unique
//! within their surrounding declaration. A [`NamePool`] hands out free
//! identifiers derived from schema names; a [`NameAllocator`] additionally
//! remembers, per schema entity, the identifier and declared construct it
//! was bound to.

use std::collections::{HashMap, HashSet};

use crate::codegen::emit::ConstructId;
use crate::error::{Error, Result};
use crate::schema::{ElementId, StructId, ValueTypeId};

/// Leading-letter convention of an allocated identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    /// Type and variant identifiers
    UpperFirst,
    /// Field identifiers
    LowerFirst,
}

/// Identity of a schema entity inside one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// A value type definition
    ValueType(ValueTypeId),
    /// A struct definition
    Struct(StructId),
    /// An element definition
    Element(ElementId),
}

/// Reduce a schema name to a bare identifier
///
/// Keeps ASCII letters, digits, and underscores; a leading digit gets an
/// underscore prefix, and a name with nothing usable becomes `unnamed`.
fn normalize(base: &str, case: Case) -> String {
    let mut cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        cleaned = "unnamed".to_string();
    }
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        cleaned.insert(0, '_');
    }
    let mut chars = cleaned.chars();
    let mut out = String::with_capacity(cleaned.len());
    if let Some(first) = chars.next() {
        if first.is_ascii_alphabetic() {
            match case {
                Case::UpperFirst => out.push(first.to_ascii_uppercase()),
                Case::LowerFirst => out.push(first.to_ascii_lowercase()),
            }
        } else {
            out.push(first);
        }
    }
    out.extend(chars);
    out
}

/// Hands out identifiers unique within one declaration space
#[derive(Debug, Default)]
pub struct NamePool {
    taken: HashSet<String>,
}

impl NamePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an exact spelling as taken without handing it out
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// Claim a free identifier derived from `base`
    ///
    /// The normalized base is tried first, then the suffixed forms
    /// `<base>2` through `<base>99` in order.
    pub fn claim(&mut self, base: &str, case: Case) -> Result<String> {
        let normalized = normalize(base, case);
        if self.taken.insert(normalized.clone()) {
            return Ok(normalized);
        }
        for suffix in 2..=99u32 {
            let candidate = format!("{}{}", normalized, suffix);
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(Error::Name(format!(
            "no free identifier left for '{}'",
            normalized
        )))
    }
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    construct: ConstructId,
}

/// Entity bindings of one generation run
///
/// Identifiers come from a single artifact-wide pool; the entity map is
/// write-once so every reference to an entity sees one stable binding.
#[derive(Debug, Default)]
pub struct NameAllocator {
    pool: NamePool,
    bindings: HashMap<EntityRef, Binding>,
}

impl NameAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a free artifact-level identifier without binding an entity
    pub fn claim(&mut self, base: &str, case: Case) -> Result<String> {
        self.pool.claim(base, case)
    }

    /// Mark an artifact-level spelling as taken
    pub fn reserve(&mut self, name: &str) {
        self.pool.reserve(name);
    }

    /// Bind an entity to its identifier and declared construct
    pub fn register(
        &mut self,
        entity: EntityRef,
        name: String,
        construct: ConstructId,
    ) -> Result<()> {
        if self.bindings.contains_key(&entity) {
            return Err(Error::Name(format!(
                "'{}' is already registered under another name",
                name
            )));
        }
        self.bindings.insert(entity, Binding { name, construct });
        Ok(())
    }

    /// The identifier an entity was bound to
    pub fn name_of(&self, entity: EntityRef) -> Result<&str> {
        self.binding(entity).map(|b| b.name.as_str())
    }

    /// The construct an entity was bound to
    pub fn construct_of(&self, entity: EntityRef) -> Result<ConstructId> {
        self.binding(entity).map(|b| b.construct)
    }

    fn binding(&self, entity: EntityRef) -> Result<&Binding> {
        self.bindings
            .get(&entity)
            .ok_or_else(|| Error::Name(format!("{:?} was never registered", entity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Person", Case::UpperFirst), "Person");
        assert_eq!(normalize("person name", Case::UpperFirst), "Personname");
        assert_eq!(normalize("first-name", Case::LowerFirst), "firstname");
        assert_eq!(normalize("3d", Case::UpperFirst), "_3d");
        assert_eq!(normalize("---", Case::LowerFirst), "unnamed");
        assert_eq!(normalize("Color", Case::LowerFirst), "color");
    }

    #[test]
    fn test_claim_suffixes_collisions() {
        let mut pool = NamePool::new();
        assert_eq!(pool.claim("Point", Case::UpperFirst).unwrap(), "Point");
        assert_eq!(pool.claim("Point", Case::UpperFirst).unwrap(), "Point2");
        assert_eq!(pool.claim("point", Case::UpperFirst).unwrap(), "Point3");
    }

    #[test]
    fn test_reserved_spellings_are_never_handed_out() {
        let mut pool = NamePool::new();
        pool.reserve("String");
        assert_eq!(pool.claim("String", Case::UpperFirst).unwrap(), "String2");
        assert_eq!(pool.claim("string", Case::UpperFirst).unwrap(), "String3");
    }

    #[test]
    fn test_claims_are_distinct_until_exhaustion() {
        let mut pool = NamePool::new();
        let mut seen = HashSet::new();
        for _ in 0..99 {
            let name = pool.claim("x", Case::LowerFirst).unwrap();
            assert!(seen.insert(name));
        }
        let err = pool.claim("x", Case::LowerFirst).unwrap_err();
        assert!(matches!(err, Error::Name(_)));
    }

    #[test]
    fn test_register_is_write_once() {
        let mut names = NameAllocator::new();
        let entity = EntityRef::Struct(StructId::for_tests(0));
        let construct = ConstructId::new(0);
        let name = names.claim("Point", Case::UpperFirst).unwrap();
        names.register(entity, name, construct).unwrap();
        assert_eq!(names.name_of(entity).unwrap(), "Point");
        assert_eq!(names.construct_of(entity).unwrap(), construct);

        let again = names.claim("Point", Case::UpperFirst).unwrap();
        let err = names.register(entity, again, construct).unwrap_err();
        assert!(matches!(err, Error::Name(_)));
    }

    #[test]
    fn test_unregistered_lookup_fails() {
        let names = NameAllocator::new();
        let err = names
            .name_of(EntityRef::Element(ElementId::for_tests(7)))
            .unwrap_err();
        assert!(matches!(err, Error::Name(_)));
    }
}
