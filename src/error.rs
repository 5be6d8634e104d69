//! Error types for stanzaschema
//!
//! This module defines all error types used throughout the library.
//! Every failure class raised by the document layer, the schema model,
//! the loader/serializer pair, and the code generator lives here.

use thiserror::Error;

/// Result type alias using stanzaschema Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stanzaschema operations
#[derive(Error, Debug)]
pub enum Error {
    /// Document shape violation (unexpected/missing node or attribute
    /// name, wrong value count)
    #[error("grammar violation: {0}")]
    Grammar(String),

    /// Name not found anywhere in the scope chain
    #[error("{kind} '{name}' is not defined in {scope}")]
    NotDefined {
        /// Entity kind searched for
        kind: &'static str,
        /// The name that was looked up
        name: String,
        /// Description of the scope the lookup started from
        scope: String,
    },

    /// Name collision in the local scope
    #[error("{kind} '{name}' is already defined in {scope}")]
    AlreadyDefined {
        /// Entity kind being registered
        kind: &'static str,
        /// The colliding name
        name: String,
        /// Description of the scope the registration targeted
        scope: String,
    },

    /// Second assignment of a write-once field
    #[error("{0} is already set")]
    AlreadySet(String),

    /// Invalid occurrence or array range
    #[error("invalid range: {0}")]
    Range(String),

    /// Invalid data-type combination
    #[error("invalid type combination: {0}")]
    TypeCombination(String),

    /// Named but unimplemented feature
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// No single root element can be chosen
    #[error("ambiguous root: {0}")]
    RootAmbiguous(String),

    /// No root element exists or the designated one is missing
    #[error("undefined root: {0}")]
    RootUndefined(String),

    /// Value error (invalid value for a type)
    #[error("value error: {0}")]
    Value(String),

    /// Name error (identifier allocation failure)
    #[error("name error: {0}")]
    Name(String),

    /// Contextual wrapper raised by top-level entry points
    #[error("failed to load {context}: {source}")]
    Load {
        /// What was being loaded when the failure occurred
        context: String,
        /// The underlying cause
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with loading context, as raised by top-level entry
    /// points. Already-wrapped errors are returned unchanged so a caller
    /// sees exactly one context layer.
    pub fn into_load_context(self, context: impl Into<String>) -> Error {
        match self {
            Error::Load { .. } => self,
            other => Error::Load {
                context: context.into(),
                source: Box::new(other),
            },
        }
    }
}
