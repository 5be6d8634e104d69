//! # stanzaschema
//!
//! A schema compiler for the stanza structured text format: parse schema
//! documents into a typed model, render them back to canonical text, and
//! generate Rust bindings that load document instances into plain structs
//! and enums.
//!
//! ## Features
//!
//! - Indentation-based document parsing and rendering
//! - Schema loading with chained definition scopes
//! - Enum types, positional structs, and typed attributes
//! - Occurrence and nullability algebra for attribute data types
//! - Canonical schema serialization
//! - Rust binding generation through a retargetable sink
//!
//! ## Example
//!
//! ```rust,ignore
//! use stanzaschema::{generate, load_schema, RustSink};
//!
//! let schema = load_schema(&std::fs::read_to_string("person.schema")?)?;
//! let mut sink = RustSink::new();
//! generate(&schema, &mut sink)?;
//! std::fs::write("person.rs", sink.source()?)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codegen;
pub mod document;
pub mod error;
pub mod schema;
pub mod values;

// Re-exports for convenience
pub use codegen::{generate, CodeSink, RustSink};
pub use error::{Error, Result};
pub use schema::{load_schema, schema_from_node, schema_to_node, schema_to_string, Schema};

/// Version of the stanzaschema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
