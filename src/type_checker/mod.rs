//! Semantic analysis.
//!
//! A single depth-first walk over the syntax tree that:
//!
//! - Resolves identifiers and calls through nested scopes
//! - Types every expression and checks statements against their rules
//! - Assigns a storage class and offset to every declaration
//! - Reports semantic errors and warnings to a `Diagnostics` sink
//!
//! The annotated tree is what the code generator consumes.

pub mod builtins;
pub mod operators;
pub mod symbol_table;
pub mod type_checker;
