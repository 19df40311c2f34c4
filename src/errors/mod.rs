//! Error types and diagnostic reporting for the compiler.
//!
//! Two separate channels live here:
//!
//! - `errors`: the `Error` value returned through `Result` when a stage
//!   cannot continue (syntax errors, broken tree contracts, file access)
//! - `diagnostics`: the sink for semantic errors and warnings, which never
//!   stop analysis but decide whether code generation runs

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
