//! Parser module for building the program tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into the arena-backed syntax tree. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Declaration parsing (variables, arrays, functions, parameter groups)
//! - Statement parsing (compound, if, while, for, return, break)
//! - Expression parsing (binary ops, assignments, calls, indexing, literals)
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;

#[cfg(test)]
mod tests;
