//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts C- source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Line tracking for diagnostics
//! - `//` comments and whitespace

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
