//! Code generation for the TM virtual machine.
//!
//! This module turns an analysed syntax tree into a TM assembly listing. It
//! handles:
//!
//! - Instruction formatting and backpatching of forward jumps
//! - Frame and temporary management for expressions and calls
//! - The built-in I/O routines and the init block that runs `main`
//! - Writing the finished listing to disk

pub mod compiler;
pub mod emitter;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
