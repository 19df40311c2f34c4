#![allow(clippy::module_inception)]

use std::{path::PathBuf, rc::Rc};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// Source line and file name.
#[derive(Debug, Clone)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Listing written when the source comes from stdin.
pub const DEFAULT_OUTPUT: &str = "out.tm";

/// Driver settings, filled from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Trace every token and parsed construct.
    pub parser_debug: bool,
    /// Print the annotated tree after analysis.
    pub print_tree: bool,
    /// Include memory layout when printing the tree.
    pub print_memory: bool,
    /// Trace symbol table operations.
    pub symbol_table_debug: bool,
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl CompileOptions {
    /// `-o` when given, else the source with a `tm` extension, else
    /// [`DEFAULT_OUTPUT`].
    pub fn output_path(&self) -> PathBuf {
        match (&self.output, &self.source) {
            (Some(output), _) => output.clone(),
            (None, Some(source)) => source.with_extension("tm"),
            (None, None) => PathBuf::from(DEFAULT_OUTPUT),
        }
    }

    /// Whether the tree should be printed, with or without memory.
    pub fn prints_tree(&self) -> bool {
        self.print_tree || self.print_memory
    }

    /// `env_logger` filter for the requested tracing. `RUST_LOG` is applied
    /// on top by the binary.
    pub fn log_filters(&self) -> String {
        let mut filters = vec![String::from("warn")];
        if self.parser_debug {
            filters.push(String::from("cminus::lexer=trace"));
            filters.push(String::from("cminus::parser=trace"));
        }
        if self.symbol_table_debug {
            filters.push(String::from("cminus::type_checker::symbol_table=debug"));
        }
        filters.join(",")
    }
}

/// The text of 1-based `line` in `source`, if it exists.
pub fn get_line_at_position(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.lines().nth(line as usize - 1)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{get_line_at_position, CompileOptions};

    #[test]
    fn test_get_line_at_position() {
        let source = "int x;\nmain()\n{\n    x = #;\n}\n";

        assert_eq!(get_line_at_position(source, 1), Some("int x;"));
        assert_eq!(get_line_at_position(source, 4), Some("    x = #;"));
        assert_eq!(get_line_at_position(source, 0), None);
        assert_eq!(get_line_at_position(source, 9), None);
    }

    #[test]
    fn test_output_path() {
        let mut options = CompileOptions::default();
        assert_eq!(options.output_path(), PathBuf::from("out.tm"));

        options.source = Some(PathBuf::from("tests/fact.c-"));
        assert_eq!(options.output_path(), PathBuf::from("tests/fact.tm"));

        options.output = Some(PathBuf::from("build/a.tm"));
        assert_eq!(options.output_path(), PathBuf::from("build/a.tm"));
    }

    #[test]
    fn test_log_filters() {
        let mut options = CompileOptions::default();
        assert_eq!(options.log_filters(), "warn");

        options.parser_debug = true;
        options.symbol_table_debug = true;
        assert_eq!(
            options.log_filters(),
            "warn,cminus::lexer=trace,cminus::parser=trace,cminus::type_checker::symbol_table=debug"
        );
    }
}

pub fn display_error(error: &Error, source: &str) {
    /*
        Error: UnexpectedToken (Unexpected token: `;`, did you miss a semicolon?)
        -> fact.c-
           |
        20 | x = ;
           | ^
    */

    let position = error.get_position();

    if let ErrorTip::None = error.get_tip() {
        eprintln!("Error: {}", error.get_error_name());
    } else {
        eprintln!("Error: {} ({})", error.get_error_name(), error.get_tip());
    }
    eprintln!("-> {}", position.1);

    let Some(line_text) = get_line_at_position(source, position.0) else {
        return;
    };

    let line_string = position.0.to_string();
    let padding = line_string.len() + 2;
    let code = line_text.trim();

    eprintln!("{:>padding$}", "|");
    eprintln!("{} | {}", line_string, code);
    eprintln!("{:>padding$} {}", "|", "^".repeat(code.len().max(1)));
}
