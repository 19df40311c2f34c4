use std::fmt::Display;

use crate::errors::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Where a diagnostic is anchored: a source line, or the link step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Line(i32),
    Linker,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };

        match self.location {
            Location::Line(line) => write!(f, "{}({}): {}", label, line, self.message),
            Location::Linker => write!(f, "{}(LINKER): {}", label, self.message),
        }
    }
}

/// Collects user-facing semantic errors and warnings.
///
/// Every diagnostic is printed the moment it is reported when `echo` is on,
/// so output order follows the analysis traversal.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    echo: bool,
    entries: Vec<Diagnostic>,
    errors: u32,
    warnings: u32,
}

impl Diagnostics {
    pub fn new(echo: bool) -> Self {
        Diagnostics {
            echo,
            entries: vec![],
            errors: 0,
            warnings: 0,
        }
    }

    /// A sink that only records, for tests and library callers.
    pub fn quiet() -> Self {
        Diagnostics::new(false)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.echo {
            println!("{}", diagnostic);
        }

        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }

        self.entries.push(diagnostic);
    }

    pub fn error(&mut self, line: i32, message: String) {
        self.report(Diagnostic {
            severity: Severity::Error,
            location: Location::Line(line),
            message,
        });
    }

    pub fn warning(&mut self, line: i32, message: String) {
        self.report(Diagnostic {
            severity: Severity::Warning,
            location: Location::Line(line),
            message,
        });
    }

    pub fn linker_error(&mut self, message: String) {
        self.report(Diagnostic {
            severity: Severity::Error,
            location: Location::Linker,
            message,
        });
    }

    /// Counts a front-end failure that was already displayed elsewhere.
    pub fn syntax_error(&mut self, error: &Error) {
        self.errors += 1;
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            location: Location::Line(error.get_position().0 as i32),
            message: error.to_string(),
        });
    }

    pub fn error_count(&self) -> u32 {
        self.errors
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Rendered lines in the order they were reported.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.to_string()).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Number of warnings: {}\nNumber of errors: {}",
            self.warnings, self.errors
        )
    }
}
