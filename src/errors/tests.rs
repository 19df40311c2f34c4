//! Unit tests for error handling.
//!
//! This module contains tests for error types and the diagnostic sink.

use crate::errors::diagnostics::{Diagnostics, Location, Severity};
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        Position(10, Rc::new("test.c-".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert!(!error.is_internal());
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.c-".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
    assert_eq!(*error.get_position().1, "test.c-");
}

#[test]
fn test_unrecognised_token_has_no_tip() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        Position::null(),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_detailed_tip_includes_message() {
    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: "}".to_string(),
            message: "expected expression".to_string(),
        },
        Position::null(),
    );

    assert_eq!(
        error.get_tip().to_string(),
        "Unexpected token: `}`, expected expression"
    );
}

#[test]
fn test_contract_violations_are_internal() {
    let wrong_kind = Error::new(
        ErrorImpl::WrongNodeKind {
            expected: "declaration".to_string(),
            found: "expression".to_string(),
        },
        Position::null(),
    );
    let flag = Error::new(
        ErrorImpl::InvalidFlag {
            flag: "initialized".to_string(),
            node: "function".to_string(),
        },
        Position::null(),
    );
    let copy = Error::new(ErrorImpl::SelfMemoryCopy, Position::null());

    assert!(wrong_kind.is_internal());
    assert!(flag.is_internal());
    assert!(copy.is_internal());
    assert_eq!(copy.get_error_name(), "SelfMemoryCopy");
}

#[test]
fn test_file_error_is_not_internal() {
    let error = Error::new(
        ErrorImpl::FileError {
            path: "missing.c-".to_string(),
            message: "not found".to_string(),
        },
        Position::null(),
    );

    assert!(!error.is_internal());
    assert_eq!(error.get_error_name(), "FileError");
}

#[test]
fn test_diagnostics_format_and_count() {
    let mut diagnostics = Diagnostics::quiet();
    diagnostics.error(3, "Variable 'x' is not declared.".to_string());
    diagnostics.warning(7, "The variable y seems not to be used.".to_string());
    diagnostics.linker_error("Procedure main is not declared.".to_string());

    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(
        diagnostics.messages(),
        vec![
            "ERROR(3): Variable 'x' is not declared.",
            "WARNING(7): The variable y seems not to be used.",
            "ERROR(LINKER): Procedure main is not declared.",
        ]
    );
    assert_eq!(diagnostics.entries()[2].location, Location::Linker);
    assert_eq!(diagnostics.entries()[1].severity, Severity::Warning);
}

#[test]
fn test_diagnostics_summary() {
    let mut diagnostics = Diagnostics::quiet();
    diagnostics.warning(1, "w".to_string());

    assert_eq!(
        diagnostics.summary(),
        "Number of warnings: 1\nNumber of errors: 0"
    );
}

#[test]
fn test_syntax_error_is_counted() {
    let mut diagnostics = Diagnostics::quiet();
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: ";".to_string(),
        },
        Position(4, Rc::new("test.c-".to_string())),
    );
    diagnostics.syntax_error(&error);

    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.entries()[0].location, Location::Line(4));
}
