use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// A failure that stops the pipeline: a syntax error from the front end, a
/// broken tree contract inside the compiler, or an I/O problem in the driver.
///
/// Semantic diagnostics are not represented here, see
/// [`Diagnostics`](super::diagnostics::Diagnostics).
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::WrongNodeKind { .. } => "WrongNodeKind",
            ErrorImpl::InvalidFlag { .. } => "InvalidFlag",
            ErrorImpl::SelfMemoryCopy => "SelfMemoryCopy",
            ErrorImpl::UndefinedMemoryType { .. } => "UndefinedMemoryType",
            ErrorImpl::UnresolvedFunction { .. } => "UnresolvedFunction",
            ErrorImpl::MemoryOverflow { .. } => "MemoryOverflow",
            ErrorImpl::AnalysisFailed { .. } => "AnalysisFailed",
            ErrorImpl::FileError { .. } => "FileError",
        }
    }

    /// Whether this error is a broken compiler contract rather than
    /// something wrong with the user's program.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::WrongNodeKind { .. }
                | ErrorImpl::InvalidFlag { .. }
                | ErrorImpl::SelfMemoryCopy
                | ErrorImpl::UndefinedMemoryType { .. }
                | ErrorImpl::UnresolvedFunction { .. }
        )
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::WrongNodeKind { expected, found } => ErrorTip::Suggestion(format!(
                "Expected a {} node but found {}",
                expected, found
            )),
            ErrorImpl::InvalidFlag { flag, node } => {
                ErrorTip::Suggestion(format!("Flag `{}` cannot be set on {}", flag, node))
            }
            ErrorImpl::SelfMemoryCopy => ErrorTip::Suggestion(String::from(
                "Memory information was copied from a node onto itself",
            )),
            ErrorImpl::UndefinedMemoryType { name } => ErrorTip::Suggestion(format!(
                "`{}` was used before a storage class was assigned",
                name
            )),
            ErrorImpl::UnresolvedFunction { name } => ErrorTip::Suggestion(format!(
                "Function `{}` has no entry address yet",
                name
            )),
            ErrorImpl::MemoryOverflow { name } => ErrorTip::Suggestion(format!(
                "`{}` does not fit in the address space, try a smaller array",
                name
            )),
            ErrorImpl::AnalysisFailed { errors } => ErrorTip::Suggestion(format!(
                "Code generation skipped because analysis reported {} error(s)",
                errors
            )),
            ErrorImpl::FileError { path, message } => {
                ErrorTip::Suggestion(format!("Could not access `{}`: {}", path, message))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("wrong node kind: expected {expected}, found {found}")]
    WrongNodeKind { expected: String, found: String },
    #[error("flag {flag:?} is invalid on {node}")]
    InvalidFlag { flag: String, node: String },
    #[error("memory info copied onto itself")]
    SelfMemoryCopy,
    #[error("undefined memory type on {name:?}")]
    UndefinedMemoryType { name: String },
    #[error("function {name:?} has no entry address")]
    UnresolvedFunction { name: String },
    #[error("{name:?} overflows the address space")]
    MemoryOverflow { name: String },
    #[error("analysis reported {errors} error(s)")]
    AnalysisFailed { errors: u32 },
    #[error("file error on {path:?}: {message}")]
    FileError { path: String, message: String },
}
