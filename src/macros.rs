//! Token construction shorthands shared by the lexer handlers.

/// Builds a [`Token`](crate::lexer::tokens::Token) from its kind, spelling
/// and span.
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Handler for a punctuator or operator with a fixed spelling: pushes the
/// token on the current line and steps over it.
///
/// ```ignore
/// pattern!("^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<="))
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let span = lexer.span();
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
        }
    };
}
