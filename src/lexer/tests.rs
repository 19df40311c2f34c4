//! Unit tests for the lexer module.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.c-".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    assert_eq!(
        kinds("int bool char void static if else while for in return break and or not true false"),
        vec![
            TokenKind::Int,
            TokenKind::Bool,
            TokenKind::Char,
            TokenKind::Void,
            TokenKind::Static,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Return,
            TokenKind::Break,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::True,
            TokenKind::False,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo integer _x1 iffy".to_string(), None).unwrap();

    for (token, value) in tokens.iter().zip(["foo", "integer", "_x1", "iffy"]) {
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.value, value);
    }
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 0 100".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "0");
    assert_eq!(tokens[2].value, "100");
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("== != ! = <= < >= > || && ++ -- += -= *= /= + - / * % ?"),
        vec![
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Not,
            TokenKind::Assignment,
            TokenKind::LessEquals,
            TokenKind::Less,
            TokenKind::GreaterEquals,
            TokenKind::Greater,
            TokenKind::Or,
            TokenKind::And,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::PlusEquals,
            TokenKind::MinusEquals,
            TokenKind::StarEquals,
            TokenKind::SlashEquals,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Slash,
            TokenKind::Star,
            TokenKind::Percent,
            TokenKind::Question,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    assert_eq!(
        kinds("( ) [ ] { } ; ,"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_char_literals() {
    let tokens = tokenize("'a' '\\n' '\\''".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].value, "\n");
    assert_eq!(tokens[2].value, "'");
}

#[test]
fn test_tokenize_string_literals() {
    let tokens = tokenize("\"hello\" \"a\\\"b\\n\"".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, "a\"b\n");
}

#[test]
fn test_tokenize_comments_are_skipped() {
    assert_eq!(
        kinds("x // the rest is ignored ; ( )\ny"),
        vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::EOF]
    );
}

#[test]
fn test_line_numbers() {
    let tokens = tokenize("int x;\n\n// note\nbool y;".to_string(), None).unwrap();

    assert_eq!(tokens[0].line(), 1);
    assert_eq!(tokens[2].line(), 1);
    assert_eq!(tokens[3].line(), 4);
    assert_eq!(tokens[3].kind, TokenKind::Bool);
}

#[test]
fn test_multiline_string_keeps_counting() {
    let tokens = tokenize("\"one\"\nx".to_string(), None).unwrap();

    assert_eq!(tokens[1].line(), 2);
}

#[test]
fn test_unrecognised_token() {
    let error = tokenize("int x = 3 @ 4;".to_string(), Some("bad.c-".to_string())).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 1);
}

#[test]
fn test_unrecognised_token_line() {
    let error = tokenize("int x;\nint y;\n#".to_string(), None).unwrap_err();

    assert_eq!(error.get_position().0, 3);
}
