use std::rc::Rc;

use log::trace;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

#[derive(Clone)]
pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

/// Regex driven scanner. Positions are tracked as line numbers since every
/// diagnostic the compiler emits is reported per line.
#[derive(Clone)]
pub struct Lexer {
    patterns: Vec<RegexPattern>,
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    file: Rc<String>,
}

macro_rules! pattern {
    ($regex:literal, $handler:expr) => {
        RegexPattern {
            regex: Regex::new($regex).expect("token pattern must compile"),
            handler: $handler,
        }
    };
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("stdin"))
        };

        Lexer {
            pos: 0,
            line: 1,
            tokens: vec![],
            patterns: vec![
                pattern!("^[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
                pattern!("^[0-9]+", number_handler),
                pattern!("^\\s+", skip_handler),
                pattern!("^\"(\\\\.|[^\"\\\\\\n])*\"", string_handler),
                pattern!("^'(\\\\.|[^'\\\\\\n])'", char_handler),
                pattern!("^//[^\\n]*", skip_handler),
                pattern!("^\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
                pattern!("^\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
                pattern!("^\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
                pattern!("^\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
                pattern!("^\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
                pattern!("^\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
                pattern!("^==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
                pattern!("^!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
                pattern!("^!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
                pattern!("^=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
                pattern!("^<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
                pattern!("^<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
                pattern!("^>=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
                pattern!("^>", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
                pattern!("^\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
                pattern!("^&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
                pattern!("^;", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
                pattern!("^\\?", MK_DEFAULT_HANDLER!(TokenKind::Question, "?")),
                pattern!("^,", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
                pattern!("^\\+\\+", MK_DEFAULT_HANDLER!(TokenKind::PlusPlus, "++")),
                pattern!("^--", MK_DEFAULT_HANDLER!(TokenKind::MinusMinus, "--")),
                pattern!("^\\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
                pattern!("^-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
                pattern!("^\\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
                pattern!("^/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
                pattern!("^\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
                pattern!("^-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
                pattern!("^/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
                pattern!("^\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
                pattern!("^%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
            ],
            source,
            file: file_name,
        }
    }

    /// Moves past `n` bytes, counting the newlines crossed.
    pub fn advance_n(&mut self, n: usize) {
        let end = (self.pos + n).min(self.source.len());
        self.line += self.source[self.pos..end].matches('\n').count() as u32;
        self.pos = end;
    }

    pub fn push(&mut self, token: Token) {
        trace!("token {}", token.debug());
        self.tokens.push(token);
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self) -> Position {
        Position(self.line, Rc::clone(&self.file))
    }

    /// Single line span at the current position.
    pub fn span(&self) -> Span {
        Span {
            start: self.position(),
            end: self.position(),
        }
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|found| String::from(found.as_str()))
            .unwrap_or_default()
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let span = lexer.span();

    lexer.push(MK_TOKEN!(TokenKind::Number, matched.clone(), span));
    lexer.advance_n(matched.len());
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
}

/// Resolves the escapes the language knows about. An unknown escape keeps
/// the escaped character.
pub fn unescape(literal: &str) -> String {
    let mut result = String::new();
    let mut chars = literal.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push(ch),
        }
    }

    result
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let span = lexer.span();
    let string_literal = unescape(&matched[1..matched.len() - 1]);

    lexer.push(MK_TOKEN!(TokenKind::String, string_literal, span));
    lexer.advance_n(matched.len());
}

fn char_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let span = lexer.span();
    let char_literal = unescape(&matched[1..matched.len() - 1]);

    lexer.push(MK_TOKEN!(TokenKind::CharLiteral, char_literal, span));
    lexer.advance_n(matched.len());
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = lexer.matched(regex);
    let span = lexer.span();

    if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        lexer.push(MK_TOKEN!(*kind, value.clone(), span));
    } else {
        lexer.push(MK_TOKEN!(TokenKind::Identifier, value.clone(), span));
    }

    lexer.advance_n(value.len());
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);
    let patterns = lex.patterns.clone();

    while !lex.at_eof() {
        let pattern = patterns
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedToken {
                        token: lex.at().to_string(),
                    },
                    lex.position(),
                ))
            }
        }
    }

    let span = lex.span();
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
    Ok(lex.tokens)
}
