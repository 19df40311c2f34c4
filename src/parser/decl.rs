use crate::{
    ast::ast::{DeclKind, ExprType, NodeId, NodeKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, stmt::parse_compound_stmt};

/// Parses one top-level declaration. A variable declaration may declare
/// several names, so a list is returned.
pub fn parse_declaration(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    let kind = parser.current_token_kind();

    let is_function = match kind {
        TokenKind::Identifier => true,
        kind if kind.is_type_specifier() => {
            parser.peek_kind(1) == TokenKind::Identifier
                && parser.peek_kind(2) == TokenKind::OpenParen
        }
        _ => false,
    };

    if is_function {
        Ok(vec![parse_fn_decl(parser)?])
    } else {
        parse_var_decl_list(parser)
    }
}

fn parse_type_specifier(parser: &mut Parser) -> Result<ExprType, Error> {
    let expr_type = match parser.current_token_kind() {
        TokenKind::Int => ExprType::Int,
        TokenKind::Bool => ExprType::Bool,
        TokenKind::Char => ExprType::Char,
        TokenKind::Void => ExprType::Void,
        _ => return Err(parser.unexpected_detailed("expected a type")),
    };

    parser.advance();
    Ok(expr_type)
}

/// `[static] type name[N] = init, ...;`
pub fn parse_var_decl_list(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    let is_static = parser.current_token_kind() == TokenKind::Static;
    if is_static {
        parser.advance();
    }

    if parser.current_token_kind() == TokenKind::Void {
        return Err(parser.unexpected_detailed("variables cannot be of type void"));
    }
    let expr_type = parse_type_specifier(parser)?;

    let mut declarations = vec![parse_var_decl_init(parser)?];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        declarations.push(parse_var_decl_init(parser)?);
    }

    parser.expect(TokenKind::Semicolon)?;

    parser.tree.type_siblings(&declarations, expr_type);
    if is_static {
        parser.tree.static_siblings(&declarations);
    }

    Ok(declarations)
}

fn parse_var_decl_init(parser: &mut Parser) -> Result<NodeId, Error> {
    let name = parser.expect(TokenKind::Identifier)?;
    let id = parser.node(NodeKind::Declaration(DeclKind::Variable), &name);

    if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        let size_token = parser.expect(TokenKind::Number)?;
        let memory_size = size_token
            .value
            .parse::<i32>()
            .ok()
            .and_then(|size| size.checked_add(1))
            .ok_or_else(|| parser.unexpected_detailed("array size is out of range"))?;
        parser.expect(TokenKind::CloseBracket)?;

        let node = &mut parser.tree[id];
        node.is_array = true;
        node.memory_size = memory_size;
    }

    if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        // Initializers cannot themselves assign.
        let initializer = parse_expr(parser, BindingPower::Assignment)?;
        parser.tree.push_child(id, 0, initializer);
    }

    Ok(id)
}

/// `[type] name(params) { ... }`. A missing type declares a void function.
fn parse_fn_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let return_type = if parser.current_token_kind() == TokenKind::Identifier {
        ExprType::Void
    } else {
        parse_type_specifier(parser)?
    };

    let name = parser.expect(TokenKind::Identifier)?;
    let id = parser.node(NodeKind::Declaration(DeclKind::Function), &name);
    parser.tree[id].expr_type = return_type;

    parser.expect(TokenKind::OpenParen)?;
    let params = parse_params(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_compound_stmt(parser)?;

    parser.tree.set_children(id, 0, params);
    parser.tree.push_child(id, 1, body);
    Ok(id)
}

/// `void`, nothing, or `type a, b[]; type c`. A parameter without its own
/// type shares the type of the group it follows.
fn parse_params(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    if parser.current_token_kind() == TokenKind::Void
        && parser.peek_kind(1) == TokenKind::CloseParen
    {
        parser.advance();
        return Ok(vec![]);
    }

    let mut params = vec![];
    let mut groups: Vec<(ExprType, Vec<NodeId>)> = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.current_token_kind().is_type_specifier() {
            if parser.current_token_kind() == TokenKind::Void {
                return Err(parser.unexpected_detailed("parameters cannot be of type void"));
            }
            let expr_type = parse_type_specifier(parser)?;
            groups.push((expr_type, vec![]));
        }

        let group = match groups.last_mut() {
            Some((_, group)) => group,
            None => return Err(parser.unexpected_detailed("expected a parameter type")),
        };

        let name = parser.expect(TokenKind::Identifier)?;
        let id = parser.node(NodeKind::Declaration(DeclKind::Param), &name);
        group.push(id);
        params.push(id);

        if parser.current_token_kind() == TokenKind::OpenBracket {
            parser.advance();
            parser.expect(TokenKind::CloseBracket)?;
            parser.tree[id].is_array = true;
        }

        match parser.current_token_kind() {
            TokenKind::Comma | TokenKind::Semicolon => {
                parser.advance();
            }
            TokenKind::CloseParen => {}
            _ => return Err(parser.unexpected()),
        }
    }

    for (expr_type, group) in groups {
        parser.tree.type_siblings(&group, expr_type);
    }

    Ok(params)
}
