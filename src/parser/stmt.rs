use crate::{
    ast::ast::{DeclKind, ExprKind, NodeId, NodeKind, StmtKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{decl::parse_var_decl_list, parser::Parser};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()) {
        let handler = *handler;
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(expr)
}

/// Local declarations must come before the statements of a block.
fn starts_local_declaration(parser: &Parser) -> bool {
    let kind = parser.current_token_kind();
    kind == TokenKind::Static || (kind.is_type_specifier() && kind != TokenKind::Void)
}

pub fn parse_compound_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?;
    let id = parser.node(NodeKind::Statement(StmtKind::Compound), &start);

    while starts_local_declaration(parser) {
        for declaration in parse_var_decl_list(parser)? {
            parser.tree.push_child(id, 0, declaration);
        }
    }

    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected());
        }
        let statement = parse_stmt(parser)?;
        parser.tree.push_child(id, 1, statement);
    }

    parser.expect(TokenKind::CloseCurly)?;
    Ok(id)
}

fn parse_condition(parser: &mut Parser) -> Result<NodeId, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;
    Ok(condition)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().clone();
    let id = parser.node(NodeKind::Statement(StmtKind::Selection), &start);

    let condition = parse_condition(parser)?;
    let then_body = parse_stmt(parser)?;
    parser.tree.push_child(id, 0, condition);
    parser.tree.push_child(id, 1, then_body);

    if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        let else_body = parse_stmt(parser)?;
        parser.tree.push_child(id, 2, else_body);
    }

    Ok(id)
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().clone();
    let id = parser.node(NodeKind::Statement(StmtKind::While), &start);

    let condition = parse_condition(parser)?;
    let body = parse_stmt(parser)?;
    parser.tree.push_child(id, 0, condition);
    parser.tree.push_child(id, 1, body);

    Ok(id)
}

/// `for (x in arr) stmt`: the loop variable is declared by the statement
/// itself and takes its type from the array during analysis.
pub fn parse_for_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().clone();
    let id = parser.node(NodeKind::Statement(StmtKind::For), &start);

    parser.expect(TokenKind::OpenParen)?;
    let variable_token = parser.expect(TokenKind::Identifier)?;
    let variable = parser.node(NodeKind::Declaration(DeclKind::Variable), &variable_token);

    parser.expect(TokenKind::In)?;
    let array_token = parser.expect(TokenKind::Identifier)?;
    let array = parser.node(NodeKind::Expression(ExprKind::Id), &array_token);
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_stmt(parser)?;

    parser.tree.push_child(id, 0, variable);
    parser.tree.push_child(id, 1, array);
    parser.tree.push_child(id, 2, body);
    Ok(id)
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().clone();
    let id = parser.node(NodeKind::Statement(StmtKind::Return), &start);

    if parser.current_token_kind() != TokenKind::Semicolon {
        let value = parse_expr(parser, BindingPower::Default)?;
        parser.tree.push_child(id, 0, value);
    }

    parser.expect(TokenKind::Semicolon)?;
    Ok(id)
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().clone();
    let id = parser.node(NodeKind::Statement(StmtKind::Break), &start);

    parser.expect(TokenKind::Semicolon)?;
    Ok(id)
}
