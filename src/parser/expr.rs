use crate::{
    ast::ast::{AssignOp, ExprKind, ExprType, NodeId, NodeKind, Operator},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };

        left = led(parser, left, parser.current_binding_power())?;
    }

    Ok(left)
}

fn constant(parser: &mut Parser, token: &Token, expr_type: ExprType) -> NodeId {
    let id = parser.node(NodeKind::Expression(ExprKind::Constant), token);
    parser.tree[id].expr_type = expr_type;
    id
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.current_token().clone();

    let id = match token.kind {
        TokenKind::Number => {
            let value = token.value.parse::<i32>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    parser.get_position(),
                )
            })?;

            let id = constant(parser, &token, ExprType::Int);
            parser.tree[id].num_value = value;
            id
        }
        TokenKind::CharLiteral => {
            let id = constant(parser, &token, ExprType::Char);
            let value = token.value.chars().next().unwrap_or('\0');
            let node = &mut parser.tree[id];
            node.char_value = value;
            node.num_value = value as i32;
            id
        }
        TokenKind::String => {
            let id = constant(parser, &token, ExprType::Char);
            let length = token.value.chars().count() as i32;
            let node = &mut parser.tree[id];
            node.is_array = true;
            node.string_value = Some(token.value.clone());
            node.num_value = length;
            node.memory_size = length + 1;
            id
        }
        TokenKind::True | TokenKind::False => {
            let id = constant(parser, &token, ExprType::Bool);
            parser.tree[id].num_value = i32::from(token.kind == TokenKind::True);
            id
        }
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    Ok(id)
}

/// An identifier is either a variable reference or, when followed by `(`,
/// a call.
pub fn parse_symbol_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    if parser.current_token_kind() != TokenKind::OpenParen {
        return Ok(parser.node(NodeKind::Expression(ExprKind::Id), &token));
    }

    parser.advance();
    let call = parser.node(NodeKind::Expression(ExprKind::Call), &token);

    while parser.current_token_kind() != TokenKind::CloseParen {
        let argument = parse_expr(parser, BindingPower::Default)?;
        parser.tree.push_child(call, 0, argument);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(call)
}

fn binary_operator(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::Or => Some(Operator::Or),
        TokenKind::And => Some(Operator::And),
        TokenKind::Less => Some(Operator::Less),
        TokenKind::LessEquals => Some(Operator::LessEquals),
        TokenKind::Greater => Some(Operator::Greater),
        TokenKind::GreaterEquals => Some(Operator::GreaterEquals),
        TokenKind::Equals => Some(Operator::Equals),
        TokenKind::NotEquals => Some(Operator::NotEquals),
        TokenKind::Plus => Some(Operator::Plus),
        TokenKind::Dash => Some(Operator::Minus),
        TokenKind::Star => Some(Operator::Times),
        TokenKind::Slash => Some(Operator::Divide),
        TokenKind::Percent => Some(Operator::Mod),
        _ => None,
    }
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: NodeId,
    bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator = binary_operator(parser.current_token_kind()).ok_or_else(|| parser.unexpected())?;
    let operator_token = parser.advance().clone();

    let right = parse_expr(parser, bp)?;

    let id = parser.node(
        NodeKind::Expression(ExprKind::Op(operator)),
        &operator_token,
    );
    parser.tree.push_child(id, 0, left);
    parser.tree.push_child(id, 1, right);
    Ok(id)
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let (operator, operand_bp) = match parser.current_token_kind() {
        TokenKind::Dash => (Operator::Negate, BindingPower::Unary),
        TokenKind::Star => (Operator::SizeOf, BindingPower::Unary),
        TokenKind::Question => (Operator::Random, BindingPower::Unary),
        TokenKind::Not => (Operator::Not, BindingPower::LogicalNot),
        _ => return Err(parser.unexpected()),
    };
    let operator_token = parser.advance().clone();
    let operand = parse_expr(parser, operand_bp)?;

    let id = parser.node(
        NodeKind::Expression(ExprKind::Op(operator)),
        &operator_token,
    );
    parser.tree.push_child(id, 0, operand);
    Ok(id)
}

/// Only plain identifiers and indexed identifiers can be assigned to.
fn is_mutable(parser: &Parser, id: NodeId) -> bool {
    let node = &parser.tree[id];
    node.is_expr(ExprKind::Id) || node.is_expr(ExprKind::Op(Operator::Index))
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    if !is_mutable(parser, left) {
        return Err(parser.unexpected_detailed("left side of an assignment must be a variable"));
    }

    let operator = match parser.current_token_kind() {
        TokenKind::Assignment => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::AddAssign,
        TokenKind::MinusEquals => AssignOp::SubAssign,
        TokenKind::StarEquals => AssignOp::MulAssign,
        TokenKind::SlashEquals => AssignOp::DivAssign,
        _ => return Err(parser.unexpected()),
    };
    let operator_token = parser.advance().clone();

    // Right associative: the value may itself be an assignment.
    let rhs = parse_expr(parser, BindingPower::Default)?;

    if operator == AssignOp::Assign {
        let target = if parser.tree[left].is_expr(ExprKind::Id) {
            Some(left)
        } else {
            parser.tree[left].child(0)
        };
        if let Some(target) = target {
            parser.tree[target].cancel_check_init();
        }
    }

    let id = parser.node(
        NodeKind::Expression(ExprKind::Assign(operator)),
        &operator_token,
    );
    parser.tree.push_child(id, 0, left);
    parser.tree.push_child(id, 1, rhs);
    Ok(id)
}

pub fn parse_postfix_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    if !is_mutable(parser, left) {
        return Err(parser.unexpected_detailed("only variables can be incremented or decremented"));
    }

    let operator = if parser.current_token_kind() == TokenKind::PlusPlus {
        AssignOp::Increment
    } else {
        AssignOp::Decrement
    };
    let operator_token = parser.advance().clone();

    let id = parser.node(
        NodeKind::Expression(ExprKind::Assign(operator)),
        &operator_token,
    );
    parser.tree.push_child(id, 0, left);
    Ok(id)
}

pub fn parse_index_expr(
    parser: &mut Parser,
    left: NodeId,
    _bp: BindingPower,
) -> Result<NodeId, Error> {
    if !parser.tree[left].is_expr(ExprKind::Id) {
        return Err(parser.unexpected_detailed("only named arrays can be indexed"));
    }

    let operator_token = parser.advance().clone();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let id = parser.node(
        NodeKind::Expression(ExprKind::Op(Operator::Index)),
        &operator_token,
    );
    parser.tree.push_child(id, 0, left);
    parser.tree.push_child(id, 1, index);
    Ok(id)
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}
