use crate::{
    ast::{
        ast::{AssignOp, DeclKind, ExprKind, ExprType, NodeId, Operator},
        tree::SyntaxTree,
    },
    errors::errors::{Error, ErrorImpl},
};

use super::type_checker::TypeChecker;

/// The node in `slot`, or an internal error when the parser left it empty.
pub fn operand(tree: &SyntaxTree, id: NodeId, slot: usize) -> Result<NodeId, Error> {
    tree[id].child(slot).ok_or_else(|| {
        Error::new(
            ErrorImpl::WrongNodeKind {
                expected: format!("expression with operand {}", slot),
                found: tree[id].kind.to_string(),
            },
            tree[id].position(),
        )
    })
}

/// Types an operator node once its operands have been typed.
pub fn check_operator(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    operator: Operator,
) -> Result<(), Error> {
    match operator {
        Operator::LessEquals
        | Operator::Less
        | Operator::GreaterEquals
        | Operator::Greater
        | Operator::Equals
        | Operator::NotEquals => check_comparison(type_checker, tree, id, operator),
        Operator::And | Operator::Or => {
            check_binary(type_checker, tree, id, operator.symbol(), ExprType::Bool)
        }
        Operator::Plus | Operator::Minus | Operator::Times | Operator::Divide | Operator::Mod => {
            check_binary(type_checker, tree, id, operator.symbol(), ExprType::Int)
        }
        Operator::Not => check_unary(type_checker, tree, id, operator.symbol(), ExprType::Bool),
        Operator::Negate => check_unary(type_checker, tree, id, operator.symbol(), ExprType::Int),
        Operator::SizeOf => check_sizeof(type_checker, tree, id),
        Operator::Random => check_random(type_checker, tree, id),
        Operator::Index => check_index(type_checker, tree, id),
    }
}

fn check_binary(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    symbol: &str,
    expected: ExprType,
) -> Result<(), Error> {
    tree[id].expr_type = expected;
    let lhs = operand(tree, id, 0)?;
    let rhs = operand(tree, id, 1)?;

    for (side, child) in [("lhs", lhs), ("rhs", rhs)] {
        let found = tree[child].expr_type;
        if found != ExprType::Undefined && found != expected {
            type_checker.error(
                tree,
                id,
                format!(
                    "'{}' requires operands of {} but {} is of {}.",
                    symbol, expected, side, found
                ),
            );
        }
    }

    if tree[lhs].is_array || tree[rhs].is_array {
        type_checker.error(
            tree,
            id,
            format!("The operation '{}' does not work with arrays.", symbol),
        );
    }

    Ok(())
}

fn check_unary(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    symbol: &str,
    expected: ExprType,
) -> Result<(), Error> {
    tree[id].expr_type = expected;
    let child = operand(tree, id, 0)?;

    if tree.check_cascade(id) && tree[child].expr_type != expected {
        type_checker.error(
            tree,
            id,
            format!(
                "Unary '{}' requires an operand of {} but was given {}.",
                symbol, expected, tree[child].expr_type
            ),
        );
    }

    if tree[child].is_array {
        type_checker.error(
            tree,
            id,
            format!("The operation '{}' does not work with arrays.", symbol),
        );
    }

    Ok(())
}

fn check_sizeof(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    tree[id].expr_type = ExprType::Int;
    let child = operand(tree, id, 0)?;

    if tree.check_cascade(id) && !tree[child].is_array {
        type_checker.error(
            tree,
            id,
            format!(
                "The operation '{}' only works with arrays.",
                Operator::SizeOf.symbol()
            ),
        );
    }

    Ok(())
}

/// `?n` yields int. An undefined operand leaves the result undefined so
/// enclosing rules stay quiet.
fn check_random(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    check_unary(type_checker, tree, id, Operator::Random.symbol(), ExprType::Int)?;

    let child = operand(tree, id, 0)?;
    if tree[child].expr_type == ExprType::Undefined {
        tree[id].expr_type = ExprType::Undefined;
    }

    Ok(())
}

fn check_comparison(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    operator: Operator,
) -> Result<(), Error> {
    tree[id].expr_type = ExprType::Bool;
    let lhs = operand(tree, id, 0)?;
    let rhs = operand(tree, id, 1)?;

    check_same_type(type_checker, tree, id, operator.symbol(), lhs, rhs);
    Ok(())
}

/// Shared by comparisons and plain assignment: equal types (unless an
/// operand already failed) and matching array-ness.
fn check_same_type(
    type_checker: &mut TypeChecker,
    tree: &SyntaxTree,
    id: NodeId,
    symbol: &str,
    lhs: NodeId,
    rhs: NodeId,
) {
    if tree.check_cascade(id) && tree[lhs].expr_type != tree[rhs].expr_type {
        type_checker.error(
            tree,
            id,
            format!(
                "'{}' requires operands of the same type but lhs is {} and rhs is {}.",
                symbol, tree[lhs].expr_type, tree[rhs].expr_type
            ),
        );
    }

    let (lhs_array, rhs_array) = (tree[lhs].is_array, tree[rhs].is_array);
    if lhs_array ^ rhs_array {
        let negation = |is_array: bool| if is_array { "" } else { " not" };
        type_checker.error(
            tree,
            id,
            format!(
                "'{}' requires both operands be arrays or not but lhs is{} an array and rhs is{} an array.",
                symbol,
                negation(lhs_array),
                negation(rhs_array)
            ),
        );
    }
}

fn check_index(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let array = operand(tree, id, 0)?;
    let index = operand(tree, id, 1)?;
    tree[id].expr_type = tree[array].expr_type;

    if !tree[array].is_array {
        type_checker.error(
            tree,
            id,
            format!("Cannot index nonarray '{}'.", tree[array].name),
        );
    }

    let index_type = tree[index].expr_type;
    if index_type != ExprType::Undefined && index_type != ExprType::Int {
        type_checker.error(
            tree,
            id,
            format!(
                "Array '{}' should be indexed by type int but got {}.",
                tree[array].name, index_type
            ),
        );
    }

    if tree[index].is_array {
        type_checker.error(
            tree,
            id,
            format!("Array index is the unindexed array '{}'.", tree[index].name),
        );
    }

    Ok(())
}

/// Types an assignment. Every form except `++`/`--` also marks the
/// assigned declaration initialized.
pub fn check_assignment(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    op: AssignOp,
) -> Result<(), Error> {
    let lhs = operand(tree, id, 0)?;
    let symbol = op.symbol();

    let Some(rhs) = tree[id].child(1) else {
        return check_unary(type_checker, tree, id, symbol, ExprType::Int);
    };

    if op == AssignOp::Assign {
        tree[id].expr_type = tree[lhs].expr_type;
        tree[id].is_array = tree[lhs].is_array;
        check_same_type(type_checker, tree, id, symbol, lhs, rhs);
    } else {
        check_binary(type_checker, tree, id, symbol, ExprType::Int)?;
        tree[id].expr_type = tree[lhs].expr_type;
    }

    let target = if tree[lhs].is_expr(ExprKind::Id) {
        lhs
    } else {
        operand(tree, lhs, 0)?
    };

    if let Some(declaration) = type_checker.symbol_table.lookup(&tree[target].name) {
        if !tree[declaration].is_decl(DeclKind::Function) {
            tree[declaration].set_initialized(true)?;
        }
    }

    Ok(())
}
