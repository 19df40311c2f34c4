//! Unit tests for the parser module.
//!
//! This module contains tests for parsing the language constructs including:
//! - Variable and array declarations
//! - Function declarations and parameter groups
//! - Expressions and precedence
//! - Control flow statements
//! - Syntax errors

use std::rc::Rc;

use super::parser::parse;
use crate::{
    ast::{
        ast::{AssignOp, DeclKind, ExprKind, ExprType, NodeId, Operator, StmtKind},
        tree::SyntaxTree,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<SyntaxTree, Error> {
    let tokens = tokenize(source.to_string(), Some("test.c-".to_string())).unwrap();
    parse(tokens, Rc::new("test.c-".to_string()))
}

/// The first statement of the body of the first function.
fn first_statement(tree: &SyntaxTree) -> NodeId {
    let body = tree[tree.roots[0]].child(1).unwrap();
    tree[body].children[1][0]
}

#[test]
fn test_parse_variable_declaration() {
    let tree = parse_source("int x;").unwrap();

    assert_eq!(tree.roots.len(), 1);
    let x = &tree[tree.roots[0]];
    assert!(x.is_decl(DeclKind::Variable));
    assert_eq!(x.name, "x");
    assert_eq!(x.expr_type, ExprType::Int);
    assert!(!x.is_array);
    assert_eq!(x.line, 1);
}

#[test]
fn test_parse_declaration_list_shares_type() {
    let tree = parse_source("static char a, b[10], c = 'z';").unwrap();

    assert_eq!(tree.roots.len(), 3);
    for id in &tree.roots {
        assert_eq!(tree[*id].expr_type, ExprType::Char);
        assert!(tree[*id].is_static);
    }

    let b = &tree[tree.roots[1]];
    assert!(b.is_array);
    assert_eq!(b.memory_size, 11);

    let c = &tree[tree.roots[2]];
    let init = &tree[c.child(0).unwrap()];
    assert!(init.is_expr(ExprKind::Constant));
    assert_eq!(init.char_value, 'z');
}

#[test]
fn test_parse_function_declaration() {
    let tree = parse_source("int add(int a, b; bool c[]) { return a + b; }").unwrap();

    let add = &tree[tree.roots[0]];
    assert!(add.is_decl(DeclKind::Function));
    assert_eq!(add.expr_type, ExprType::Int);

    let params = &add.children[0];
    assert_eq!(params.len(), 3);
    assert_eq!(tree[params[0]].expr_type, ExprType::Int);
    assert_eq!(tree[params[1]].expr_type, ExprType::Int);
    assert_eq!(tree[params[2]].expr_type, ExprType::Bool);
    assert!(tree[params[2]].is_array);
    assert!(tree[params[2]].is_decl(DeclKind::Param));

    let body = &tree[add.child(1).unwrap()];
    assert!(body.is_stmt(StmtKind::Compound));
}

#[test]
fn test_parse_untyped_function_is_void() {
    let tree = parse_source("main() { }").unwrap();
    assert_eq!(tree[tree.roots[0]].expr_type, ExprType::Void);

    let tree = parse_source("void main(void) { }").unwrap();
    assert!(tree[tree.roots[0]].children[0].is_empty());
}

#[test]
fn test_parse_compound_keeps_declarations_first() {
    let tree = parse_source("main() { int x; bool y; x = 1; y = true; }").unwrap();

    let body = &tree[tree[tree.roots[0]].child(1).unwrap()];
    assert_eq!(body.children[0].len(), 2);
    assert_eq!(body.children[1].len(), 2);
}

#[test]
fn test_parse_precedence() {
    let tree = parse_source("main() { x = 1 + 2 * 3; }").unwrap();

    let assign = first_statement(&tree);
    assert!(tree[assign].is_expr(ExprKind::Assign(AssignOp::Assign)));

    let plus = tree[assign].children[1][0];
    assert!(tree[plus].is_expr(ExprKind::Op(Operator::Plus)));

    let times = tree[plus].children[1][0];
    assert!(tree[times].is_expr(ExprKind::Op(Operator::Times)));
}

#[test]
fn test_parse_logical_precedence() {
    let tree = parse_source("main() { b = not x < 3 or y and z; }").unwrap();

    let assign = first_statement(&tree);
    let or = tree[assign].children[1][0];
    assert!(tree[or].is_expr(ExprKind::Op(Operator::Or)));

    let not = tree[or].children[0][0];
    assert!(tree[not].is_expr(ExprKind::Op(Operator::Not)));
    let less = tree[not].children[0][0];
    assert!(tree[less].is_expr(ExprKind::Op(Operator::Less)));

    let and = tree[or].children[1][0];
    assert!(tree[and].is_expr(ExprKind::Op(Operator::And)));
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let tree = parse_source("main() { a = b = 3; }").unwrap();

    let outer = first_statement(&tree);
    let inner = tree[outer].children[1][0];
    assert!(tree[inner].is_expr(ExprKind::Assign(AssignOp::Assign)));
}

#[test]
fn test_parse_assignment_cancels_init_check() {
    let tree = parse_source("main() { a = 1; b[2] = 3; c += 1; }").unwrap();

    let body = &tree[tree[tree.roots[0]].child(1).unwrap()];
    let statements = body.children[1].clone();

    let a = tree[statements[0]].children[0][0];
    assert!(!tree[a].should_check_init());

    let index = tree[statements[1]].children[0][0];
    let b = tree[index].children[0][0];
    assert!(!tree[b].should_check_init());

    let c = tree[statements[2]].children[0][0];
    assert!(tree[c].should_check_init());
}

#[test]
fn test_parse_unary_operators() {
    let tree = parse_source("main() { x = -y + *a + ?10; }").unwrap();

    let assign = first_statement(&tree);
    let outer = tree[assign].children[1][0];
    let random = tree[outer].children[1][0];
    assert!(tree[random].is_expr(ExprKind::Op(Operator::Random)));

    let inner = tree[outer].children[0][0];
    let negate = tree[inner].children[0][0];
    let sizeof = tree[inner].children[1][0];
    assert!(tree[negate].is_expr(ExprKind::Op(Operator::Negate)));
    assert!(tree[sizeof].is_expr(ExprKind::Op(Operator::SizeOf)));
}

#[test]
fn test_parse_postfix_and_index() {
    let tree = parse_source("main() { a[i + 1]++; }").unwrap();

    let increment = first_statement(&tree);
    assert!(tree[increment].is_expr(ExprKind::Assign(AssignOp::Increment)));
    assert_eq!(tree[increment].num_children(), 1);

    let index = tree[increment].children[0][0];
    assert!(tree[index].is_expr(ExprKind::Op(Operator::Index)));
    assert_eq!(tree[tree[index].children[0][0]].name, "a");
}

#[test]
fn test_parse_call_arguments() {
    let tree = parse_source("main() { output(f(1, 2) + 3); }").unwrap();

    let call = first_statement(&tree);
    assert!(tree[call].is_expr(ExprKind::Call));
    assert_eq!(tree[call].name, "output");
    assert_eq!(tree[call].children[0].len(), 1);

    let plus = tree[call].children[0][0];
    let inner = tree[plus].children[0][0];
    assert_eq!(tree[inner].name, "f");
    assert_eq!(tree[inner].children[0].len(), 2);
}

#[test]
fn test_parse_constants() {
    let tree = parse_source("main() { f(42, true, false, 'c', \"hi\"); }").unwrap();

    let call = first_statement(&tree);
    let args = tree[call].children[0].clone();

    assert_eq!(tree[args[0]].num_value, 42);
    assert_eq!(tree[args[0]].expr_type, ExprType::Int);
    assert_eq!(tree[args[1]].num_value, 1);
    assert_eq!(tree[args[2]].num_value, 0);
    assert_eq!(tree[args[2]].expr_type, ExprType::Bool);
    assert_eq!(tree[args[3]].char_value, 'c');

    let string = &tree[args[4]];
    assert!(string.is_array);
    assert_eq!(string.expr_type, ExprType::Char);
    assert_eq!(string.string_value.as_deref(), Some("hi"));
    assert_eq!(string.num_value, 2);
    assert_eq!(string.memory_size, 3);
}

#[test]
fn test_parse_if_else_statement() {
    let tree = parse_source("main() { if (x > 0) y = 1; else { y = 2; } }").unwrap();

    let selection = first_statement(&tree);
    assert!(tree[selection].is_stmt(StmtKind::Selection));
    assert_eq!(tree[selection].num_children(), 3);
    assert!(tree[tree[selection].child(2).unwrap()].is_stmt(StmtKind::Compound));
}

#[test]
fn test_parse_while_loop() {
    let tree = parse_source("main() { while (x < 10) { x = x + 1; break; } }").unwrap();

    let loop_stmt = first_statement(&tree);
    assert!(tree[loop_stmt].is_stmt(StmtKind::While));

    let body = &tree[tree[loop_stmt].child(1).unwrap()];
    assert!(tree[body.children[1][1]].is_stmt(StmtKind::Break));
}

#[test]
fn test_parse_for_loop() {
    let tree = parse_source("main() { for (x in arr) output(x); }").unwrap();

    let for_stmt = first_statement(&tree);
    assert!(tree[for_stmt].is_stmt(StmtKind::For));

    let variable = &tree[tree[for_stmt].child(0).unwrap()];
    assert!(variable.is_decl(DeclKind::Variable));
    assert_eq!(variable.name, "x");

    let array = &tree[tree[for_stmt].child(1).unwrap()];
    assert!(array.is_expr(ExprKind::Id));
    assert!(array.should_check_init());
}

#[test]
fn test_parse_return_statement() {
    let tree = parse_source("int f() { return; return 1; }").unwrap();

    let body = &tree[tree[tree.roots[0]].child(1).unwrap()];
    assert_eq!(tree[body.children[1][0]].num_children(), 0);
    assert_eq!(tree[body.children[1][1]].num_children(), 1);
}

#[test]
fn test_parse_lines() {
    let tree = parse_source("int x;\n\nmain()\n{\n  x = 1;\n}").unwrap();

    assert_eq!(tree[tree.roots[1]].line, 3);
    assert_eq!(tree[first_statement(&tree)].line, 5);
}

#[test]
fn test_parse_error_missing_semicolon() {
    let error = parse_source("main() { x = 1 }").unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_parse_error_bad_assignment_target() {
    let error = parse_source("main() { 1 = x; }").unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_error_void_variable() {
    let error = parse_source("void x;").unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_array_size_limit() {
    let tree = parse_source("int a[2147483646];").unwrap();
    assert_eq!(tree[tree.roots[0]].memory_size, i32::MAX);

    let error = parse_source("int a[2147483647];\nmain() { }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");

    let error = parse_source("int a[99999999999];").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_error_declaration_after_statement() {
    assert!(parse_source("main() { x = 1; int y; }").is_err());
}

#[test]
fn test_parse_error_line() {
    let error = parse_source("int x;\nint y\nint z;").unwrap_err();

    assert_eq!(error.get_position().0, 3);
}
