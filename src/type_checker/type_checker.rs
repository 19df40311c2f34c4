use log::debug;

use crate::{
    ast::{
        ast::{DeclKind, ExprKind, ExprType, MemoryType, NodeId, NodeKind, StmtKind, MAX_CHILDREN},
        tree::SyntaxTree,
    },
    errors::{diagnostics::Diagnostics, errors::Error},
};

use super::{
    builtins::add_io_routines,
    operators::{check_assignment, check_operator, operand},
    symbol_table::SymbolTable,
};

/// Local offset every function frame starts from: slot 0 holds the caller's
/// frame pointer and slot -1 the return address.
pub const FRAME_START: i32 = -2;

/// Next free offset in the frame being laid out and in global memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCursor {
    pub local: i32,
    pub global: i32,
}

impl Default for MemoryCursor {
    fn default() -> Self {
        MemoryCursor {
            local: FRAME_START,
            global: 0,
        }
    }
}

#[derive(Debug)]
pub struct TypeChecker {
    pub symbol_table: SymbolTable,
    pub diagnostics: Diagnostics,
    pub cursor: MemoryCursor,
}

impl TypeChecker {
    pub fn new(diagnostics: Diagnostics) -> Self {
        TypeChecker {
            symbol_table: SymbolTable::new(),
            diagnostics,
            cursor: MemoryCursor::default(),
        }
    }

    pub fn error(&mut self, tree: &SyntaxTree, id: NodeId, message: String) {
        self.diagnostics.error(tree[id].line, message);
    }

    pub fn warning(&mut self, tree: &SyntaxTree, id: NodeId, message: String) {
        self.diagnostics.warning(tree[id].line, message);
    }

    /// Lowest global offset handed out, where the first frame may start.
    pub fn global_offset(&self) -> i32 {
        self.cursor.global
    }
}

/// Resolves, types and lays out the whole tree.
///
/// The I/O routines are declared first, then every top-level declaration is
/// analysed in order. Semantic problems go to `diagnostics` and never stop
/// the walk; only internal contract violations return an `Err`.
pub fn type_check(tree: &mut SyntaxTree, diagnostics: Diagnostics) -> Result<TypeChecker, Error> {
    add_io_routines(tree)?;
    tree.set_parent_and_function();

    let mut type_checker = TypeChecker::new(diagnostics);

    for id in tree.builtins.clone() {
        analyse(&mut type_checker, tree, id)?;
    }
    for id in tree.roots.clone() {
        analyse(&mut type_checker, tree, id)?;
    }

    let has_main = match type_checker.symbol_table.lookup_global("main") {
        Some(main) => tree[main].is_decl(DeclKind::Function),
        None => false,
    };
    if !has_main {
        type_checker
            .diagnostics
            .linker_error(String::from("Procedure main is not declared."));
    }

    debug!(
        "analysis finished: {} error(s), {} warning(s), global offset {}",
        type_checker.diagnostics.error_count(),
        type_checker.diagnostics.warning_count(),
        type_checker.cursor.global
    );

    Ok(type_checker)
}

fn analyse(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let previous_local = before_children(type_checker, tree, id)?;

    for slot in 0..MAX_CHILDREN {
        for child in tree[id].children[slot].clone() {
            analyse(type_checker, tree, child)?;
        }
        after_child(type_checker, tree, id, slot)?;
    }

    after_children(type_checker, tree, id)?;

    if let Some(previous) = previous_local {
        let diagnostics = &mut type_checker.diagnostics;
        type_checker
            .symbol_table
            .leave(|_, declaration| check_usage(diagnostics, tree, declaration));
        type_checker.cursor.local = previous;
    }

    Ok(())
}

/// Declarations, name resolution and scope entry. Returns the local offset
/// to restore when the node opened a scope.
fn before_children(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
) -> Result<Option<i32>, Error> {
    check_too_many_arguments(type_checker, tree, id);

    match tree[id].kind {
        NodeKind::Declaration(DeclKind::Function) => {
            let defined = !type_checker.symbol_table.insert(&tree[id].name, id);
            tree[id].memory_type = MemoryType::Global;

            let scope = format!("Function: {}", tree[id].name);
            type_checker.symbol_table.enter(&scope);
            type_checker.cursor.local = FRAME_START;

            if defined {
                report_redeclaration(type_checker, tree, id);
            }
            Ok(Some(FRAME_START))
        }
        NodeKind::Declaration(DeclKind::Param) => {
            let defined = !type_checker.symbol_table.insert(&tree[id].name, id);
            tree[id].memory_type = MemoryType::Param;
            let cursor = &mut type_checker.cursor;
            tree.calculate_memory_offset(id, &mut cursor.local, &mut cursor.global)?;
            tree[id].set_initialized(true)?;

            if defined {
                report_redeclaration(type_checker, tree, id);
            }
            Ok(None)
        }
        NodeKind::Declaration(DeclKind::Variable) => {
            let node = &mut tree[id];
            node.memory_type = if node.parent.is_none() {
                MemoryType::Global
            } else if node.is_static {
                MemoryType::LocalStatic
            } else {
                MemoryType::Local
            };

            if node.child(0).is_some() {
                node.set_initialized(true)?;
            }
            Ok(None)
        }
        NodeKind::Expression(ExprKind::Call) => {
            resolve_call(type_checker, tree, id)?;
            Ok(None)
        }
        NodeKind::Expression(ExprKind::Constant) => {
            if tree[id].is_array {
                tree[id].memory_type = MemoryType::Global;
                let cursor = &mut type_checker.cursor;
                tree.calculate_memory_offset(id, &mut cursor.local, &mut cursor.global)?;
            }
            Ok(None)
        }
        NodeKind::Expression(ExprKind::Id) => {
            resolve_id(type_checker, tree, id)?;
            Ok(None)
        }
        NodeKind::Expression(_) => Ok(None),
        NodeKind::Statement(StmtKind::Compound) => {
            if compound_enters_scope(tree, id) {
                type_checker.symbol_table.enter("Compound Statement");
                Ok(Some(type_checker.cursor.local))
            } else {
                Ok(None)
            }
        }
        NodeKind::Statement(StmtKind::For) => {
            type_checker.symbol_table.enter("For Statement");
            let previous = type_checker.cursor.local;

            let variable = operand(tree, id, 0)?;
            let array = operand(tree, id, 1)?;
            if let Some(declaration) = type_checker.symbol_table.lookup(&tree[array].name) {
                tree[variable].expr_type = tree[declaration].expr_type;
            }
            tree[variable].set_initialized(true)?;

            Ok(Some(previous))
        }
        NodeKind::Statement(StmtKind::Break) => {
            if !inside_loop(tree, id) {
                type_checker.error(
                    tree,
                    id,
                    String::from("Cannot have a break statement outside of loop."),
                );
            }
            Ok(None)
        }
        NodeKind::Statement(_) => Ok(None),
    }
}

fn after_child(
    type_checker: &mut TypeChecker,
    tree: &mut SyntaxTree,
    id: NodeId,
    slot: usize,
) -> Result<(), Error> {
    match tree[id].kind {
        NodeKind::Statement(StmtKind::For) if slot == 1 => {
            let array = operand(tree, id, 1)?;
            let declaration = type_checker.symbol_table.lookup(&tree[array].name);

            if let Some(declaration) = declaration {
                if !tree[declaration].is_decl(DeclKind::Function) {
                    tree[declaration].set_initialized(true)?;
                }
            }

            let is_array = declaration.map_or(false, |declaration| tree[declaration].is_array);
            if !is_array {
                type_checker.error(
                    tree,
                    id,
                    format!(
                        "For statement requires that symbol '{}' be an array to loop through.",
                        tree[array].name
                    ),
                );
            }
        }
        NodeKind::Statement(StmtKind::Selection) | NodeKind::Statement(StmtKind::While)
            if slot == 0 =>
        {
            check_condition(type_checker, tree, id)?;
        }
        _ => {}
    }

    Ok(())
}

fn after_children(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    match tree[id].kind {
        NodeKind::Declaration(DeclKind::Function) => {
            let expr_type = tree[id].expr_type;
            if expr_type != ExprType::Void && !tree[id].has_return()? {
                type_checker.warning(
                    tree,
                    id,
                    format!(
                        "Expecting to return {} but function '{}' has no return statement.",
                        expr_type, tree[id].name
                    ),
                );
            }
            tree.calculate_memory_of_children(id)?;
        }
        NodeKind::Declaration(DeclKind::Variable) => check_variable(type_checker, tree, id)?,
        NodeKind::Expression(ExprKind::Assign(op)) => check_assignment(type_checker, tree, id, op)?,
        NodeKind::Expression(ExprKind::Op(operator)) => check_operator(type_checker, tree, id, operator)?,
        NodeKind::Expression(ExprKind::Call) => check_too_few_arguments(type_checker, tree, id),
        NodeKind::Statement(StmtKind::Return) => check_return(type_checker, tree, id)?,
        _ => {}
    }

    check_argument(type_checker, tree, id);
    Ok(())
}

/// Warns about a declaration in a scope being left that nothing read.
fn check_usage(diagnostics: &mut Diagnostics, tree: &SyntaxTree, id: NodeId) {
    let node = &tree[id];
    if let NodeKind::Declaration(kind) = node.kind {
        if kind != DeclKind::Function && !node.is_used() {
            diagnostics.warning(
                node.line,
                format!("The variable {} seems not to be used.", node.name),
            );
        }
    }
}

fn report_redeclaration(type_checker: &mut TypeChecker, tree: &SyntaxTree, id: NodeId) {
    if let Some(existing) = type_checker.symbol_table.lookup(&tree[id].name) {
        type_checker.error(
            tree,
            id,
            format!(
                "Symbol '{}' is already declared at line {}.",
                tree[existing].name, tree[existing].line
            ),
        );
    }
}

/// Function bodies and `for` bodies share the scope of their owner.
fn compound_enters_scope(tree: &SyntaxTree, id: NodeId) -> bool {
    match tree[id].parent {
        None => true,
        Some(parent) => {
            !tree[parent].is_decl(DeclKind::Function) && !tree[parent].is_stmt(StmtKind::For)
        }
    }
}

fn inside_loop(tree: &SyntaxTree, id: NodeId) -> bool {
    let mut visitor = tree[id].parent;

    while let Some(current) = visitor {
        if tree[current].is_stmt(StmtKind::While) || tree[current].is_stmt(StmtKind::For) {
            return true;
        }
        visitor = tree[current].parent;
    }

    false
}

fn resolve_id(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let name = tree[id].name.clone();
    let declaration = type_checker.symbol_table.lookup(&name);

    let declaration = match declaration {
        Some(declaration)
            if !(tree[declaration].is_decl(DeclKind::Variable)
                && tree.has_ancestor(id, declaration, true)) =>
        {
            declaration
        }
        _ => {
            type_checker.error(tree, id, format!("Variable '{}' is not declared.", name));
            return Ok(());
        }
    };

    if tree[declaration].is_decl(DeclKind::Function) {
        type_checker.error(tree, id, format!("Cannot use function '{}' as a variable.", name));
        return Ok(());
    }

    tree[declaration].set_used(true)?;
    tree.copy_memory_info(id, declaration)?;

    let (expr_type, is_array, is_static) = {
        let node = &tree[declaration];
        (node.expr_type, node.is_array, node.is_static)
    };
    let node = &mut tree[id];
    node.expr_type = expr_type;
    node.is_array = is_array;
    node.is_static = is_static;

    let decl = &tree[declaration];
    if tree[id].should_check_init()
        && decl.should_check_init()
        && !decl.is_initialized()
        && decl.parent.is_some()
    {
        type_checker.warning(
            tree,
            id,
            format!("Variable {} may be uninitialized when used here.", name),
        );
        tree[declaration].cancel_check_init();
    }

    Ok(())
}

fn resolve_call(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let name = tree[id].name.clone();

    match type_checker.symbol_table.lookup(&name) {
        None => {
            type_checker.error(tree, id, format!("Function '{}' is not declared.", name));
        }
        Some(declaration) => {
            tree[id].expr_type = tree[declaration].expr_type;
            if !tree[declaration].is_decl(DeclKind::Function) {
                type_checker.error(
                    tree,
                    id,
                    format!("'{}' is a simple variable and cannot be called.", name),
                );
                tree[id].expr_type = ExprType::Undefined;
            }
        }
    }

    Ok(())
}

/// When `id` is an argument of a call to a known function: the callee and
/// the argument's position.
fn argument_position(type_checker: &TypeChecker, tree: &SyntaxTree, id: NodeId) -> Option<(NodeId, usize)> {
    let call = tree[id].parent?;
    if !tree[call].is_expr(ExprKind::Call) {
        return None;
    }

    let callee = type_checker.symbol_table.lookup(&tree[call].name)?;
    if !tree[callee].is_decl(DeclKind::Function) {
        return None;
    }

    let position = tree[call].children[0].iter().position(|arg| *arg == id)?;
    Some((callee, position))
}

/// Reported once, on the first argument with no parameter left for it.
fn check_too_many_arguments(type_checker: &mut TypeChecker, tree: &SyntaxTree, id: NodeId) {
    let Some((callee, position)) = argument_position(type_checker, tree, id) else {
        return;
    };

    if position == tree[callee].children[0].len() {
        type_checker.error(
            tree,
            id,
            format!(
                "Too many parameters passed for function '{}' declared on line {}.",
                tree[callee].name, tree[callee].line
            ),
        );
    }
}

/// Checks one argument against its parameter as soon as it is typed.
fn check_argument(type_checker: &mut TypeChecker, tree: &SyntaxTree, id: NodeId) {
    let Some((callee, position)) = argument_position(type_checker, tree, id) else {
        return;
    };
    let Some(param) = tree[callee].children[0].get(position).copied() else {
        return;
    };

    let (function, line) = (&tree[callee].name, tree[callee].line);
    let (param, input) = (&tree[param], &tree[id]);
    let counter = position + 1;

    if !input.is_type_undefined() && param.expr_type != input.expr_type {
        type_checker.diagnostics.error(
            input.line,
            format!(
                "Expecting {} in parameter {} of call to '{}' declared on line {} but got {}.",
                param.expr_type, counter, function, line, input.expr_type
            ),
        );
    }

    if param.is_array && !input.is_array {
        type_checker.diagnostics.error(
            input.line,
            format!(
                "Expecting array in parameter {} of call to '{}' declared on line {}.",
                counter, function, line
            ),
        );
    } else if !param.is_array && input.is_array {
        type_checker.diagnostics.error(
            input.line,
            format!(
                "Not expecting array in parameter {} of call to '{}' declared on line {}.",
                counter, function, line
            ),
        );
    }
}

fn check_too_few_arguments(type_checker: &mut TypeChecker, tree: &SyntaxTree, id: NodeId) {
    let Some(callee) = type_checker.symbol_table.lookup(&tree[id].name) else {
        return;
    };
    if !tree[callee].is_decl(DeclKind::Function) {
        return;
    }

    if tree[callee].children[0].len() > tree[id].children[0].len() {
        type_checker.error(
            tree,
            id,
            format!(
                "Too few parameters passed for function '{}' declared on line {}.",
                tree[callee].name, tree[callee].line
            ),
        );
    }
}

/// A variable becomes visible only after its initializer is checked.
fn check_variable(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let defined = !type_checker.symbol_table.insert(&tree[id].name, id);
    let cursor = &mut type_checker.cursor;
    tree.calculate_memory_offset(id, &mut cursor.local, &mut cursor.global)?;

    let initializer = tree[id].child(0);

    if let Some(initializer) = initializer {
        if !tree.is_constant_expression(initializer)? {
            type_checker.error(
                tree,
                id,
                format!(
                    "Initializer for variable '{}' is not a constant expression.",
                    tree[id].name
                ),
            );
        }
    }

    if defined {
        report_redeclaration(type_checker, tree, id);
    }

    if let Some(initializer) = initializer {
        let (expected, found) = (tree[id].expr_type, tree[initializer].expr_type);
        if found != ExprType::Undefined && expected != found {
            type_checker.error(
                tree,
                id,
                format!(
                    "Variable '{}' is of {} but is being initialized with an expression of {}.",
                    tree[id].name, expected, found
                ),
            );
        }
    }

    Ok(())
}

fn check_condition(type_checker: &mut TypeChecker, tree: &SyntaxTree, id: NodeId) -> Result<(), Error> {
    let condition = operand(tree, id, 0)?;
    let (found, is_array) = (tree[condition].expr_type, tree[condition].is_array);

    if found == ExprType::Undefined {
        return Ok(());
    }

    if found != ExprType::Bool {
        type_checker.error(
            tree,
            id,
            format!(
                "Expecting Boolean test condition in {} statement but got {}.",
                tree[id].token, found
            ),
        );
    }

    if is_array {
        type_checker.error(
            tree,
            id,
            format!("Cannot use array as test condition in {} statement.", tree[id].token),
        );
    }

    Ok(())
}

fn check_return(type_checker: &mut TypeChecker, tree: &mut SyntaxTree, id: NodeId) -> Result<(), Error> {
    let Some(function) = tree[id].function else {
        return Ok(());
    };
    tree[function].set_has_return(true)?;

    let (name, line, expected) = {
        let node = &tree[function];
        (node.name.clone(), node.line, node.expr_type)
    };
    let expecting_value = expected != ExprType::Void;

    match tree[id].child(0) {
        Some(value) => {
            let found = tree[value].expr_type;

            if !expecting_value {
                type_checker.error(
                    tree,
                    id,
                    format!(
                        "Function '{}' at line {} is expecting no return value, but return has return value.",
                        name, line
                    ),
                );
            } else if found != ExprType::Undefined && found != expected {
                type_checker.error(
                    tree,
                    id,
                    format!(
                        "Function '{}' at line {} is expecting to return {} but got {}.",
                        name, line, expected, found
                    ),
                );
            }

            if tree[value].is_array {
                type_checker.error(tree, id, String::from("Cannot return an array."));
            }
        }
        None => {
            if expecting_value {
                type_checker.error(
                    tree,
                    id,
                    format!(
                        "Function '{}' at line {} is expecting to return {} but return has no return value.",
                        name, line, expected
                    ),
                );
            }
        }
    }

    Ok(())
}
