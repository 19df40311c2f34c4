use crate::{
    ast::{
        ast::{DeclKind, ExprType, NodeId, NodeKind},
        tree::SyntaxTree,
    },
    errors::errors::Error,
};

/// Line number carried by every synthesized declaration.
pub const BUILTIN_LINE: i32 = -1;

/// The I/O routines, in the order they are declared and emitted: name,
/// return type and the type of the single parameter, if any.
pub const IO_ROUTINES: [(&str, ExprType, Option<ExprType>); 7] = [
    ("output", ExprType::Void, Some(ExprType::Int)),
    ("outputb", ExprType::Void, Some(ExprType::Bool)),
    ("outputc", ExprType::Void, Some(ExprType::Char)),
    ("input", ExprType::Int, None),
    ("inputb", ExprType::Bool, None),
    ("inputc", ExprType::Char, None),
    ("outnl", ExprType::Void, None),
];

/// Adds the I/O routine declarations to `tree.builtins` so calls to them
/// resolve and type-check like calls to user functions. Does nothing when
/// they are already present.
pub fn add_io_routines(tree: &mut SyntaxTree) -> Result<(), Error> {
    if !tree.builtins.is_empty() {
        return Ok(());
    }

    for (name, return_type, param_type) in IO_ROUTINES {
        let function = tree.add(NodeKind::Declaration(DeclKind::Function), BUILTIN_LINE, name);
        tree[function].expr_type = return_type;

        if return_type != ExprType::Void {
            tree[function].set_has_return(true)?;
        }

        if let Some(param_type) = param_type {
            let dummy = dummy_param(tree, param_type)?;
            tree.push_child(function, 0, dummy);
        }

        tree.builtins.push(function);
    }

    Ok(())
}

fn dummy_param(tree: &mut SyntaxTree, expr_type: ExprType) -> Result<NodeId, Error> {
    let dummy = tree.add(NodeKind::Declaration(DeclKind::Param), BUILTIN_LINE, "*dummy*");
    let node = &mut tree[dummy];
    node.expr_type = expr_type;
    node.cancel_check_init();
    node.set_used(true)?;
    Ok(dummy)
}
