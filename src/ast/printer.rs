use super::{
    ast::{DeclKind, ExprKind, ExprType, MemoryType, NodeId, NodeKind, StmtKind, MAX_CHILDREN},
    tree::SyntaxTree,
};

/// Renders the annotated program tree, one node per line.
///
/// ```text
/// Func main: returns type int [line: 1]
/// .   Child: 1  Compound [line: 1]
/// .   .   Child: 1  Return [line: 2]
/// ```
pub fn print_tree(tree: &SyntaxTree, with_memory: bool) -> String {
    let mut out = String::new();
    print_list(tree, &tree.roots, 0, None, with_memory, &mut out);
    out
}

fn print_list(
    tree: &SyntaxTree,
    list: &[NodeId],
    level: usize,
    child_slot: Option<usize>,
    with_memory: bool,
    out: &mut String,
) {
    for (index, id) in list.iter().enumerate() {
        out.push_str(&".   ".repeat(level));

        if index == 0 {
            if let Some(slot) = child_slot {
                out.push_str(&format!("Child: {}  ", slot));
            }
        } else {
            out.push_str(&format!("Sibling: {}  ", index));
        }

        print_node(tree, *id, with_memory, out);
        out.push('\n');

        for slot in 0..MAX_CHILDREN {
            let children = &tree[*id].children[slot];
            if !children.is_empty() {
                print_list(tree, children, level + 1, Some(slot), with_memory, out);
            }
        }
    }
}

fn array_of(is_array: bool) -> &'static str {
    if is_array {
        "array of "
    } else {
        ""
    }
}

fn print_node(tree: &SyntaxTree, id: NodeId, with_memory: bool, out: &mut String) {
    let node = &tree[id];
    let static_of = if node.is_static { "static " } else { "" };

    let label = match node.kind {
        NodeKind::Declaration(DeclKind::Variable) => format!(
            "Var {}: {}{}{} ",
            node.name,
            static_of,
            array_of(node.is_array),
            node.expr_type
        ),
        NodeKind::Declaration(DeclKind::Function) => {
            format!("Func {}: returns {} ", node.name, node.expr_type)
        }
        NodeKind::Declaration(DeclKind::Param) => format!(
            "Param {}: {}{} ",
            node.name,
            array_of(node.is_array),
            node.expr_type
        ),
        NodeKind::Expression(ExprKind::Assign(op)) => format!(
            "Assign {} : {}{} ",
            op,
            array_of(node.is_array),
            node.expr_type
        ),
        NodeKind::Expression(ExprKind::Call) => {
            format!("Call {}: {} ", node.name, node.expr_type)
        }
        NodeKind::Expression(ExprKind::Constant) => {
            let value = match (&node.string_value, node.expr_type) {
                (Some(value), ExprType::Char) if node.is_array => format!(" \"{}\" :", value),
                (_, ExprType::Char) => format!(": '{}' :", node.char_value),
                _ => format!(" {} :", node.name),
            };
            format!(
                "Const{} {}{} ",
                value,
                array_of(node.is_array),
                node.expr_type
            )
        }
        NodeKind::Expression(ExprKind::Id) => format!(
            "Id {}: {}{}{} ",
            node.name,
            static_of,
            array_of(node.is_array),
            node.expr_type
        ),
        NodeKind::Expression(ExprKind::Op(op)) => {
            format!("Op {} : {} ", op, node.expr_type)
        }
        NodeKind::Statement(kind) => {
            let name = match kind {
                StmtKind::Break => "Break",
                StmtKind::Compound => "Compound",
                StmtKind::For => "For",
                StmtKind::While => "While",
                StmtKind::Return => "Return",
                StmtKind::Selection => "If",
            };
            format!("{} ", name)
        }
    };
    out.push_str(&label);

    if with_memory && node.memory_type != MemoryType::Undefined {
        out.push_str(&format!("[mem: {}  ", node.memory_type));
        if !node.is_decl(DeclKind::Function) {
            out.push_str(&format!("size: {}  ", node.memory_size));
        }
        out.push_str(&format!("loc: {}] ", node.memory_offset));
    }

    out.push_str(&format!("[line: {}]", node.line));
}
