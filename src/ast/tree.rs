use std::{
    ops::{Index, IndexMut},
    rc::Rc,
};

use crate::errors::errors::{Error, ErrorImpl};

use super::ast::{DeclKind, ExprKind, ExprType, MemoryType, Node, NodeId, NodeKind, MAX_CHILDREN};

/// Arena holding every node of one compilation unit.
///
/// `roots` is the top-level declaration list of the program and `builtins`
/// the synthesized I/O routines. Both are sibling lists in the same arena,
/// so the same traversals apply to each.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
    pub builtins: Vec<NodeId>,
    pub file: Rc<String>,
}

impl Index<NodeId> for SyntaxTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for SyntaxTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl SyntaxTree {
    pub fn new(file: Rc<String>) -> Self {
        SyntaxTree {
            nodes: vec![],
            roots: vec![],
            builtins: vec![],
            file,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a node carrying this tree's file name.
    pub fn add(&mut self, kind: NodeKind, line: i32, token: &str) -> NodeId {
        self.nodes
            .push(Node::new(kind, line, Rc::clone(&self.file), token));
        NodeId(self.nodes.len() - 1)
    }

    pub fn push_child(&mut self, parent: NodeId, slot: usize, child: NodeId) {
        self[parent].children[slot].push(child);
    }

    pub fn set_children(&mut self, parent: NodeId, slot: usize, children: Vec<NodeId>) {
        self[parent].children[slot] = children;
    }

    /// Number of nodes following `id` in its sibling list, plus `id` itself
    /// when `include_self` is set.
    pub fn num_siblings(&self, id: NodeId, include_self: bool) -> usize {
        let list = self.sibling_list(id);
        match list.iter().position(|sibling| *sibling == id) {
            Some(index) => {
                let after = list.len() - index - 1;
                if include_self {
                    after + 1
                } else {
                    after
                }
            }
            None => 0,
        }
    }

    /// Whether `ancestor` is the parent of `id`, or any ancestor when
    /// `transitive` is set.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId, transitive: bool) -> bool {
        let mut visitor = self[id].parent;

        while let Some(current) = visitor {
            if current == ancestor {
                return true;
            }
            if !transitive {
                return false;
            }
            visitor = self[current].parent;
        }

        false
    }

    /// True when no occupied child slot holds an expression of undefined
    /// type. Only the first node of each slot is inspected.
    pub fn check_cascade(&self, id: NodeId) -> bool {
        (0..MAX_CHILDREN)
            .filter_map(|slot| self[id].child(slot))
            .all(|child| !self[child].is_type_undefined())
    }

    /// Whether the expression can be evaluated without reading storage or
    /// calling anything.
    pub fn is_constant_expression(&self, id: NodeId) -> Result<bool, Error> {
        match self[id].expr_kind()? {
            ExprKind::Constant => Ok(true),
            ExprKind::Id | ExprKind::Call | ExprKind::Assign(_) => Ok(false),
            ExprKind::Op(_) => {
                for slot in 0..MAX_CHILDREN {
                    for child in &self[id].children[slot] {
                        if !self.is_constant_expression(*child)? {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
        }
    }

    pub fn type_siblings(&mut self, list: &[NodeId], expr_type: ExprType) {
        for id in list {
            self[*id].expr_type = expr_type;
        }
    }

    pub fn static_siblings(&mut self, list: &[NodeId]) {
        for id in list {
            self[*id].is_static = true;
        }
    }

    /// Copies storage class, size and offset from `source` onto `target`.
    pub fn copy_memory_info(&mut self, target: NodeId, source: NodeId) -> Result<(), Error> {
        if target == source {
            return Err(Error::new(
                ErrorImpl::SelfMemoryCopy,
                self[target].position(),
            ));
        }

        let (memory_type, memory_size, memory_offset) = {
            let node = &self[source];
            (node.memory_type, node.memory_size, node.memory_offset)
        };

        let node = &mut self[target];
        node.memory_type = memory_type;
        node.memory_size = memory_size;
        node.memory_offset = memory_offset;
        Ok(())
    }

    /// Places `id` at the current offset of its address space and moves
    /// that offset down by the node's size. Arrays other than parameters sit
    /// one below the offset so the length header fits above element zero.
    pub fn calculate_memory_offset(
        &mut self,
        id: NodeId,
        local_offset: &mut i32,
        global_offset: &mut i32,
    ) -> Result<(), Error> {
        let offset = if self[id].is_in_global_memory()? {
            global_offset
        } else {
            local_offset
        };

        let node = &self[id];
        let header = i32::from(node.is_array && node.memory_type != MemoryType::Param);
        let (Some(location), Some(next)) = (
            offset.checked_sub(header),
            offset.checked_sub(node.memory_size),
        ) else {
            return Err(self.memory_overflow(id));
        };

        self[id].memory_offset = location;
        *offset = next;
        Ok(())
    }

    /// Frame size of a function: return address and saved frame pointer
    /// plus every per-invocation declaration beneath it.
    pub fn calculate_memory_of_children(&mut self, id: NodeId) -> Result<(), Error> {
        let mut sum: i32 = 2;
        for slot in 0..MAX_CHILDREN {
            for child in self[id].children[slot].clone() {
                let storage = self.frame_storage(child)?;
                sum = sum
                    .checked_add(storage)
                    .ok_or_else(|| self.memory_overflow(id))?;
            }
        }

        self[id].memory_size = sum;
        Ok(())
    }

    fn frame_storage(&self, id: NodeId) -> Result<i32, Error> {
        let node = &self[id];
        let mut sum: i32 = 0;

        if let NodeKind::Declaration(kind) = node.kind {
            if kind != DeclKind::Function && !node.is_in_global_memory()? {
                sum = node.memory_size;
            }
        }

        for slot in 0..MAX_CHILDREN {
            for child in &node.children[slot] {
                let storage = self.frame_storage(*child)?;
                sum = sum
                    .checked_add(storage)
                    .ok_or_else(|| self.memory_overflow(*child))?;
            }
        }

        Ok(sum)
    }

    fn memory_overflow(&self, id: NodeId) -> Error {
        Error::new(
            ErrorImpl::MemoryOverflow {
                name: self[id].name.clone(),
            },
            self[id].position(),
        )
    }

    /// Links every node to its parent and enclosing function. Members of a
    /// sibling list share the parent of the list; top-level nodes have none.
    pub fn set_parent_and_function(&mut self) {
        for list in [self.builtins.clone(), self.roots.clone()] {
            for root in list {
                self[root].parent = None;
                let function = if self[root].is_decl(DeclKind::Function) {
                    Some(root)
                } else {
                    None
                };
                self.link(root, function);
            }
        }
    }

    fn link(&mut self, id: NodeId, function: Option<NodeId>) {
        self[id].function = function;

        for slot in 0..MAX_CHILDREN {
            for child in self[id].children[slot].clone() {
                self[child].parent = Some(id);
                self.link(child, function);
            }
        }
    }

    pub fn set_generated(&mut self, id: NodeId, generated: bool, recursive: bool) {
        self[id].generated = generated;

        if recursive {
            for slot in 0..MAX_CHILDREN {
                for child in self[id].children[slot].clone() {
                    self.set_generated(child, generated, true);
                }
            }
        }
    }

    /// The sibling list `id` belongs to.
    pub fn sibling_list(&self, id: NodeId) -> &[NodeId] {
        let lists: Vec<&Vec<NodeId>> = match self[id].parent {
            Some(parent) => self[parent].children.iter().collect(),
            None => vec![&self.roots, &self.builtins],
        };

        lists
            .into_iter()
            .find(|list| list.contains(&id))
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }
}
