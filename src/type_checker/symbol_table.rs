use std::collections::BTreeMap;

use log::debug;

use crate::ast::ast::NodeId;

/// One lexical scope: a label for debugging and the names bound in it.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub symbols: BTreeMap<String, NodeId>,
}

impl Scope {
    pub fn new(name: &str) -> Self {
        Scope {
            name: String::from(name),
            symbols: BTreeMap::new(),
        }
    }
}

/// Stack of scopes. The bottom scope is the global one and is never popped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new("Global")],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter(&mut self, name: &str) {
        debug!("entering scope {:?} at depth {}", name, self.scopes.len());
        self.scopes.push(Scope::new(name));
    }

    /// Pops the innermost scope, handing every binding in it to `check`
    /// first. Leaving the global scope is ignored.
    pub fn leave<F>(&mut self, check: F)
    where
        F: FnMut(&str, NodeId),
    {
        if self.scopes.len() <= 1 {
            debug!("refusing to leave the global scope");
            return;
        }

        self.apply_to_all(check);
        if let Some(scope) = self.scopes.pop() {
            debug!("leaving scope {:?} with {} symbols", scope.name, scope.symbols.len());
        }
    }

    /// Binds `name` in the innermost scope. Returns false, leaving the
    /// existing binding alone, when the name is already bound there.
    pub fn insert(&mut self, name: &str, id: NodeId) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };

        if scope.symbols.contains_key(name) {
            debug!("{:?} already bound in scope {:?}", name, scope.name);
            return false;
        }

        debug!("binding {:?} in scope {:?}", name, scope.name);
        scope.symbols.insert(String::from(name), id);
        true
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        let found = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name).copied());

        debug!("lookup {:?} -> {:?}", name, found);
        found
    }

    pub fn lookup_global(&self, name: &str) -> Option<NodeId> {
        let found = self
            .scopes
            .first()
            .and_then(|scope| scope.symbols.get(name).copied());

        debug!("global lookup {:?} -> {:?}", name, found);
        found
    }

    /// Runs `f` over the innermost scope's bindings in name order.
    pub fn apply_to_all<F>(&self, mut f: F)
    where
        F: FnMut(&str, NodeId),
    {
        if let Some(scope) = self.scopes.last() {
            for (name, id) in &scope.symbols {
                f(name, *id);
            }
        }
    }
}
