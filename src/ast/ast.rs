use std::{fmt::Display, rc::Rc};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Number of fixed child slots every node carries.
pub const MAX_CHILDREN: usize = 3;

/// Stable index of a node inside a [`SyntaxTree`](super::tree::SyntaxTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Function,
    Variable,
    Param,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtKind {
    Compound,
    Selection,
    For,
    While,
    Return,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    LessEquals,
    Less,
    GreaterEquals,
    Greater,
    Equals,
    NotEquals,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Negate,
    Times,
    SizeOf,
    Divide,
    Mod,
    Random,
    Index,
}

impl Operator {
    /// The spelling used in diagnostics and tree dumps.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::LessEquals => "<=",
            Operator::Less => "<",
            Operator::GreaterEquals => ">=",
            Operator::Greater => ">",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Negate => "chsign",
            Operator::Times => "*",
            Operator::SizeOf => "sizeof",
            Operator::Divide => "/",
            Operator::Mod => "%",
            Operator::Random => "?",
            Operator::Index => "[",
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::Not | Operator::Negate | Operator::SizeOf | Operator::Random
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Increment,
    Decrement,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::Increment => "++",
            AssignOp::Decrement => "--",
        }
    }

    /// Everything except plain `=` reads the left-hand side first.
    pub fn reads_target(&self) -> bool {
        *self != AssignOp::Assign
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Call,
    Constant,
    Id,
    Op(Operator),
    Assign(AssignOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Declaration(DeclKind),
    Expression(ExprKind),
    Statement(StmtKind),
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Declaration(kind) => write!(f, "{:?} declaration", kind),
            NodeKind::Expression(kind) => write!(f, "{:?} expression", kind),
            NodeKind::Statement(kind) => write!(f, "{:?} statement", kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprType {
    Int,
    Bool,
    Char,
    Void,
    Undefined,
}

impl Display for ExprType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprType::Int => write!(f, "type int"),
            ExprType::Bool => write!(f, "type bool"),
            ExprType::Char => write!(f, "type char"),
            ExprType::Void => write!(f, "type void"),
            ExprType::Undefined => write!(f, "undefined type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    Local,
    LocalStatic,
    Param,
    Global,
    Undefined,
}

impl Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryType::Global => write!(f, "Global"),
            MemoryType::Local => write!(f, "Local"),
            MemoryType::LocalStatic => write!(f, "Static"),
            MemoryType::Param => write!(f, "Param"),
            MemoryType::Undefined => write!(f, "Undefined"),
        }
    }
}

/// A single tree node. Every construct of the language is one of these,
/// told apart by `kind`.
///
/// The semantic flags (`used`, `initialized`, `has_return`, the init check)
/// are private: their mutators validate the node kind and fail with an
/// internal error instead of silently corrupting the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,

    pub line: i32,
    pub file: Rc<String>,
    /// Raw text of the token that produced the node.
    pub token: String,
    /// Identifier for declarations, ids and calls; literal text for constants.
    pub name: String,
    pub char_value: char,
    pub num_value: i32,
    pub string_value: Option<String>,

    pub expr_type: ExprType,
    pub is_array: bool,
    pub is_static: bool,
    check_init: bool,
    used: bool,
    initialized: bool,
    has_return: bool,

    pub memory_type: MemoryType,
    pub memory_size: i32,
    pub memory_offset: i32,
    pub generated: bool,
    /// Address of an unpatched `break` jump.
    pub break_patch: Option<i32>,

    pub children: [Vec<NodeId>; MAX_CHILDREN],
    pub parent: Option<NodeId>,
    pub function: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, line: i32, file: Rc<String>, token: &str) -> Self {
        Node {
            kind,
            line,
            file,
            token: String::from(token),
            name: String::from(token),
            char_value: '\0',
            num_value: 0,
            string_value: None,
            expr_type: ExprType::Undefined,
            is_array: false,
            is_static: false,
            check_init: true,
            used: false,
            initialized: false,
            has_return: false,
            memory_type: MemoryType::Undefined,
            memory_size: 1,
            memory_offset: 0,
            generated: false,
            break_patch: None,
            children: [vec![], vec![], vec![]],
            parent: None,
            function: None,
        }
    }

    pub fn position(&self) -> Position {
        Position(self.line.max(0) as u32, Rc::clone(&self.file))
    }

    fn wrong_kind(&self, expected: &str) -> Error {
        Error::new(
            ErrorImpl::WrongNodeKind {
                expected: String::from(expected),
                found: self.kind.to_string(),
            },
            self.position(),
        )
    }

    pub fn decl_kind(&self) -> Result<DeclKind, Error> {
        match self.kind {
            NodeKind::Declaration(kind) => Ok(kind),
            _ => Err(self.wrong_kind("declaration")),
        }
    }

    pub fn expr_kind(&self) -> Result<ExprKind, Error> {
        match self.kind {
            NodeKind::Expression(kind) => Ok(kind),
            _ => Err(self.wrong_kind("expression")),
        }
    }

    pub fn stmt_kind(&self) -> Result<StmtKind, Error> {
        match self.kind {
            NodeKind::Statement(kind) => Ok(kind),
            _ => Err(self.wrong_kind("statement")),
        }
    }

    pub fn is_decl(&self, kind: DeclKind) -> bool {
        self.kind == NodeKind::Declaration(kind)
    }

    pub fn is_expr(&self, kind: ExprKind) -> bool {
        self.kind == NodeKind::Expression(kind)
    }

    pub fn is_stmt(&self, kind: StmtKind) -> bool {
        self.kind == NodeKind::Statement(kind)
    }

    pub fn is_type_undefined(&self) -> bool {
        self.expr_type == ExprType::Undefined
    }

    pub fn cancel_check_init(&mut self) {
        self.check_init = false;
    }

    pub fn should_check_init(&self) -> bool {
        !self.is_static && self.check_init
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn set_used(&mut self, used: bool) -> Result<(), Error> {
        self.decl_kind()?;
        self.used = used;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) -> Result<(), Error> {
        if self.decl_kind()? == DeclKind::Function {
            return Err(Error::new(
                ErrorImpl::InvalidFlag {
                    flag: String::from("initialized"),
                    node: self.kind.to_string(),
                },
                self.position(),
            ));
        }

        self.initialized = initialized;
        Ok(())
    }

    fn expect_function(&self, flag: &str) -> Result<(), Error> {
        match self.kind {
            NodeKind::Declaration(DeclKind::Function) => Ok(()),
            NodeKind::Declaration(_) => Err(Error::new(
                ErrorImpl::InvalidFlag {
                    flag: String::from(flag),
                    node: self.kind.to_string(),
                },
                self.position(),
            )),
            _ => Err(self.wrong_kind("function declaration")),
        }
    }

    pub fn has_return(&self) -> Result<bool, Error> {
        self.expect_function("has_return")?;
        Ok(self.has_return)
    }

    pub fn set_has_return(&mut self, has_return: bool) -> Result<(), Error> {
        self.expect_function("has_return")?;
        self.has_return = has_return;
        Ok(())
    }

    /// Globals and statics live in the persistent address space.
    pub fn is_in_global_memory(&self) -> Result<bool, Error> {
        match self.memory_type {
            MemoryType::Global | MemoryType::LocalStatic => Ok(true),
            MemoryType::Local | MemoryType::Param => Ok(false),
            MemoryType::Undefined => Err(Error::new(
                ErrorImpl::UndefinedMemoryType {
                    name: self.name.clone(),
                },
                self.position(),
            )),
        }
    }

    /// Number of occupied child slots.
    pub fn num_children(&self) -> usize {
        self.children.iter().filter(|slot| !slot.is_empty()).count()
    }

    pub fn child(&self, slot: usize) -> Option<NodeId> {
        self.children.get(slot).and_then(|list| list.first().copied())
    }
}
