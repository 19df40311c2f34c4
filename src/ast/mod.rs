/// AST (Abstract Syntax Tree) module
/// Contains the annotated tree shared by parsing, analysis and generation
///
/// Submodules:
/// - ast: the node type and its kind/type/storage enums
/// - tree: the node arena and whole-subtree operations
/// - printer: the indented tree dump used for debugging
pub mod ast;
pub mod printer;
pub mod tree;
