//! Main compiler module.
//!
//! This module holds the code generator state and drives emission of a whole
//! program: header, I/O library, user functions and the init block that
//! sets up global memory and calls `main`.

use std::{collections::HashMap, fs, path::Path};

use log::{debug, info};

use crate::{
    ast::{
        ast::{DeclKind, ExprType, MemoryType, NodeId, NodeKind, MAX_CHILDREN},
        tree::SyntaxTree,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::{
        symbol_table::SymbolTable,
        type_checker::{TypeChecker, FRAME_START},
    },
    Position,
};

use super::{
    emitter::{Emitter, OpCode, Register},
    stmt::{emit_array_copy, gen_node},
};

/// Frame cursors for the function being generated.
///
/// `temp` is the next free temporary slot below the frame's declarations and
/// `param` the next parameter slot of a call being set up. Both grow
/// downward and are restored once the construct that moved them is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenContext {
    pub temp: i32,
    pub param: i32,
}

impl GenContext {
    /// Cursors for code running in a frame of `frame_size` slots.
    pub fn for_frame(frame_size: i32) -> Self {
        GenContext {
            temp: -frame_size,
            param: FRAME_START,
        }
    }
}

/// The code generator.
///
/// This structure carries everything emission needs:
/// - The analysed syntax tree, whose `generated` flags are updated as code
///   is emitted
/// - The global scope of the symbol table, to resolve call targets
/// - The emitter collecting the listing
/// - The entry address of every function generated so far
pub struct Compiler<'a> {
    /// The analysed tree being compiled
    pub tree: &'a mut SyntaxTree,
    /// Symbol table left by analysis, only the global scope remains
    pub symbol_table: &'a SymbolTable,
    /// Where instructions are written
    pub emitter: Emitter,
    /// Entry address of each generated function
    pub entry_points: HashMap<NodeId, i32>,
    /// First address past global memory, where the first frame starts
    pub global_offset: i32,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler for an analysed tree.
    ///
    /// # Arguments
    ///
    /// * `tree` - The tree annotated by [`type_check`](crate::type_checker::type_checker::type_check)
    /// * `type_checker` - The analysis state, for its symbol table and global offset
    pub fn new(tree: &'a mut SyntaxTree, type_checker: &'a TypeChecker) -> Self {
        Compiler {
            tree,
            symbol_table: &type_checker.symbol_table,
            emitter: Emitter::new(),
            entry_points: HashMap::new(),
            global_offset: type_checker.global_offset(),
        }
    }

    /// Entry address of the global function called `name`.
    pub fn entry_point(&self, name: &str) -> Result<i32, Error> {
        self.symbol_table
            .lookup_global(name)
            .and_then(|id| self.entry_points.get(&id).copied())
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::UnresolvedFunction {
                        name: String::from(name),
                    },
                    Position(0, self.tree.file.clone()),
                )
            })
    }

    /// Loads the address of array `id` into `register`. Array parameters
    /// hold the address itself, everything else is addressed in place.
    pub fn load_array_base(&mut self, register: Register, id: NodeId, comment: &str) -> Result<(), Error> {
        let node = &self.tree[id];
        let offset = node.memory_offset;

        if node.is_in_global_memory()? {
            self.emitter
                .emit_rm(OpCode::Lda, register, offset, Register::GP, comment);
        } else if node.memory_type == MemoryType::Param {
            self.emitter
                .emit_rm(OpCode::Ld, register, offset, Register::FP, comment);
        } else {
            self.emitter
                .emit_rm(OpCode::Lda, register, offset, Register::FP, comment);
        }
        Ok(())
    }

    /// Base register for scalar storage of `id`.
    pub fn base_register(&self, id: NodeId) -> Result<Register, Error> {
        if self.tree[id].is_in_global_memory()? {
            Ok(Register::GP)
        } else {
            Ok(Register::FP)
        }
    }

    /// Writes the function prologue and records its entry address.
    pub fn function_header(&mut self, id: NodeId) {
        self.emitter.comment("** ** ** ** ** ** ** ** ** ** ** **");
        self.emitter
            .comment(&format!("FUNCTION {}", self.tree[id].name));

        let entry = self.emitter.skip(0);
        self.entry_points.insert(id, entry);
        debug!("function {} starts at {}", self.tree[id].name, entry);

        self.emitter
            .emit_rm(OpCode::St, Register::AC, -1, Register::FP, "Store return address");
    }

    /// Writes the function epilogue. User functions get a return of 0 in
    /// case control falls off the end.
    pub fn function_footer(&mut self, id: NodeId, standard_closing: bool) {
        if standard_closing {
            self.emitter
                .comment("Add standard closing in case there is no return statement");
            self.emitter
                .emit_rm(OpCode::Ldc, Register::RT, 0, Register::GP, "Set return value to 0");
            self.emit_return_sequence();
        }

        self.emitter
            .comment(&format!("END FUNCTION {}", self.tree[id].name));
        self.emitter.comment("");
    }

    /// Jumps back to the caller, restoring its frame.
    pub fn emit_return_sequence(&mut self) {
        self.emitter
            .emit_rm(OpCode::Ld, Register::AC, -1, Register::FP, "Load return address");
        self.emitter
            .emit_rm(OpCode::Ld, Register::FP, 0, Register::FP, "Adjust frame pointer");
        self.emitter.emit_goto(0, Register::AC, "Return");
    }
}

/// Generates TM code for an analysed tree.
///
/// Refuses to run when analysis reported errors. Returns the emitter holding
/// the finished listing.
pub fn compile(tree: &mut SyntaxTree, type_checker: &TypeChecker) -> Result<Emitter, Error> {
    let errors = type_checker.diagnostics.error_count();
    if errors > 0 {
        return Err(Error::new(
            ErrorImpl::AnalysisFailed { errors },
            Position(0, tree.file.clone()),
        ));
    }

    let mut compiler = Compiler::new(tree, type_checker);

    compiler.emitter.comment(&format!(
        "{} compiler version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    compiler
        .emitter
        .comment(&format!("File compiled: {}", compiler.tree.file));
    compiler.emitter.comment("");
    compiler.emitter.skip(1);

    gen_io_library(&mut compiler)?;

    for root in compiler.tree.roots.clone() {
        let mut context = GenContext::for_frame(-FRAME_START);
        gen_node(&mut compiler, root, &mut context)?;
    }

    gen_init(&mut compiler)?;

    info!(
        "generated {} instructions for {}",
        compiler.emitter.loc(),
        compiler.tree.file
    );
    Ok(compiler.emitter)
}

/// Writes a finished listing to `path`.
pub fn save_listing_to_file(emitter: &Emitter, path: &Path) -> Result<(), Error> {
    fs::write(path, emitter.listing()).map_err(|error| {
        Error::new(
            ErrorImpl::FileError {
                path: path.to_string_lossy().to_string(),
                message: error.to_string(),
            },
            Position::null(),
        )
    })?;

    info!("wrote {}", path.display());
    Ok(())
}

/// The seven routines the analyser declared, each a single TM I/O
/// instruction between the usual prologue and return.
fn gen_io_library(compiler: &mut Compiler) -> Result<(), Error> {
    for id in compiler.tree.builtins.clone() {
        compiler.function_header(id);

        let parameter = compiler.tree[id].child(0).map(|param| compiler.tree[param].expr_type);
        if parameter.is_some() {
            compiler
                .emitter
                .emit_rm(OpCode::Ld, Register::AC, FRAME_START, Register::FP, "Load parameter");
        }

        let (op, register, comment) = match (parameter, compiler.tree[id].expr_type) {
            (Some(ExprType::Bool), _) => (OpCode::OutB, Register::AC, "Output bool"),
            (Some(ExprType::Char), _) => (OpCode::OutC, Register::AC, "Output char"),
            (Some(_), _) => (OpCode::Out, Register::AC, "Output integer"),
            (None, ExprType::Int) => (OpCode::In, Register::RT, "Grab int input"),
            (None, ExprType::Bool) => (OpCode::InB, Register::RT, "Grab bool input"),
            (None, ExprType::Char) => (OpCode::InC, Register::RT, "Grab char input"),
            (None, _) => (OpCode::OutNl, Register::AC, "Output a new line"),
        };
        compiler
            .emitter
            .emit_ro(op, register, register, register, comment);

        compiler.emit_return_sequence();
        compiler.function_footer(id, false);
    }

    Ok(())
}

/// Patches the jump at address 0, sets up the global and frame pointers,
/// initializes globals and statics, then calls `main` and halts.
fn gen_init(compiler: &mut Compiler) -> Result<(), Error> {
    compiler.emitter.comment("INIT");
    compiler
        .emitter
        .back_patch_jump_to_here(0, "Jump to init [backpatch]");

    compiler
        .emitter
        .emit_rm(OpCode::Ld, Register::GP, 0, Register::GP, "Set the global pointer");
    compiler.emitter.emit_rm(
        OpCode::Lda,
        Register::FP,
        compiler.global_offset,
        Register::GP,
        "Set first frame at end of globals",
    );
    compiler.emitter.emit_rm(
        OpCode::St,
        Register::FP,
        0,
        Register::FP,
        "Store old frame pointer (point to self)",
    );

    compiler.emitter.comment("INIT GLOBALS AND STATICS");
    for root in compiler.tree.roots.clone() {
        init_globals(compiler, root)?;
    }
    compiler.emitter.comment("END INIT GLOBALS AND STATICS");

    let main = compiler.entry_point("main")?;
    compiler
        .emitter
        .emit_rm(OpCode::Lda, Register::AC, 1, Register::PC, "Return address in ac");
    compiler
        .emitter
        .emit_goto_abs(main, "Jump to function main");
    compiler
        .emitter
        .emit_ro(OpCode::Halt, Register::GP, Register::GP, Register::GP, "DONE!");
    compiler.emitter.comment("END INIT");

    Ok(())
}

/// Post-order walk that initializes every global and static variable: array
/// length headers first, then the initializer value when there is one.
fn init_globals(compiler: &mut Compiler, id: NodeId) -> Result<(), Error> {
    for slot in 0..MAX_CHILDREN {
        for child in compiler.tree[id].children[slot].clone() {
            init_globals(compiler, child)?;
        }
    }

    if compiler.tree[id].kind != NodeKind::Declaration(DeclKind::Variable)
        || !compiler.tree[id].is_in_global_memory()?
    {
        return Ok(());
    }

    let node = &compiler.tree[id];
    let (name, offset, size, is_array) = (
        node.name.clone(),
        node.memory_offset,
        node.memory_size,
        node.is_array,
    );
    let mut context = GenContext::for_frame(-FRAME_START);

    if is_array {
        compiler.emitter.emit_rm(
            OpCode::Ldc,
            Register::AC,
            size - 1,
            Register::GP,
            &format!("Load size of {} into AC", name),
        );
        compiler.emitter.emit_rm(
            OpCode::St,
            Register::AC,
            offset + 1,
            Register::GP,
            &format!("Store size of {} in data memory", name),
        );
    }

    if let Some(initializer) = compiler.tree[id].child(0) {
        compiler.tree.set_generated(initializer, false, true);
        gen_node(compiler, initializer, &mut context)?;

        if is_array {
            emit_array_copy(compiler, id)?;
        } else {
            let memory = compiler.tree[id].memory_type;
            compiler.emitter.emit_rm(
                OpCode::St,
                Register::AC,
                offset,
                Register::GP,
                &format!("Assigning variable {} in {}", name, memory),
            );
        }
    }

    Ok(())
}
