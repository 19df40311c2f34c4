use log::trace;

use crate::{
    ast::ast::{DeclKind, NodeId, NodeKind, StmtKind, MAX_CHILDREN},
    errors::errors::Error,
    type_checker::operators::operand,
};

use super::{
    compiler::{Compiler, GenContext},
    emitter::{OpCode, Register},
    expr::gen_expression,
};

/// Generates code for one node unless it has been generated already.
pub fn gen_node(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    if compiler.tree[id].generated {
        return Ok(());
    }
    compiler.tree[id].generated = true;
    trace!("generating {} on line {}", compiler.tree[id].kind, compiler.tree[id].line);

    match compiler.tree[id].kind {
        NodeKind::Declaration(kind) => gen_declaration(compiler, id, kind, context),
        NodeKind::Expression(_) => gen_expression(compiler, id, context),
        NodeKind::Statement(kind) => gen_statement(compiler, id, kind, context),
    }
}

fn gen_slot(compiler: &mut Compiler, id: NodeId, slot: usize, context: &mut GenContext) -> Result<(), Error> {
    for child in compiler.tree[id].children[slot].clone() {
        gen_node(compiler, child, context)?;
    }
    Ok(())
}

fn gen_declaration(
    compiler: &mut Compiler,
    id: NodeId,
    kind: DeclKind,
    context: &mut GenContext,
) -> Result<(), Error> {
    match kind {
        DeclKind::Function => {
            compiler.function_header(id);

            let mut frame = GenContext::for_frame(compiler.tree[id].memory_size);
            for slot in 0..MAX_CHILDREN {
                gen_slot(compiler, id, slot, &mut frame)?;
            }

            compiler.function_footer(id, true);
            Ok(())
        }
        DeclKind::Param => Ok(()),
        DeclKind::Variable => gen_local_variable(compiler, id, context),
    }
}

/// Globals and statics are set up once by the init block, so only frame
/// variables produce code here.
fn gen_local_variable(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    if compiler.tree[id].is_in_global_memory()? {
        return Ok(());
    }

    let node = &compiler.tree[id];
    let (name, offset, size, is_array, memory) = (
        node.name.clone(),
        node.memory_offset,
        node.memory_size,
        node.is_array,
        node.memory_type,
    );

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
            Register::FP,
            &format!("Store size of {} in data memory", name),
        );
    }

    if compiler.tree[id].child(0).is_some() {
        gen_slot(compiler, id, 0, context)?;

        if is_array {
            emit_array_copy(compiler, id)?;
        } else {
            compiler.emitter.emit_rm(
                OpCode::St,
                Register::AC,
                offset,
                Register::FP,
                &format!("Assigning variable {} in {}", name, memory),
            );
        }
    }

    Ok(())
}

pub fn gen_statement(
    compiler: &mut Compiler,
    id: NodeId,
    kind: StmtKind,
    context: &mut GenContext,
) -> Result<(), Error> {
    match kind {
        StmtKind::Compound => {
            compiler.emitter.comment("COMPOUND");
            gen_slot(compiler, id, 0, context)?;
            gen_slot(compiler, id, 1, context)?;
            compiler.emitter.comment("END COMPOUND");
        }
        StmtKind::Selection => {
            compiler.emitter.comment("BEGIN IF BLOCK");
            gen_slot(compiler, id, 0, context)?;

            let else_jump = compiler.emitter.skip(1);
            compiler.emitter.comment("IF JUMP TO ELSE");
            gen_slot(compiler, id, 1, context)?;

            let end_jump = compiler.emitter.skip(1);
            compiler.emitter.comment("IF JUMP TO END");
            compiler.emitter.back_patch_branch_to_here(
                OpCode::Jzr,
                Register::AC,
                else_jump,
                "IF JMP TO ELSE",
            );

            gen_slot(compiler, id, 2, context)?;
            compiler.emitter.back_patch_branch_to_here(
                OpCode::Lda,
                Register::PC,
                end_jump,
                "JUMP TO END",
            );
            compiler.emitter.comment("END IF");
        }
        StmtKind::While => {
            compiler.emitter.comment("Beginning WHILE statement");
            let top = compiler.emitter.skip(0);
            gen_slot(compiler, id, 0, context)?;

            let exit_jump = compiler.emitter.skip(1);
            gen_slot(compiler, id, 1, context)?;
            compiler.emitter.emit_goto_abs(top, "Go to L1");

            compiler.emitter.back_patch_branch_to_here(
                OpCode::Jzr,
                Register::AC,
                exit_jump,
                "JMP if condition is false",
            );
            let end = compiler.emitter.skip(0);
            process_breaks(compiler, id, end);
            compiler.emitter.comment("End WHILE statement");
        }
        StmtKind::For => gen_for(compiler, id, context)?,
        StmtKind::Return => {
            if compiler.tree[id].child(0).is_some() {
                gen_slot(compiler, id, 0, context)?;
                compiler.emitter.emit_rm(
                    OpCode::Lda,
                    Register::RT,
                    0,
                    Register::AC,
                    "Copy accumulator to return register",
                );
            }
            compiler.emit_return_sequence();
        }
        StmtKind::Break => {
            let jump = compiler.emitter.skip(1);
            compiler.tree[id].break_patch = Some(jump);
        }
    }

    Ok(())
}

/// `for x in arr do body` walks the array through a hidden index kept in a
/// temporary slot, copying each element into `x` before the body runs.
fn gen_for(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    let variable = operand(compiler.tree, id, 0)?;
    let array = operand(compiler.tree, id, 1)?;
    compiler.tree.set_generated(variable, true, true);
    compiler.tree.set_generated(array, true, true);

    let array_name = compiler.tree[array].name.clone();
    let variable_offset = compiler.tree[variable].memory_offset;

    compiler.emitter.comment("BEGIN FOR");
    let index = context.temp;
    context.temp -= 1;

    compiler
        .emitter
        .emit_rm(OpCode::Ldc, Register::AC, 0, Register::GP, "Start loop index at 0");
    compiler
        .emitter
        .emit_rm(OpCode::St, Register::AC, index, Register::FP, "Store loop index");

    let top = compiler.emitter.skip(0);
    compiler.load_array_base(
        Register::AC2,
        array,
        &format!("Load base address of array {} into AC2", array_name),
    )?;
    compiler
        .emitter
        .emit_rm(OpCode::Ld, Register::AC1, 1, Register::AC2, "Load array size");
    compiler
        .emitter
        .emit_rm(OpCode::Ld, Register::AC, index, Register::FP, "Load loop index");
    compiler.emitter.emit_ro(
        OpCode::Tlt,
        Register::AC,
        Register::AC,
        Register::AC1,
        "Index below array size",
    );
    let exit_jump = compiler.emitter.skip(1);

    compiler
        .emitter
        .emit_rm(OpCode::Ld, Register::AC, index, Register::FP, "Load loop index");
    compiler.emitter.emit_ro(
        OpCode::Sub,
        Register::AC2,
        Register::AC2,
        Register::AC,
        "Compute offset for array",
    );
    compiler.emitter.emit_rm(
        OpCode::Ld,
        Register::AC,
        0,
        Register::AC2,
        &format!("Load array element {}", array_name),
    );
    compiler.emitter.emit_rm(
        OpCode::St,
        Register::AC,
        variable_offset,
        Register::FP,
        &format!("Assign loop variable {}", compiler.tree[variable].name),
    );

    gen_slot(compiler, id, 2, context)?;

    compiler
        .emitter
        .emit_rm(OpCode::Ld, Register::AC, index, Register::FP, "Load loop index");
    compiler
        .emitter
        .emit_rm(OpCode::Lda, Register::AC, 1, Register::AC, "Increment loop index");
    compiler
        .emitter
        .emit_rm(OpCode::St, Register::AC, index, Register::FP, "Store loop index");
    compiler.emitter.emit_goto_abs(top, "Go to loop test");

    compiler.emitter.back_patch_branch_to_here(
        OpCode::Jzr,
        Register::AC,
        exit_jump,
        "JMP when the array is exhausted",
    );
    let end = compiler.emitter.skip(0);
    process_breaks(compiler, id, end);

    context.temp += 1;
    compiler.emitter.comment("END FOR");
    Ok(())
}

/// Points every pending `break` under `id` at `end`. Breaks of inner loops
/// were patched when those loops finished.
fn process_breaks(compiler: &mut Compiler, id: NodeId, end: i32) {
    if let Some(jump) = compiler.tree[id].break_patch.take() {
        compiler.emitter.backup(jump);
        compiler
            .emitter
            .emit_goto_abs(end, "Break statement backpatch jump");
        compiler.emitter.backup(end);
    }

    for slot in 0..MAX_CHILDREN {
        for child in compiler.tree[id].children[slot].clone() {
            process_breaks(compiler, child, end);
        }
    }
}

/// Copies the array whose address is in AC into the array `target`,
/// stopping at the shorter of the two lengths. The loop counts down in AC3
/// while AC and AC2 walk both arrays.
pub fn emit_array_copy(compiler: &mut Compiler, target: NodeId) -> Result<(), Error> {
    let name = compiler.tree[target].name.clone();
    compiler.load_array_base(
        Register::AC2,
        target,
        &format!("Load base address of array {} into AC2", name),
    )?;

    let emitter = &mut compiler.emitter;
    emitter.emit_rm(OpCode::Ld, Register::AC3, 1, Register::AC, "Load source size");
    emitter.emit_rm(OpCode::Ld, Register::AC1, 1, Register::AC2, "Load target size");
    emitter.emit_ro(
        OpCode::Tlt,
        Register::AC1,
        Register::AC1,
        Register::AC3,
        "Target shorter than source",
    );
    emitter.emit_rm(OpCode::Jzr, Register::AC1, 1, Register::PC, "Keep source size");
    emitter.emit_rm(OpCode::Ld, Register::AC3, 1, Register::AC2, "Use target size");

    let top = emitter.skip(0);
    let exit_jump = emitter.skip(1);
    emitter.emit_rm(OpCode::Ld, Register::AC1, 0, Register::AC, "Load source element");
    emitter.emit_rm(OpCode::St, Register::AC1, 0, Register::AC2, "Store target element");
    emitter.emit_rm(OpCode::Lda, Register::AC, -1, Register::AC, "Next source element");
    emitter.emit_rm(OpCode::Lda, Register::AC2, -1, Register::AC2, "Next target element");
    emitter.emit_rm(OpCode::Lda, Register::AC3, -1, Register::AC3, "Count down");
    emitter.emit_goto_abs(top, "Go to copy test");
    emitter.back_patch_branch_to_here(OpCode::Jzr, Register::AC3, exit_jump, "Copy done");

    Ok(())
}
