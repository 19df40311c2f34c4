use crate::{
    ast::ast::{AssignOp, ExprKind, NodeId, Operator},
    errors::errors::{Error, ErrorImpl},
    type_checker::operators::operand,
};

use super::{
    compiler::{Compiler, GenContext},
    emitter::{OpCode, Register},
    stmt::{emit_array_copy, gen_node},
};

/// Generates an expression, leaving its value in AC. Array values are
/// addresses of element zero.
pub fn gen_expression(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    match compiler.tree[id].expr_kind()? {
        ExprKind::Constant => gen_constant(compiler, id),
        ExprKind::Id => gen_id(compiler, id),
        ExprKind::Call => gen_call(compiler, id, context),
        ExprKind::Op(operator) => gen_operator(compiler, id, operator, context),
        ExprKind::Assign(op) => gen_assign(compiler, id, op, context),
    }
}

fn gen_constant(compiler: &mut Compiler, id: NodeId) -> Result<(), Error> {
    let node = &compiler.tree[id];

    if let (true, Some(value)) = (node.is_array, node.string_value.clone()) {
        compiler.emitter.emit_lit(&value);
        return Ok(());
    }

    let comment = format!("Load {} constant", node.expr_type);
    let value = node.num_value;
    compiler
        .emitter
        .emit_rm(OpCode::Ldc, Register::AC, value, Register::GP, &comment);
    Ok(())
}

fn gen_id(compiler: &mut Compiler, id: NodeId) -> Result<(), Error> {
    let name = compiler.tree[id].name.clone();

    if compiler.tree[id].is_array {
        return compiler.load_array_base(
            Register::AC,
            id,
            &format!("Load base address of array {}", name),
        );
    }

    let base = compiler.base_register(id)?;
    let offset = compiler.tree[id].memory_offset;
    compiler.emitter.emit_rm(
        OpCode::Ld,
        Register::AC,
        offset,
        base,
        &format!("Load variable {} into accumulator", name),
    );
    Ok(())
}

/// Builds the callee frame below the caller's temporaries: the saved frame
/// pointer goes in the ghost frame's slot 0 and each argument is pushed into
/// the parameter slots as soon as it is evaluated.
fn gen_call(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    let name = compiler.tree[id].name.clone();
    let callee = compiler.symbol_table.lookup_global(&name).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnresolvedFunction { name: name.clone() },
            compiler.tree[id].position(),
        )
    })?;

    compiler.emitter.comment(&format!("CALL {}", name));
    compiler.emitter.emit_rm(
        OpCode::St,
        Register::FP,
        context.temp,
        Register::FP,
        &format!("Store frame pointer in ghost frame for {}", name),
    );

    let saved = *context;
    context.param = context.temp - 2;
    context.temp -= compiler.tree[callee].memory_size;

    for argument in compiler.tree[id].children[0].clone() {
        gen_node(compiler, argument, context)?;
        compiler.emitter.emit_rm(
            OpCode::St,
            Register::AC,
            context.param,
            Register::FP,
            "Push parameter onto new frame",
        );
        context.param -= 1;
    }

    compiler.emitter.comment("Begin call");
    compiler.emitter.emit_rm(
        OpCode::Lda,
        Register::FP,
        saved.temp,
        Register::FP,
        "Move the frame pointer to the new frame",
    );
    compiler.emitter.emit_rm(
        OpCode::Lda,
        Register::AC,
        1,
        Register::PC,
        "Store the return address in ac (skip 1 ahead)",
    );
    let entry = compiler.entry_point(&name)?;
    compiler.emitter.emit_goto_abs(entry, "Call function");
    *context = saved;

    compiler.emitter.emit_rm(
        OpCode::Lda,
        Register::AC,
        0,
        Register::RT,
        "Save return result in accumulator",
    );
    compiler.emitter.comment(&format!("END CALL {}", name));
    Ok(())
}

fn gen_operator(
    compiler: &mut Compiler,
    id: NodeId,
    operator: Operator,
    context: &mut GenContext,
) -> Result<(), Error> {
    if operator == Operator::Index {
        return gen_index(compiler, id, context);
    }

    let lhs = operand(compiler.tree, id, 0)?;
    gen_node(compiler, lhs, context)?;

    if operator.is_unary() {
        let emitter = &mut compiler.emitter;
        match operator {
            Operator::Negate => emitter.emit_ro(
                OpCode::Neg,
                Register::AC,
                Register::AC,
                Register::GP,
                "- Change Sign Operation",
            ),
            Operator::Not => {
                emitter.emit_rm(
                    OpCode::Ldc,
                    Register::AC1,
                    1,
                    Register::GP,
                    "Load 1 into AC1 for not operation",
                );
                emitter.emit_ro(
                    OpCode::Tne,
                    Register::AC,
                    Register::AC1,
                    Register::AC,
                    "Not ! operation store in AC",
                );
            }
            Operator::Random => emitter.emit_ro(
                OpCode::Rnd,
                Register::AC,
                Register::AC,
                Register::GP,
                "Gen rand between 0 and value of AC in AC",
            ),
            _ => emitter.emit_rm(OpCode::Ld, Register::AC, 1, Register::AC, "Load array size"),
        }
        return Ok(());
    }

    compiler.emitter.emit_rm(
        OpCode::St,
        Register::AC,
        context.temp,
        Register::FP,
        "Push left side onto temp variable stack",
    );
    context.temp -= 1;

    let rhs = operand(compiler.tree, id, 1)?;
    gen_node(compiler, rhs, context)?;

    context.temp += 1;
    compiler.emitter.emit_rm(
        OpCode::Ld,
        Register::AC1,
        context.temp,
        Register::FP,
        "Pop left hand side into AC1",
    );

    let (op, comment) = match operator {
        Operator::Plus => (OpCode::Add, "+ Operation"),
        Operator::Minus => (OpCode::Sub, "- Subtraction Operation"),
        Operator::Times => (OpCode::Mul, "* Multiplication Operation"),
        Operator::Divide => (OpCode::Div, "/ Division operation"),
        Operator::Mod => (OpCode::Mod, "% mod operation"),
        Operator::Equals => (OpCode::Teq, "== Equality Operation"),
        Operator::NotEquals => (OpCode::Tne, "!= Equality Operation"),
        Operator::And => (OpCode::And, "AND operation store in AC"),
        Operator::Or => (OpCode::Or, "OR operation store in AC"),
        Operator::LessEquals => (OpCode::Tle, "LEQ <= operation store in AC"),
        Operator::Less => (OpCode::Tlt, "Less than < operation store in AC"),
        Operator::GreaterEquals => (OpCode::Tge, "GEQ >= operation store in AC"),
        _ => (OpCode::Tgt, "Greater than > operation store in AC"),
    };
    compiler
        .emitter
        .emit_ro(op, Register::AC, Register::AC1, Register::AC, comment);
    Ok(())
}

/// Reads `array[index]` into AC.
fn gen_index(compiler: &mut Compiler, id: NodeId, context: &mut GenContext) -> Result<(), Error> {
    let array = operand(compiler.tree, id, 0)?;
    let index = operand(compiler.tree, id, 1)?;
    compiler.tree.set_generated(array, true, true);
    gen_node(compiler, index, context)?;

    let name = compiler.tree[array].name.clone();
    compiler.load_array_base(
        Register::AC2,
        array,
        &format!("Load base address of array {} into AC2", name),
    )?;
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
        &format!("Load array element {} from AC into loc from AC2", name),
    );
    Ok(())
}

/// Stores into a scalar or an array element. Compound forms load the old
/// value into AC1 first; the stored value stays in AC as the result.
fn gen_assign(
    compiler: &mut Compiler,
    id: NodeId,
    op: AssignOp,
    context: &mut GenContext,
) -> Result<(), Error> {
    let lhs = operand(compiler.tree, id, 0)?;
    let rhs = compiler.tree[id].child(1);
    compiler.tree[lhs].generated = true;

    if compiler.tree[lhs].is_expr(ExprKind::Op(Operator::Index)) {
        let array = operand(compiler.tree, lhs, 0)?;
        let index = operand(compiler.tree, lhs, 1)?;
        compiler.tree.set_generated(array, true, true);

        gen_node(compiler, index, context)?;
        compiler.emitter.emit_rm(
            OpCode::St,
            Register::AC,
            context.temp,
            Register::FP,
            "Push array index onto temp stack",
        );
        context.temp -= 1;

        if let Some(rhs) = rhs {
            gen_node(compiler, rhs, context)?;
        }

        context.temp += 1;
        compiler.emitter.emit_rm(
            OpCode::Ld,
            Register::AC1,
            context.temp,
            Register::FP,
            "Pop array index into AC1",
        );

        let name = compiler.tree[array].name.clone();
        compiler.load_array_base(
            Register::AC2,
            array,
            &format!("Load base address of array {} into AC2", name),
        )?;
        compiler.emitter.emit_ro(
            OpCode::Sub,
            Register::AC2,
            Register::AC2,
            Register::AC1,
            "Compute offset for array",
        );

        if op.reads_target() {
            compiler
                .emitter
                .emit_rm(OpCode::Ld, Register::AC1, 0, Register::AC2, "Load lhs variable");
            emit_assign_math(compiler, op);
        }

        compiler.emitter.emit_rm(
            OpCode::St,
            Register::AC,
            0,
            Register::AC2,
            &format!("Store variable {} from AC into loc from AC2", name),
        );
        return Ok(());
    }

    if let Some(rhs) = rhs {
        gen_node(compiler, rhs, context)?;
    }

    if compiler.tree[lhs].is_array {
        return emit_array_copy(compiler, lhs);
    }

    let base = compiler.base_register(lhs)?;
    let node = &compiler.tree[lhs];
    let (offset, comment) = (
        node.memory_offset,
        format!("Assigning variable {} in {}", node.name, node.memory_type),
    );

    if op.reads_target() {
        compiler
            .emitter
            .emit_rm(OpCode::Ld, Register::AC1, offset, base, "Load lhs variable");
        emit_assign_math(compiler, op);
    }

    compiler
        .emitter
        .emit_rm(OpCode::St, Register::AC, offset, base, &comment);
    Ok(())
}

/// Combines the old value in AC1 with the right-hand side in AC.
fn emit_assign_math(compiler: &mut Compiler, op: AssignOp) {
    let emitter = &mut compiler.emitter;
    match op {
        AssignOp::AddAssign => {
            emitter.emit_ro(OpCode::Add, Register::AC, Register::AC1, Register::AC, "+= operation")
        }
        AssignOp::SubAssign => {
            emitter.emit_ro(OpCode::Sub, Register::AC, Register::AC1, Register::AC, "-= operation")
        }
        AssignOp::MulAssign => {
            emitter.emit_ro(OpCode::Mul, Register::AC, Register::AC1, Register::AC, "*= operation")
        }
        AssignOp::DivAssign => {
            emitter.emit_ro(OpCode::Div, Register::AC, Register::AC1, Register::AC, "/= operation")
        }
        AssignOp::Increment => emitter.emit_rm(
            OpCode::Lda,
            Register::AC,
            1,
            Register::AC1,
            "++ Increment accumulator operation",
        ),
        AssignOp::Decrement => emitter.emit_rm(
            OpCode::Lda,
            Register::AC,
            -1,
            Register::AC1,
            "-- Decrement accumulator operation",
        ),
        AssignOp::Assign => {}
    }
}
