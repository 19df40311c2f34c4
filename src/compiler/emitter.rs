//! Text emission for TM instructions.
//!
//! Lines are kept in the order they were emitted. Backpatched instructions
//! therefore appear after the code that follows them; the machine loads
//! every instruction by its address, so the listing stays valid.

use std::fmt::Display;

use log::trace;

/// The eight TM registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Global pointer, base of global and static storage.
    GP = 0,
    /// Frame pointer of the running function.
    FP = 1,
    /// Return value.
    RT = 2,
    AC = 3,
    AC1 = 4,
    AC2 = 5,
    AC3 = 6,
    PC = 7,
}

impl Register {
    pub fn number(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Halt,
    In,
    Out,
    InB,
    OutB,
    InC,
    OutC,
    OutNl,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Neg,
    Rnd,
    Tlt,
    Tle,
    Teq,
    Tne,
    Tge,
    Tgt,
    Ld,
    Lda,
    Ldc,
    St,
    Jmp,
    Jzr,
    Jnz,
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Halt => "HALT",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::InB => "INB",
            OpCode::OutB => "OUTB",
            OpCode::InC => "INC",
            OpCode::OutC => "OUTC",
            OpCode::OutNl => "OUTNL",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Neg => "NEG",
            OpCode::Rnd => "RND",
            OpCode::Tlt => "TLT",
            OpCode::Tle => "TLE",
            OpCode::Teq => "TEQ",
            OpCode::Tne => "TNE",
            OpCode::Tge => "TGE",
            OpCode::Tgt => "TGT",
            OpCode::Ld => "LD",
            OpCode::Lda => "LDA",
            OpCode::Ldc => "LDC",
            OpCode::St => "ST",
            OpCode::Jmp => "JMP",
            OpCode::Jzr => "JZR",
            OpCode::Jnz => "JNZ",
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.mnemonic())
    }
}

/// First data address handed to string literals. Address 0 holds the size
/// of data memory, read by the init block.
pub const FIRST_LITERAL: i32 = 1;

/// Instruction and literal cursor plus the lines written so far.
#[derive(Debug, Clone)]
pub struct Emitter {
    /// Next instruction address.
    loc: i32,
    /// Next free data address for string literals, growing upward.
    lit_loc: i32,
    lines: Vec<String>,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter {
            loc: 0,
            lit_loc: FIRST_LITERAL,
            lines: vec![],
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    pub fn loc(&self) -> i32 {
        self.loc
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole listing, one line per instruction, literal or comment.
    pub fn listing(&self) -> String {
        let mut listing = self.lines.join("\n");
        listing.push('\n');
        listing
    }

    fn push(&mut self, line: String) {
        trace!("{}", line);
        self.lines.push(line);
    }

    pub fn comment(&mut self, text: &str) {
        self.push(format!("* {}", text));
    }

    /// Register-only instruction.
    pub fn emit_ro(&mut self, op: OpCode, r: Register, s: Register, t: Register, comment: &str) {
        let line = format!(
            "{:>3}:  {:>5}  {},{},{}\t{} ",
            self.loc,
            op,
            r.number(),
            s.number(),
            t.number(),
            comment
        );
        self.push(line);
        self.loc += 1;
    }

    /// Register-to-memory instruction addressing `d(s)`.
    pub fn emit_rm(&mut self, op: OpCode, r: Register, d: i32, s: Register, comment: &str) {
        let line = format!(
            "{:>3}:  {:>5}  {},{}({})\t{} ",
            self.loc,
            op,
            r.number(),
            d,
            s.number(),
            comment
        );
        self.push(line);
        self.loc += 1;
    }

    /// Register-to-memory instruction aimed at an absolute address, encoded
    /// relative to the instruction after this one.
    pub fn emit_rm_abs(&mut self, op: OpCode, r: Register, address: i32, comment: &str) {
        let displacement = address - (self.loc + 1);
        self.emit_rm(op, r, displacement, Register::PC, comment);
    }

    pub fn emit_goto(&mut self, d: i32, s: Register, comment: &str) {
        self.emit_rm(OpCode::Jmp, Register::PC, d, s, comment);
    }

    pub fn emit_goto_abs(&mut self, address: i32, comment: &str) {
        self.emit_rm_abs(OpCode::Jmp, Register::PC, address, comment);
    }

    /// Places a string in the literal area and loads its address into AC.
    /// Characters run downward from the returned address; the length sits
    /// one above it.
    pub fn emit_lit(&mut self, value: &str) -> i32 {
        let length = value.chars().count() as i32;
        self.lit_loc += length - 1;
        let loc = self.lit_loc;

        self.push(format!(
            "{:>3}:  {:>5}  \"{}\"",
            loc,
            "LIT",
            escape_literal(value)
        ));
        self.emit_rm(
            OpCode::Ldc,
            Register::AC,
            loc,
            Register::AC3,
            "Load address of literal char array",
        );

        self.lit_loc += 2;
        loc
    }

    /// Reserves `count` instruction slots and returns the first of them.
    /// `skip(0)` just reports the current address.
    pub fn skip(&mut self, count: i32) -> i32 {
        let loc = self.loc;
        self.loc += count;
        loc
    }

    /// Moves the instruction cursor back to a reserved address.
    pub fn backup(&mut self, loc: i32) {
        self.loc = loc;
    }

    /// Fills the unconditional jump reserved at `address` with a jump to the
    /// current address. The cursor is left where it was.
    pub fn back_patch_jump_to_here(&mut self, address: i32, comment: &str) {
        let current = self.skip(0);
        self.backup(address);
        self.emit_goto_abs(current, comment);
        self.backup(current);
    }

    /// Same as [`Emitter::back_patch_jump_to_here`] for a conditional jump
    /// testing `register`.
    pub fn back_patch_branch_to_here(&mut self, op: OpCode, register: Register, address: i32, comment: &str) {
        let current = self.skip(0);
        self.backup(address);
        self.emit_rm_abs(op, register, current, comment);
        self.backup(current);
    }
}

/// Escapes characters that cannot appear raw inside a `LIT` line.
fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\0' => escaped.push_str("\\0"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            c => escaped.push(c),
        }
    }
    escaped
}
