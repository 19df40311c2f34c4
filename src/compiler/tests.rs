//! Unit tests for code generation.
//!
//! Besides checking the emitted text, generated programs are executed on a
//! small TM interpreter defined below, so tests can assert on what a program
//! prints rather than on every instruction.

use std::{
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use super::{
    compiler::{compile, save_listing_to_file},
    emitter::{Emitter, OpCode, Register},
};
use crate::{
    errors::{diagnostics::Diagnostics, errors::ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

const DATA_SIZE: usize = 10_000;
const STEP_LIMIT: usize = 1_000_000;

fn listing(source: &str) -> String {
    let tokens = tokenize(source.to_string(), Some("test.c-".to_string())).unwrap();
    let mut tree = parse(tokens, Rc::new("test.c-".to_string())).unwrap();
    let type_checker = type_check(&mut tree, Diagnostics::quiet()).unwrap();
    compile(&mut tree, &type_checker).unwrap().listing()
}

#[derive(Debug, Clone)]
struct Instruction {
    op: String,
    operands: [i32; 3],
}

/// Instruction lines by address. Comments and literals are skipped.
fn instructions(listing: &str) -> HashMap<i32, Instruction> {
    let mut program = HashMap::new();

    for line in listing.lines().filter(|line| !line.starts_with('*')) {
        let (address, rest) = line.split_once(':').unwrap();
        let mut words = rest.split_whitespace();
        let op = words.next().unwrap().to_string();
        if op == "LIT" {
            continue;
        }

        let text = words.next().unwrap();
        let operands = match text.split_once('(') {
            Some((head, base)) => {
                let (r, d) = head.split_once(',').unwrap();
                let s = base.trim_end_matches(')');
                [r.parse().unwrap(), d.parse().unwrap(), s.parse().unwrap()]
            }
            None => {
                let parts: Vec<i32> = text.split(',').map(|part| part.parse().unwrap()).collect();
                [parts[0], parts[1], parts[2]]
            }
        };

        let previous = program.insert(address.trim().parse().unwrap(), Instruction { op, operands });
        assert!(previous.is_none(), "address {} emitted twice", address.trim());
    }

    program
}

/// String literals as (address, text) pairs.
fn literals(listing: &str) -> Vec<(usize, String)> {
    listing
        .lines()
        .filter(|line| line.contains("  LIT  "))
        .map(|line| {
            let (address, rest) = line.split_once(':').unwrap();
            let text = rest.split_once('"').unwrap().1.trim_end_matches('"');
            (address.trim().parse().unwrap(), text.replace("\\n", "\n"))
        })
        .collect()
}

/// Runs a listing to HALT and returns what it printed. Integers print
/// followed by a space, booleans as `T`/`F`.
fn run(listing: &str, input: &[i32]) -> String {
    let program = instructions(listing);
    let mut data = vec![0i32; DATA_SIZE];
    for (address, text) in literals(listing) {
        for (i, c) in text.chars().enumerate() {
            data[address - i] = c as i32;
        }
        data[address + 1] = text.chars().count() as i32;
    }
    data[0] = DATA_SIZE as i32 - 1;

    let mut registers = [0i32; 8];
    let mut input: VecDeque<i32> = input.iter().copied().collect();
    let mut output = String::new();

    for _ in 0..STEP_LIMIT {
        let pc = registers[7];
        let instruction = program
            .get(&pc)
            .unwrap_or_else(|| panic!("no instruction at {}", pc));
        registers[7] = pc + 1;

        let [r, a, b] = instruction.operands;
        let (r, s, t) = (r as usize, a as usize, b as usize);
        let address = (a + registers[b as usize]) as usize;

        match instruction.op.as_str() {
            "HALT" => return output,
            "IN" | "INB" | "INC" => registers[r] = input.pop_front().unwrap(),
            "OUT" => output.push_str(&format!("{} ", registers[r])),
            "OUTB" => output.push_str(if registers[r] != 0 { "T " } else { "F " }),
            "OUTC" => output.push(char::from_u32(registers[r] as u32).unwrap()),
            "OUTNL" => output.push('\n'),
            "ADD" => registers[r] = registers[s] + registers[t],
            "SUB" => registers[r] = registers[s] - registers[t],
            "MUL" => registers[r] = registers[s] * registers[t],
            "DIV" => registers[r] = registers[s] / registers[t],
            "MOD" => registers[r] = registers[s] % registers[t],
            "AND" => registers[r] = registers[s] & registers[t],
            "OR" => registers[r] = registers[s] | registers[t],
            "NEG" => registers[r] = -registers[s],
            "RND" => registers[r] = 0,
            "TLT" => registers[r] = (registers[s] < registers[t]) as i32,
            "TLE" => registers[r] = (registers[s] <= registers[t]) as i32,
            "TGT" => registers[r] = (registers[s] > registers[t]) as i32,
            "TGE" => registers[r] = (registers[s] >= registers[t]) as i32,
            "TEQ" => registers[r] = (registers[s] == registers[t]) as i32,
            "TNE" => registers[r] = (registers[s] != registers[t]) as i32,
            "LD" => registers[r] = data[address],
            "LDA" => registers[r] = address as i32,
            "LDC" => registers[r] = a,
            "ST" => data[address] = registers[r],
            "JMP" => registers[7] = address as i32,
            "JZR" => {
                if registers[r] == 0 {
                    registers[7] = address as i32;
                }
            }
            "JNZ" => {
                if registers[r] != 0 {
                    registers[7] = address as i32;
                }
            }
            other => panic!("unknown instruction {}", other),
        }
    }

    panic!("program did not halt");
}

fn run_source(source: &str) -> String {
    run(&listing(source), &[])
}

#[test]
fn test_instruction_formats() {
    let mut emitter = Emitter::new();
    emitter.comment("FUNCTION main");
    emitter.emit_rm(OpCode::Ld, Register::AC, -1, Register::FP, "Load return address");
    emitter.emit_ro(OpCode::Add, Register::AC, Register::AC1, Register::AC, "+ Operation");

    assert_eq!(
        emitter.lines(),
        [
            "* FUNCTION main",
            "  0:     LD  3,-1(1)\tLoad return address ",
            "  1:    ADD  3,4,3\t+ Operation ",
        ]
    );
    assert_eq!(emitter.loc(), 2);
}

#[test]
fn test_back_patch_restores_cursor() {
    let mut emitter = Emitter::new();
    let jump = emitter.skip(1);
    emitter.emit_rm(OpCode::Ldc, Register::AC, 7, Register::GP, "Load type int constant");
    emitter.emit_rm(OpCode::Ldc, Register::AC, 8, Register::GP, "Load type int constant");
    emitter.back_patch_jump_to_here(jump, "Jump to init [backpatch]");

    assert_eq!(jump, 0);
    assert_eq!(emitter.loc(), 3);
    assert_eq!(
        emitter.lines().last().unwrap(),
        "  0:    JMP  7,2(7)\tJump to init [backpatch] "
    );

    let branch = emitter.skip(1);
    emitter.emit_rm(OpCode::Ldc, Register::AC, 1, Register::GP, "");
    emitter.back_patch_branch_to_here(OpCode::Jzr, Register::AC, branch, "skip");
    assert_eq!(emitter.lines().last().unwrap(), "  3:    JZR  3,1(7)\tskip ");
    assert_eq!(emitter.loc(), 5);
}

#[test]
fn test_literals_grow_upward() {
    let mut emitter = Emitter::new();

    assert_eq!(emitter.emit_lit("hi"), 2);
    assert_eq!(emitter.emit_lit("abc"), 6);
    assert_eq!(
        emitter.lines(),
        [
            "  2:    LIT  \"hi\"",
            "  0:    LDC  3,2(6)\tLoad address of literal char array ",
            "  6:    LIT  \"abc\"",
            "  1:    LDC  3,6(6)\tLoad address of literal char array ",
        ]
    );
}

#[test]
fn test_literal_escapes() {
    let mut emitter = Emitter::new();
    emitter.emit_lit("a\nb");
    assert_eq!(emitter.lines()[0], "  3:    LIT  \"a\\nb\"");
}

#[test]
fn test_compile_refuses_after_errors() {
    let tokens = tokenize("main() { x = 1; }".to_string(), None).unwrap();
    let mut tree = parse(tokens, Rc::new("test.c-".to_string())).unwrap();
    let type_checker = type_check(&mut tree, Diagnostics::quiet()).unwrap();

    let error = compile(&mut tree, &type_checker).unwrap_err();
    assert!(matches!(
        error.get_internal_error(),
        ErrorImpl::AnalysisFailed { errors: 1 }
    ));
}

#[test]
fn test_program_layout() {
    let listing = listing("main() { }");
    let lines: Vec<&str> = listing.lines().collect();

    assert!(lines[0].starts_with("* cminus compiler version"));
    assert_eq!(lines[3], "* ** ** ** ** ** ** ** ** ** ** ** **");
    assert_eq!(lines[4], "* FUNCTION output");
    assert_eq!(lines[5], "  1:     ST  3,-1(1)\tStore return address ");
    assert_eq!(lines[6], "  2:     LD  3,-2(1)\tLoad parameter ");
    assert_eq!(lines[7], "  3:    OUT  3,3,3\tOutput integer ");
    assert_eq!(*lines.last().unwrap(), "* END INIT");

    assert!(listing.contains("* FUNCTION outnl"));
    assert!(listing.contains("* Add standard closing in case there is no return statement"));
    assert!(listing.contains("  0:    JMP  7,"));
    assert!(listing.contains("HALT  0,0,0\tDONE! "));

    let program = instructions(&listing);
    let last = *program.keys().max().unwrap();
    assert!((0..=last).all(|address| program.contains_key(&address)));
}

#[test]
fn test_io_routine_order() {
    let listing = listing("main() { }");
    let order: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.strip_prefix("* FUNCTION "))
        .collect();

    assert_eq!(
        order,
        ["output", "outputb", "outputc", "input", "inputb", "inputc", "outnl", "main"]
    );
}

#[test]
fn test_arithmetic_on_globals() {
    let source = "int x;\nmain() { x = 2 + 3 * 4; output(x); x -= 4; output(x / 3); output(x % 3); outnl(); }";
    assert_eq!(run_source(source), "14 3 1 \n");
}

#[test]
fn test_temporaries_follow_evaluation_order() {
    let listing = listing("main() { output(1 - 2); }");

    assert!(listing.contains("ST  1,-2(1)\tStore frame pointer in ghost frame for output "));
    assert!(listing.contains("ST  3,-5(1)\tPush left side onto temp variable stack "));
    assert!(listing.contains("LD  4,-5(1)\tPop left hand side into AC1 "));
    assert!(listing.contains("ST  3,-4(1)\tPush parameter onto new frame "));
    assert_eq!(run(&listing, &[]), "-1 ");
}

#[test]
fn test_recursion() {
    let source = "int fact(int n)\n\
                  {\n\
                      if (n <= 1) return 1;\n\
                      else return n * fact(n - 1);\n\
                  }\n\
                  main() { output(fact(5)); outnl(); }";
    assert_eq!(run_source(source), "120 \n");
}

#[test]
fn test_while_and_break() {
    let source = "main()\n\
                  {\n\
                      int i;\n\
                      i = 0;\n\
                      while (true) {\n\
                          i++;\n\
                          if (i > 3) break;\n\
                          output(i);\n\
                      }\n\
                      outnl();\n\
                  }";
    let listing = listing(source);

    assert!(listing.contains("Break statement backpatch jump"));
    assert_eq!(run(&listing, &[]), "1 2 3 \n");
}

#[test]
fn test_nested_loop_break_only_leaves_inner_loop() {
    let source = "main()\n\
                  {\n\
                      int i; int j;\n\
                      i = 0;\n\
                      while (i < 2) {\n\
                          j = 0;\n\
                          while (true) { if (j == 2) break; j += 1; }\n\
                          output(i * 10 + j);\n\
                          i++;\n\
                      }\n\
                  }";
    assert_eq!(run_source(source), "2 12 ");
}

#[test]
fn test_if_without_else() {
    let source = "main() { int x; x = 5; if (x > 3) output(1); if (x > 9) output(2); output(3); }";
    assert_eq!(run_source(source), "1 3 ");
}

#[test]
fn test_boolean_operators() {
    let source = "main()\n\
                  {\n\
                      bool t; bool f;\n\
                      t = true; f = false;\n\
                      outputb(t and f); outputb(t or f); outputb(not f); outputb(1 != 2);\n\
                  }";
    assert_eq!(run_source(source), "F T T T ");
}

#[test]
fn test_negation_and_compound_assignment() {
    let source = "main() { int x; x = 6; x *= 2; x /= 4; x += -1; x--; output(x); }";
    assert_eq!(run_source(source), "1 ");
}

#[test]
fn test_local_arrays() {
    let source = "main()\n\
                  {\n\
                      int a[3];\n\
                      a[0] = 4; a[1] = 5; a[2] = a[0] + a[1];\n\
                      a[1] += 10;\n\
                      a[2]++;\n\
                      output(a[1]); output(a[2]); output(*a);\n\
                  }";
    assert_eq!(run_source(source), "15 10 3 ");
}

#[test]
fn test_array_parameters() {
    let source = "int sum(int v[]; int n)\n\
                  {\n\
                      int i; int total;\n\
                      i = 0; total = 0;\n\
                      while (i < n) { total += v[i]; i++; }\n\
                      return total;\n\
                  }\n\
                  int g[4];\n\
                  main() { g[0] = 1; g[1] = 2; g[2] = 3; g[3] = 4; output(sum(g, *g)); }";
    assert_eq!(run_source(source), "10 ");
}

#[test]
fn test_for_statement() {
    let source = "int a[3];\n\
                  main()\n\
                  {\n\
                      a[0] = 5; a[1] = 6; a[2] = 7;\n\
                      for (x in a) { if (x == 7) break; output(x); }\n\
                      outnl();\n\
                  }";
    assert_eq!(run_source(source), "5 6 \n");
}

#[test]
fn test_globals_and_statics_initialized_before_main() {
    let source = "int g = 3;\n\
                  int next()\n\
                  {\n\
                      static int count = 10;\n\
                      count++;\n\
                      return count;\n\
                  }\n\
                  main() { output(g); output(next()); output(next()); }";
    let listing = listing(source);

    let init = listing.find("* INIT GLOBALS AND STATICS").unwrap();
    let end = listing.find("* END INIT GLOBALS AND STATICS").unwrap();
    assert!(listing[init..end].contains("Assigning variable g in Global"));
    assert!(listing[init..end].contains("Assigning variable count in Static"));
    assert_eq!(run(&listing, &[]), "3 11 12 ");
}

#[test]
fn test_string_initializer_copies_into_array() {
    let source = "char s[5] = \"hi\";\n\
                  main() { outputc(s[0]); outputc(s[1]); output(*s); outnl(); }";
    assert_eq!(run_source(source), "hi5 \n");
}

#[test]
fn test_array_assignment_stops_at_shorter_length() {
    let source = "main()\n\
                  {\n\
                      int a[3]; int b[2];\n\
                      a[2] = 9;\n\
                      b[0] = 1; b[1] = 2;\n\
                      a = b;\n\
                      output(a[0]); output(a[1]); output(a[2]);\n\
                  }";
    assert_eq!(run_source(source), "1 2 9 ");
}

#[test]
fn test_input_routines() {
    let listing = listing("main() { int x; x = input(); output(x + 1); outputb(inputb()); }");
    assert_eq!(run(&listing, &[41, 1]), "42 T ");
}

#[test]
fn test_save_listing_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.tm");

    let mut emitter = Emitter::new();
    emitter.comment("END INIT");
    save_listing_to_file(&emitter, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "* END INIT\n");
}
