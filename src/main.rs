use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::exit,
    rc::Rc,
};

use clap::Parser as ClapParser;

use cminus::{
    ast::{printer::print_tree, tree::SyntaxTree},
    compiler::compiler::{compile, save_listing_to_file},
    display_error,
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
    CompileOptions, Position,
};

/// Compiles a C- program into a TM assembly listing.
#[derive(ClapParser, Debug)]
#[clap(name = "cminus", about = "C- compiler targeting the TM virtual machine")]
struct Cli {
    /// Source file, read from stdin when absent
    #[clap(value_parser)]
    source: Option<PathBuf>,

    /// Trace the lexer and parser
    #[clap(short = 'd')]
    debug: bool,

    /// Print the annotated tree with types
    #[clap(short = 'P')]
    print_tree: bool,

    /// Print the annotated tree with types and memory layout
    #[clap(short = 'M')]
    print_memory: bool,

    /// Trace symbol table operations
    #[clap(short = 'S')]
    symbol_table: bool,

    /// Listing to write instead of the default
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl From<Cli> for CompileOptions {
    fn from(cli: Cli) -> Self {
        CompileOptions {
            parser_debug: cli.debug,
            print_tree: cli.print_tree,
            print_memory: cli.print_memory,
            symbol_table_debug: cli.symbol_table,
            source: cli.source,
            output: cli.output,
        }
    }
}

fn main() {
    let options = CompileOptions::from(Cli::parse());

    env_logger::Builder::new()
        .parse_filters(&options.log_filters())
        .parse_default_env()
        .init();

    if !run(&options) {
        exit(1);
    }
}

/// Runs the whole pipeline. Returns whether it finished without errors.
fn run(options: &CompileOptions) -> bool {
    let source = match read_source(options) {
        Ok(source) => source,
        Err(error) => {
            display_error(&error, "");
            return false;
        }
    };

    let file = Rc::new(match &options.source {
        Some(path) => path.to_string_lossy().to_string(),
        None => String::from("<stdin>"),
    });

    let tree = tokenize(source.clone(), Some(file.to_string()))
        .and_then(|tokens| parse(tokens, Rc::clone(&file)));

    let mut tree = match tree {
        Ok(tree) => tree,
        Err(error) => {
            display_error(&error, &source);
            let mut diagnostics = Diagnostics::quiet();
            diagnostics.syntax_error(&error);
            println!("{}", diagnostics.summary());
            return false;
        }
    };

    match analyse_and_generate(&mut tree, options) {
        Ok(success) => success,
        Err(error) => {
            display_error(&error, &source);
            false
        }
    }
}

fn read_source(options: &CompileOptions) -> Result<String, Error> {
    let file_error = |path: String, error: io::Error| {
        Error::new(
            ErrorImpl::FileError {
                path,
                message: error.to_string(),
            },
            Position::null(),
        )
    };

    match &options.source {
        Some(path) => fs::read_to_string(path)
            .map_err(|error| file_error(path.to_string_lossy().to_string(), error)),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|error| file_error(String::from("<stdin>"), error))?;
            Ok(source)
        }
    }
}

fn analyse_and_generate(tree: &mut SyntaxTree, options: &CompileOptions) -> Result<bool, Error> {
    let type_checker = type_check(tree, Diagnostics::new(true))?;

    if options.prints_tree() {
        print!("{}", print_tree(tree, options.print_memory));
    }

    let success = type_checker.diagnostics.error_count() == 0;
    if success {
        let emitter = compile(tree, &type_checker)?;
        save_listing_to_file(&emitter, &options.output_path())?;
    }

    println!("{}", type_checker.diagnostics.summary());
    Ok(success)
}
