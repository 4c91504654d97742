//! combvm CLI entry point.
//!
//! Behavior summary:
//! - With **no args**, start an interactive REPL over the standard word set.
//! - With `-h`/`--help`, print usage.
//! - With `-v`/`--version`, print the crate version.
//! - With a **script path**, read it whole and compile-and-run it against a
//!   fresh VM, mirroring [`combvm::Vm::read_eval_print_loop`] but reading
//!   from a file instead of stdin.
//!
//! Unlike the teacher's two-mode (`.omg` source / `.omgb` bytecode) dispatch,
//! there is only one mode here: spec.md's Non-goals exclude persistence of
//! compiled images across runs, so there is no bytecode-image path to
//! support, and every invocation compiles from source.

use std::env;
use std::fs;
use std::process::ExitCode;

use combvm::{repl, Vm, VMParameters};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> String {
    format!(
        r#"combvm v{VERSION}

Usage:
    combvm [script]

Arguments:
    [script]
        Path to a source file to compile and run. With no argument, starts
        an interactive REPL instead.

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show the runtime version."#
    )
}

fn run_script(path: &str) -> ExitCode {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("combvm: couldn't read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new(&VMParameters::standard());
    vm.register_std_words();
    match vm.compile_string(&text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("combvm: {err}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        repl::repl_interpret();
        return ExitCode::SUCCESS;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            println!("{}", usage());
            ExitCode::SUCCESS
        }
        "-v" | "--version" => {
            println!("combvm {VERSION}");
            ExitCode::SUCCESS
        }
        path => run_script(path),
    }
}
