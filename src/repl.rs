//! # Interactive REPL
//!
//! Reads one line at a time and feeds it straight to [`Vm::compile_string`]
//! against a single long-lived VM. Unlike
//! [`crate::vm::Vm::read_eval_print_loop`] (which reads all of stdin as one
//! source text, for non-interactive piping), this loop compiles one line at
//! a time so a prompt can be shown between lines and a mid-line exception
//! only rejects that line rather than the whole session.
//!
//! ## Design
//! - Prompts with `> ` for each line.
//! - Supports graceful exit with `exit` or `quit`, or EOF (Ctrl+D).
//! - A latched exception is printed and cleared so the session can go on;
//!   whatever the failing line appended to the dictionary or code segment
//!   before latching stays in place, same as any other mid-definition abort.

use std::io::{self, BufRead, Write};

use crate::vm::{Vm, VMParameters};

/// Run an interactive REPL against a freshly constructed [`Vm`] with the
/// standard word set registered.
///
/// The loop:
/// 1. Prints a prompt.
/// 2. Reads one line of input.
/// 3. Compiles and runs it against the running VM.
/// 4. Prints the resulting error, if any, and clears latched flags so the
///    next line isn't rejected by a no-op guard left over from this one.
pub fn repl_interpret() {
    println!("combvm - interactive session");
    println!("Type `exit` or `quit` to leave.");

    let params = VMParameters::standard();
    let mut vm = Vm::new(&params);
    vm.register_std_words();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) | None => {
                println!();
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        if let Err(err) = vm.compile_string(&line) {
            println!("{}", err);
            vm.clear_flags();
        }
    }
}
