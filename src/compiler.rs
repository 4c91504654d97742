//! # Compiler
//!
//! A two-state machine sitting on top of the tokenizer: **interpret mode**
//! runs each resolved token immediately, **compile mode** stages opcodes into
//! a scratch tape for later commit. The two standard-word primitives that
//! flip between the states — `begin_definition` / `end_definition` — live
//! here; a registry builds `:` and `;` on top of them.
//!
//! The scratch tape is a single buffer shared by all nested definitions; the
//! compiler function stack remembers where in it each open definition
//! started, so `end_definition` only ever commits the suffix belonging to the
//! innermost open definition.

use crate::arena::Arena;
use crate::dictionary::FuncId;
use crate::interpreter;
use crate::opcode::{Opcode, MAX_LITERAL};
use crate::stream::Stream;
use crate::tokenizer;
use crate::vm::Vm;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilerMode {
    Interpret,
    Compile,
}

/// Stack of `(functionId, scratchStart)` pairs, one per open definition.
struct CompilerFunctionStack {
    frames: Vec<(FuncId, u32)>,
    cap: usize,
}

impl CompilerFunctionStack {
    fn new(cap: usize) -> Self {
        CompilerFunctionStack {
            frames: Vec::new(),
            cap,
        }
    }

    fn push(&mut self, frame: (FuncId, u32), overflow: &mut bool) {
        if self.frames.len() >= self.cap {
            *overflow = true;
            return;
        }
        self.frames.push(frame);
    }

    fn pop(&mut self) -> Option<(FuncId, u32)> {
        self.frames.pop()
    }

    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn clear(&mut self) {
        self.frames.clear();
    }
}

pub struct Compiler {
    pub mode: CompilerMode,
    scratch: Arena<u32>,
    cfs: CompilerFunctionStack,
}

impl Compiler {
    pub fn new(max_scratch: usize, max_compiler_functions: usize) -> Self {
        Compiler {
            mode: CompilerMode::Interpret,
            scratch: Arena::new(max_scratch),
            cfs: CompilerFunctionStack::new(max_compiler_functions),
        }
    }

    /// Drop back to interpret mode and discard every open definition's
    /// staged opcodes. Called whenever latched flags are cleared or a
    /// transaction is aborted, since a definition left open mid-error would
    /// otherwise silently swallow every subsequent token into its abandoned
    /// scratch tape instead of running them.
    pub fn reset(&mut self) {
        self.mode = CompilerMode::Interpret;
        self.cfs.clear();
        self.scratch.truncate(0);
    }
}

/// Open a new definition named `name`, allocating its dictionary record and
/// switching to compile mode. The standard `:` word reads `name` off the
/// stream before calling this.
pub fn begin_definition(vm: &mut Vm, name: &str) {
    if vm.flags.any() {
        return;
    }
    let scratch_start = vm.compiler.scratch.len() as u32;
    let code_len = vm.code.len() as u32;
    let fid = match vm.dictionary.allocate_interpreted(name, code_len, &mut vm.flags) {
        Some(fid) => fid,
        None => return,
    };
    let mut overflow = false;
    vm.compiler.cfs.push((fid, scratch_start), &mut overflow);
    if overflow {
        vm.flags.compiler_fn_overflow = true;
        return;
    }
    vm.compiler.mode = CompilerMode::Compile;
}

/// Commit the innermost open definition: append its staged opcodes to the
/// main code segment, finalize its dictionary record, and drop back to
/// interpret mode once no definition remains open.
pub fn end_definition(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let Some((fid, scratch_start)) = vm.compiler.cfs.pop() else {
        vm.flags.compile_error = true;
        return;
    };
    let start = scratch_start as usize;
    let body: Vec<u32> = vm.compiler.scratch.as_slice()[start..].to_vec();
    let mut overflow = false;
    let (code_offset, written) = vm.code.extend_from_slice(&body, &mut overflow);
    if overflow {
        vm.flags.ins_overflow = true;
        return;
    }
    vm.dictionary
        .finalize_interpreted(fid, code_offset as u32, written as u32);
    vm.compiler.scratch.truncate(start);
    if vm.compiler.cfs.is_empty() {
        vm.compiler.mode = CompilerMode::Interpret;
    }
}

/// Decimal unsigned literal, rejecting anything that would collide with the
/// opcode-kind high bit.
fn parse_literal(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token
        .parse::<u64>()
        .ok()
        .filter(|&v| v <= MAX_LITERAL as u64)
        .map(|v| v as u32)
}

fn resolve_literal(vm: &mut Vm, v: u32) {
    match vm.compiler.mode {
        CompilerMode::Interpret => {
            let mut overflow = false;
            vm.value_stack.push(v, &mut overflow);
            if overflow {
                vm.flags.vs_overflow = true;
            }
        }
        CompilerMode::Compile => {
            let mut overflow = false;
            vm.compiler
                .scratch
                .push(Opcode::Value(v).encode(), &mut overflow);
            if overflow {
                vm.flags.compiler_ins_overflow = true;
            }
        }
    }
}

fn resolve_word(vm: &mut Vm, fid: FuncId) {
    match vm.compiler.mode {
        CompilerMode::Interpret => interpreter::call_and_run(vm, fid),
        CompilerMode::Compile => {
            let is_immediate = vm.dictionary.get(fid).map_or(false, |r| r.is_immediate);
            if is_immediate {
                interpreter::call_and_run(vm, fid);
            } else {
                let mut overflow = false;
                vm.compiler
                    .scratch
                    .push(Opcode::Call(fid.0).encode(), &mut overflow);
                if overflow {
                    vm.flags.compiler_ins_overflow = true;
                }
            }
        }
    }
}

fn compile_token(vm: &mut Vm, token: &str) {
    if vm.flags.any() {
        return;
    }
    match vm.dictionary.find(token) {
        Some(fid) => resolve_word(vm, fid),
        None => match parse_literal(token) {
            Some(v) => resolve_literal(vm, v),
            None => vm.flags.compile_error = true,
        },
    }
}

/// Pull and resolve exactly one token from whatever stream is currently on
/// top of the stream stack. Returns `false` if the stream stack has nothing
/// left to read (or is already empty) — the unit the REPL drives one step at
/// a time.
pub fn step_once(vm: &mut Vm) -> bool {
    if vm.flags.any() || vm.quit {
        return false;
    }
    if !tokenizer::next_token(&mut vm.streams, &mut vm.strings, &mut vm.flags) {
        return false;
    }
    let token = vm.strings.top().unwrap_or("").to_string();
    vm.strings.pop();
    compile_token(vm, &token);
    true
}

/// Wrap `text` in a memory stream, push it, and drive [`step_once`] until it
/// runs dry or an exception latches. Any stream left on the stack by an
/// aborted pass (the pushed text stream, or include-streams pushed by words
/// it ran) is released before returning.
pub fn compile_string(vm: &mut Vm, text: &str) {
    let base_depth = vm.streams.len();
    vm.streams.push(Stream::from_text(text), &mut vm.flags);
    if vm.flags.any() {
        return;
    }
    while step_once(vm) {}
    while vm.streams.len() > base_depth {
        vm.streams.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal_literals() {
        assert_eq!(parse_literal("0"), Some(0));
        assert_eq!(parse_literal("42"), Some(42));
        assert_eq!(parse_literal(&MAX_LITERAL.to_string()), Some(MAX_LITERAL));
    }

    #[test]
    fn rejects_oversize_and_non_numeric_literals() {
        assert_eq!(parse_literal(""), None);
        assert_eq!(parse_literal("dup"), None);
        assert_eq!(parse_literal("-1"), None);
        assert_eq!(parse_literal(&(MAX_LITERAL as u64 + 1).to_string()), None);
    }

    #[test]
    fn compiler_function_stack_overflow_latches() {
        let mut cfs = CompilerFunctionStack::new(1);
        let mut overflow = false;
        cfs.push((FuncId(0), 0), &mut overflow);
        assert!(!overflow);
        cfs.push((FuncId(1), 0), &mut overflow);
        assert!(overflow);
        assert_eq!(cfs.frames.len(), 1);
    }

    #[test]
    fn reset_drops_an_open_definition_and_its_staged_opcodes() {
        let mut compiler = Compiler::new(64, 8);
        let mut overflow = false;
        compiler
            .cfs
            .push((FuncId(0), compiler.scratch.len() as u32), &mut overflow);
        compiler.mode = CompilerMode::Compile;
        compiler
            .scratch
            .push(Opcode::Value(1).encode(), &mut overflow);
        assert!(!overflow);

        compiler.reset();

        assert_eq!(compiler.mode, CompilerMode::Interpret);
        assert!(compiler.cfs.is_empty());
        assert_eq!(compiler.scratch.len(), 0);
    }
}
