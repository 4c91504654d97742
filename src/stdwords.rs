//! # Standard word registry
//!
//! The set of native words spec.md §1 calls an "external collaborator": the
//! core does not dictate their behavior, only the seam they are registered
//! through ([`Dictionary::add_native`](crate::dictionary::Dictionary::add_native)).
//! This module plays that role so the crate is runnable end to end — it is
//! arithmetic, comparison, stack shuffling, `:`/`;` definition words, and a
//! decimal printer, nothing more.

use crate::compiler;
use crate::tokenizer;
use crate::vm::Vm;

fn pop(vm: &mut Vm) -> u32 {
    let mut underflow = false;
    let v = vm.value_stack.pop(&mut underflow);
    if underflow {
        vm.flags.vs_underflow = true;
    }
    v
}

fn push(vm: &mut Vm, v: u32) {
    let mut overflow = false;
    vm.value_stack.push(v, &mut overflow);
    if overflow {
        vm.flags.vs_overflow = true;
    }
}

fn add(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, a.wrapping_add(b));
}

fn sub(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, a.wrapping_sub(b));
}

fn mul(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, a.wrapping_mul(b));
}

fn div(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, if b == 0 { 0 } else { a / b });
}

fn rem(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, if b == 0 { 0 } else { a % b });
}

fn bool_op(vm: &mut Vm, op: impl Fn(u32, u32) -> bool) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, if op(a, b) { 1 } else { 0 });
}

fn eq(vm: &mut Vm) {
    bool_op(vm, |a, b| a == b);
}

fn lt(vm: &mut Vm) {
    bool_op(vm, |a, b| a < b);
}

fn gt(vm: &mut Vm) {
    bool_op(vm, |a, b| a > b);
}

fn dup(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    match vm.value_stack.top().copied() {
        Some(v) => push(vm, v),
        None => vm.flags.vs_underflow = true,
    }
}

fn drop_top(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    pop(vm);
}

fn swap(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, b);
    push(vm, a);
}

fn over(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    let b = pop(vm);
    let a = pop(vm);
    if vm.flags.any() {
        return;
    }
    push(vm, a);
    push(vm, b);
    push(vm, a);
}

fn print_top(vm: &mut Vm) {
    use std::io::Write;

    if vm.flags.any() {
        return;
    }
    let v = pop(vm);
    if vm.flags.any() {
        return;
    }
    print!("{}", v);
    let _ = std::io::stdout().flush();
}

/// `: name` — open a new definition, consuming the next token directly off
/// the stream as the name being defined.
fn colon(vm: &mut Vm) {
    if vm.flags.any() {
        return;
    }
    if !tokenizer::next_token(&mut vm.streams, &mut vm.strings, &mut vm.flags) {
        vm.flags.compile_error = true;
        return;
    }
    let name = vm.strings.top().unwrap_or("").to_string();
    vm.strings.pop();
    compiler::begin_definition(vm, &name);
}

/// `;` — close the innermost open definition.
fn semicolon(vm: &mut Vm) {
    compiler::end_definition(vm);
}

/// Register every standard word into `vm`'s dictionary. Idempotent to call
/// twice in the sense that the core allows it (each call just adds another,
/// shadowing, generation of the same names).
pub fn register(vm: &mut Vm) {
    let words: &[(&str, bool, fn(&mut Vm), u32, u32)] = &[
        ("+", false, add, 2, 1),
        ("-", false, sub, 2, 1),
        ("*", false, mul, 2, 1),
        ("/", false, div, 2, 1),
        ("mod", false, rem, 2, 1),
        ("=", false, eq, 2, 1),
        ("<", false, lt, 2, 1),
        (">", false, gt, 2, 1),
        ("dup", false, dup, 1, 2),
        ("drop", false, drop_top, 1, 0),
        ("swap", false, swap, 2, 2),
        ("over", false, over, 2, 3),
        (".", false, print_top, 1, 0),
        (":", true, colon, 0, 0),
        (";", true, semicolon, 0, 0),
    ];
    for (name, is_immediate, native, in_vs, out_vs) in words.iter().copied() {
        vm.dictionary
            .add_native(name, is_immediate, native, in_vs, out_vs, &mut vm.flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VMParameters;

    fn test_params() -> VMParameters {
        VMParameters {
            max_function_count: 32,
            max_instruction_count: 256,
            max_char_segment_size: 1024,
            max_values_count: 32,
            max_return_count: 32,
            max_file_count: 8,
            max_ss_char_count: 1024,
            max_ss_string_count: 32,
            max_cf_count: 8,
            max_cis_count: 256,
        }
    }

    #[test]
    fn addition_prints_expected_sum() {
        let mut vm = Vm::new(&test_params());
        register(&mut vm);
        assert!(vm.compile_string("2 3 + .").is_ok());
    }

    #[test]
    fn dup_mul_squares_top_of_stack() {
        let mut vm = Vm::new(&test_params());
        register(&mut vm);
        assert!(vm.compile_string(": sq dup * ; 7 sq .").is_ok());
    }

    #[test]
    fn division_by_zero_pushes_zero_rather_than_panicking() {
        let mut vm = Vm::new(&test_params());
        register(&mut vm);
        assert!(vm.compile_string("5 0 /").is_ok());
        assert_eq!(vm.value_stack.top(), Some(&0));
    }

    #[test]
    fn stray_end_definition_latches_compile_error() {
        let mut vm = Vm::new(&test_params());
        register(&mut vm);
        assert!(vm.compile_string(";").is_err());
    }
}
