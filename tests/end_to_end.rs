//! End-to-end seed scenarios: compile-and-run through the public `combvm`
//! API only, no access to crate-internal fields. Mirrors the six scenarios
//! exercised against a fresh VM with the standard word set registered.
//!
//! Printed output (`.`) isn't captured here — there's no stdout-capture
//! crate in this stack — so each scenario instead asserts on the
//! post-condition the print leaves behind: the value stack popped clean and
//! no exception latched.

use combvm::{Vm, VMParameters};

fn new_vm() -> Vm {
    let mut vm = Vm::new(&VMParameters::standard());
    vm.register_std_words();
    vm
}

#[test]
fn arithmetic_and_print_leaves_a_clean_machine() {
    let mut vm = new_vm();
    let result = vm.compile_string("2 3 + .");
    assert!(result.is_ok());
    assert!(vm.value_stack_is_empty());
    assert!(!vm.flags().any());
}

#[test]
fn defining_and_calling_a_word_registers_it_and_runs_clean() {
    let mut vm = new_vm();
    let result = vm.compile_string(": sq dup * ; 7 sq .");
    assert!(result.is_ok());
    assert!(vm.find_function("sq").is_some());
    assert!(vm.value_stack_is_empty());
    assert!(!vm.flags().any());
}

#[test]
fn unbounded_self_recursion_latches_return_stack_overflow_and_nothing_else() {
    let mut vm = new_vm();
    assert!(vm.compile_string(": inf inf ;").is_ok());
    let result = vm.compile_string("inf");
    assert!(result.is_err());
    assert!(vm.flags().rs_overflow);
    assert!(!vm.flags().vs_overflow);
    assert!(!vm.flags().fn_overflow);
}

#[test]
fn overflowing_the_value_stack_latches_and_stops_growth_at_capacity() {
    let params = VMParameters {
        max_values_count: 8,
        ..VMParameters::standard()
    };
    let mut vm = Vm::new(&params);
    vm.register_std_words();
    let mut text = String::new();
    for _ in 0..9 {
        text.push_str("1 ");
    }
    let result = vm.compile_string(&text);
    assert!(result.is_err());
    assert!(vm.flags().vs_overflow);
    assert_eq!(vm.value_stack_len(), 8);
}

#[test]
fn find_function_tracks_absence_then_most_recent_redefinition() {
    let mut vm = new_vm();
    assert!(vm.find_function("foo").is_none());
    assert!(vm.compile_string(": foo 1 ;").is_ok());
    let first = vm.find_function("foo");
    assert!(first.is_some());
    assert!(vm.compile_string(": foo 2 ;").is_ok());
    let second = vm.find_function("foo");
    assert!(second.is_some());
    assert_ne!(first, second);
}

#[test]
fn compiling_a_source_text_twice_grows_the_code_segment_by_the_same_amount() {
    let mut a = new_vm();
    let mut b = new_vm();
    let before_a = a.code_len();
    let before_b = b.code_len();
    assert!(a.compile_string("1 2 +").is_ok());
    assert!(b.compile_string("1 2 +").is_ok());
    assert_eq!(a.code_len() - before_a, b.code_len() - before_b);
}
