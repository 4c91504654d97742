//! # Interpreter
//!
//! `step` performs exactly one instruction: fetch, decode, dispatch. The
//! program counter is the pair `(fp, ip)` — the function currently executing
//! and the next instruction offset within it. Falling off the end of a
//! function's code range is the implicit return: there is no explicit RET
//! opcode, since a function's `codeCount` already bounds its body exactly.
//!
//! [`call_and_run`] drives `step` in a loop until a synthetic call started
//! from outside any running function (the compiler resolving a token in
//! interpret mode, or an immediate word invoked from compile mode) has fully
//! returned. It is not used by the opcode-level `Call` dispatch inside `step`
//! itself, which only ever needs to take one step at a time.

use crate::dictionary::{FuncId, FunctionKind};
use crate::opcode::Opcode;
use crate::vm::Vm;

/// A saved `(fp, ip)` pair, pushed on call and restored on return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReturnFrame {
    pub fp: u32,
    pub ip: u32,
}

/// Coarse execution state, exposed for diagnostics. Not consulted by `step`
/// itself beyond the conditions that already drive it (`quit`, the flags).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Halted,
}

/// Classify the VM's current state from its externally observable fields.
pub fn state(vm: &Vm) -> State {
    if vm.flags.any() {
        State::Halted
    } else if vm.quit {
        State::Idle
    } else {
        State::Running
    }
}

/// Perform exactly one step. A no-op if any exception bit is already latched.
pub fn step(vm: &mut Vm) {
    if vm.flags.any() || vm.quit {
        return;
    }

    let range = vm
        .dictionary
        .get(FuncId(vm.fp))
        .and_then(|record| match record.kind {
            FunctionKind::Interpreted {
                code_offset,
                code_count,
            } => Some((code_offset, code_offset + code_count)),
            FunctionKind::Native(_) => None,
        });

    let (_, end) = match range {
        Some(r) => r,
        None => {
            vm.quit = true;
            return;
        }
    };

    if vm.ip >= end {
        if vm.return_stack.is_empty() {
            vm.quit = true;
        } else {
            let mut underflow = false;
            let frame = vm.return_stack.pop(&mut underflow);
            vm.fp = frame.fp;
            vm.ip = frame.ip;
        }
        return;
    }

    let word = vm.code.get(vm.ip as usize).copied().unwrap_or(0);
    vm.ip += 1;

    match Opcode::decode(word) {
        Opcode::Value(v) => {
            let mut overflow = false;
            vm.value_stack.push(v, &mut overflow);
            if overflow {
                vm.flags.vs_overflow = true;
            }
        }
        Opcode::Call(raw_fid) => dispatch_call(vm, FuncId(raw_fid)),
    }
}

fn dispatch_call(vm: &mut Vm, fid: FuncId) {
    let kind = vm.dictionary.get(fid).map(|r| r.kind);
    match kind {
        Some(FunctionKind::Native(native)) => native(vm),
        Some(FunctionKind::Interpreted { code_offset, .. }) => {
            let mut overflow = false;
            vm.return_stack.push(
                ReturnFrame {
                    fp: vm.fp,
                    ip: vm.ip,
                },
                &mut overflow,
            );
            if overflow {
                vm.flags.rs_overflow = true;
                return;
            }
            vm.fp = fid.0;
            vm.ip = code_offset;
        }
        None => vm.flags.compile_error = true,
    }
}

/// Run `fid` to completion from outside any currently executing function,
/// used by the compiler to resolve a token in interpret mode or to invoke an
/// immediate word from compile mode.
pub fn call_and_run(vm: &mut Vm, fid: FuncId) {
    if vm.flags.any() {
        return;
    }
    let kind = match vm.dictionary.get(fid) {
        Some(record) => record.kind,
        None => {
            vm.flags.compile_error = true;
            return;
        }
    };
    match kind {
        FunctionKind::Native(native) => native(vm),
        FunctionKind::Interpreted { code_offset, .. } => {
            let saved_fp = vm.fp;
            let saved_ip = vm.ip;
            let target_depth = vm.return_stack.len();
            let mut overflow = false;
            vm.return_stack.push(
                ReturnFrame {
                    fp: saved_fp,
                    ip: saved_ip,
                },
                &mut overflow,
            );
            if overflow {
                vm.flags.rs_overflow = true;
                return;
            }
            vm.fp = fid.0;
            vm.ip = code_offset;
            while vm.return_stack.len() > target_depth && !vm.flags.any() && !vm.quit {
                step(vm);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::vm::{Vm, VMParameters};

    fn test_params() -> VMParameters {
        VMParameters {
            max_function_count: 16,
            max_instruction_count: 64,
            max_char_segment_size: 256,
            max_values_count: 16,
            max_return_count: 16,
            max_file_count: 4,
            max_ss_char_count: 256,
            max_ss_string_count: 16,
            max_cf_count: 8,
            max_cis_count: 64,
        }
    }

    #[test]
    fn value_step_pushes_operand() {
        let mut vm = Vm::new(&test_params());
        let fid = vm
            .dictionary
            .allocate_interpreted("main", vm.code.len() as u32, &mut vm.flags)
            .unwrap();
        let mut overflow = false;
        let (offset, count) = vm
            .code
            .extend_from_slice(&[Opcode::Value(7).encode()], &mut overflow);
        vm.dictionary
            .finalize_interpreted(fid, offset as u32, count as u32);
        vm.fp = fid.0;
        vm.ip = offset as u32;
        step(&mut vm);
        assert_eq!(vm.value_stack.top(), Some(&7));
    }

    #[test]
    fn stepping_past_the_end_of_a_function_returns() {
        let mut vm = Vm::new(&test_params());
        let fid = vm
            .dictionary
            .allocate_interpreted("empty", vm.code.len() as u32, &mut vm.flags)
            .unwrap();
        vm.dictionary.finalize_interpreted(fid, 0, 0);
        vm.fp = fid.0;
        vm.ip = 0;
        step(&mut vm);
        assert!(vm.quit);
    }

    #[test]
    fn dictionary_smoke() {
        let dict = Dictionary::new(4, 64);
        assert!(dict.is_empty());
    }
}
