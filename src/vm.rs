//! # VM construction and top-level entry points
//!
//! [`Vm`] wires every module together: the dictionary, the code segment and
//! value/return stacks, the stream and string stacks, and the compiler.
//! Construction takes a [`VMParameters`] record enumerating every segment's
//! fixed capacity; there is no default and no resizing afterward.

use std::io::{self, Read};

use crate::arena::{Arena, BoundedStack};
use crate::compiler::Compiler;
use crate::dictionary::Dictionary;
use crate::error::VmError;
use crate::flags::Flags;
use crate::interpreter::{self, ReturnFrame};
use crate::stdwords;
use crate::stream::StreamStack;
use crate::stringstack::StringStack;
use crate::{compiler, opcode};

/// Fixed capacities for every arena and stack a [`Vm`] owns. All fields are
/// required; there is no sensible default for any of them.
#[derive(Clone, Copy, Debug)]
pub struct VMParameters {
    pub max_function_count: usize,
    pub max_instruction_count: usize,
    pub max_char_segment_size: usize,
    pub max_values_count: usize,
    pub max_return_count: usize,
    pub max_file_count: usize,
    pub max_ss_char_count: usize,
    pub max_ss_string_count: usize,
    pub max_cf_count: usize,
    pub max_cis_count: usize,
}

impl VMParameters {
    /// Capacities generous enough for interactive use and small scripts.
    pub fn standard() -> Self {
        VMParameters {
            max_function_count: 1024,
            max_instruction_count: 65536,
            max_char_segment_size: 65536,
            max_values_count: 4096,
            max_return_count: 1024,
            max_file_count: 32,
            max_ss_char_count: 8192,
            max_ss_string_count: 256,
            max_cf_count: 64,
            max_cis_count: 16384,
        }
    }
}

pub struct Vm {
    pub(crate) dictionary: Dictionary,
    pub(crate) code: Arena<u32>,
    pub(crate) value_stack: BoundedStack<u32>,
    pub(crate) return_stack: BoundedStack<ReturnFrame>,
    pub(crate) streams: StreamStack,
    pub(crate) strings: StringStack,
    pub(crate) compiler: Compiler,
    pub(crate) flags: Flags,
    pub(crate) fp: u32,
    pub(crate) ip: u32,
    pub(crate) quit: bool,
}

/// A `(codeCount, funcCount, charCount)` triple identifying a point to roll
/// back to, for hosts that want transactional compilation.
pub type TxSnapshot = (usize, usize, usize);

impl Vm {
    /// Construct a fresh VM with every segment sized from `params`. No
    /// standard words are registered yet — call [`Vm::register_std_words`]
    /// (or build your own registry against the same `add_native_function`
    /// seam) before compiling anything meaningful.
    pub fn new(params: &VMParameters) -> Self {
        Vm {
            dictionary: Dictionary::new(params.max_function_count, params.max_char_segment_size),
            code: Arena::new(params.max_instruction_count),
            value_stack: BoundedStack::new(params.max_values_count),
            return_stack: BoundedStack::new(params.max_return_count),
            streams: StreamStack::new(params.max_file_count),
            strings: StringStack::new(params.max_ss_char_count, params.max_ss_string_count),
            compiler: Compiler::new(params.max_cis_count, params.max_cf_count),
            flags: Flags::new(),
            fp: 0,
            ip: 0,
            quit: false,
        }
    }

    /// Install the standard word set (arithmetic, comparison, stack
    /// shuffling, `:`/`;`, `.`) — the "external collaborator" spec.md §1
    /// carves out of the core proper, provided here so the crate is runnable
    /// end to end.
    pub fn register_std_words(&mut self) {
        stdwords::register(self);
    }

    /// Compile and run `text` against the current dictionary and code
    /// segment. Equivalent to pushing a memory stream over `text` and
    /// driving [`Vm::step_once`] to end-of-stream.
    pub fn compile_string(&mut self, text: &str) -> Result<(), VmError> {
        compiler::compile_string(self, text);
        self.result()
    }

    /// Resolve exactly one token from whatever is currently on top of the
    /// stream stack. Returns `false` once there is nothing left to read.
    pub fn step_once(&mut self) -> bool {
        compiler::step_once(self)
    }

    /// Execute exactly one opcode-level step against the current `(fp, ip)`.
    /// Meaningful only while a function is actually running — most callers
    /// want [`Vm::compile_string`] or [`Vm::step_once`] instead, which drive
    /// this internally.
    pub fn vm_next(&mut self) -> Result<(), VmError> {
        interpreter::step(self);
        self.result()
    }

    /// Read all of standard input as one source text and compile it,
    /// mirroring the core's `vmReadEvalPrintLoop`: one memory stream over
    /// stdin, driven to end-of-stream or until an exception latches.
    pub fn read_eval_print_loop(&mut self) -> Result<(), VmError> {
        let mut input = String::new();
        let _ = io::stdin().read_to_string(&mut input);
        self.compile_string(&input)
    }

    /// Current latched exception, if any.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Clear every latched exception bit (not `bf`), letting subsequent
    /// calls proceed again. Also resets the compiler sub-machine: a latched
    /// error can leave a definition open mid-body (e.g. an oversize literal
    /// partway through `: broken 99999999999`), and without this the next
    /// token compiled would silently land in that abandoned definition's
    /// scratch tape instead of running.
    pub fn clear_flags(&mut self) {
        self.flags.clear();
        self.compiler.reset();
    }

    pub fn find_function(&self, name: &str) -> Option<crate::dictionary::FuncId> {
        self.dictionary.find(name)
    }

    /// Current number of cells on the value stack.
    pub fn value_stack_len(&self) -> usize {
        self.value_stack.len()
    }

    /// `true` if the value stack holds nothing.
    pub fn value_stack_is_empty(&self) -> bool {
        self.value_stack.is_empty()
    }

    /// Current size of the code segment, in opcodes.
    pub fn code_len(&self) -> usize {
        self.code.len()
    }

    /// Snapshot `(codeCount, funcCount, charCount)` for a later
    /// [`Vm::abort_tx`], enabling transactional compilation on top of the
    /// core's append-only segments.
    pub fn begin_tx(&self) -> TxSnapshot {
        let (func_count, char_count) = self.dictionary.snapshot();
        (self.code.len(), func_count, char_count)
    }

    /// Accept everything appended since `snapshot`. A no-op: the default
    /// behavior of every append-only segment already is to keep what was
    /// written: this exists only to make the transaction boundary explicit
    /// at call sites.
    pub fn commit(&self, _snapshot: TxSnapshot) {}

    /// Discard everything appended since `snapshot`, clear latched flags, and
    /// reset the compiler sub-machine — any definition left open by the
    /// aborted attempt must not keep swallowing subsequent tokens.
    pub fn abort_tx(&mut self, snapshot: TxSnapshot) {
        let (code_count, func_count, char_count) = snapshot;
        self.code.truncate(code_count);
        self.dictionary.restore((func_count, char_count));
        self.flags.clear();
        self.compiler.reset();
    }

    fn result(&self) -> Result<(), VmError> {
        match self.flags.to_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
