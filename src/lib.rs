//! A stack-oriented, bytecode-driven virtual machine: tokenizer, compiler
//! and dictionary feeding a tight interpreter loop over fixed-capacity
//! arenas. Every segment is sized up front at [`vm::Vm::new`] and never
//! grows; exhausting one latches a bit in [`flags::Flags`] rather than
//! panicking, surfaced to callers as a [`error::VmError`] at the public
//! API boundary.
//!
//! The core (this crate) never invents behavior for `:`/`;` or arithmetic
//! itself beyond the primitives [`compiler::begin_definition`] and
//! [`compiler::end_definition`]; [`stdwords`] is the standard registry that
//! makes the crate runnable end to end, built the same way any other
//! embedder would build their own.

pub mod arena;
pub mod compiler;
pub mod dictionary;
pub mod error;
pub mod flags;
pub mod interpreter;
pub mod opcode;
pub mod repl;
pub mod stdwords;
pub mod stream;
pub mod stringstack;
pub mod tokenizer;
pub mod vm;

pub use error::VmError;
pub use vm::{TxSnapshot, Vm, VMParameters};
