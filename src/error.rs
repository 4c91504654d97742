//! # Structured error surface
//!
//! The core itself never throws — every failure is a latched bit in
//! [`crate::flags::Flags`]. [`VmError`] is the reporting layer on top: a
//! structured value a caller can match on instead of polling raw flag bits.
//! Public entry points on [`crate::vm::Vm`] return `Result<(), VmError>`
//! built from whichever bits are latched after the call; native words and
//! the interpreter's inner step never see or construct a `VmError`
//! themselves.

use std::fmt;

use crate::flags::Flags;

/// A reported VM failure, derived from the flags latched during a call.
///
/// More than one bit can be latched at once — a handful of paths set two
/// flags before anyone polls them. `VmError::Multiple` reports that case
/// rather than silently keeping only one cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    ValueStackOverflow,
    ValueStackUnderflow,
    ReturnStackOverflow,
    ReturnStackUnderflow,
    FunctionTableOverflow,
    InstructionTapeOverflow,
    CharSegmentOverflow,
    StreamStackOverflow,
    StringStackOverflow,
    CompilerScratchOverflow,
    CompilerFunctionStackOverflow,
    CompileError,
    /// More than one exception bit was latched; report the whole set.
    Multiple(Flags),
}

impl VmError {
    /// Build the most specific `VmError` that describes `flags`.
    ///
    /// Prefer [`Flags::to_error`], which already checks for the empty case.
    pub fn from_flags(flags: &Flags) -> VmError {
        let latched = [
            (flags.vs_overflow, VmError::ValueStackOverflow),
            (flags.vs_underflow, VmError::ValueStackUnderflow),
            (flags.rs_overflow, VmError::ReturnStackOverflow),
            (flags.rs_underflow, VmError::ReturnStackUnderflow),
            (flags.fn_overflow, VmError::FunctionTableOverflow),
            (flags.ins_overflow, VmError::InstructionTapeOverflow),
            (flags.char_overflow, VmError::CharSegmentOverflow),
            (flags.stream_overflow, VmError::StreamStackOverflow),
            (flags.string_overflow, VmError::StringStackOverflow),
            (
                flags.compiler_ins_overflow,
                VmError::CompilerScratchOverflow,
            ),
            (
                flags.compiler_fn_overflow,
                VmError::CompilerFunctionStackOverflow,
            ),
            (flags.compile_error, VmError::CompileError),
        ];
        let mut set = latched.iter().filter(|(bit, _)| *bit);
        let first = set.next();
        if set.next().is_some() {
            return VmError::Multiple(*flags);
        }
        first
            .map(|(_, err)| *err)
            .unwrap_or(VmError::Multiple(*flags))
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::ValueStackOverflow => write!(f, "value stack overflow"),
            VmError::ValueStackUnderflow => write!(f, "value stack underflow"),
            VmError::ReturnStackOverflow => write!(f, "return stack overflow"),
            VmError::ReturnStackUnderflow => write!(f, "return stack underflow"),
            VmError::FunctionTableOverflow => write!(f, "function table overflow"),
            VmError::InstructionTapeOverflow => write!(f, "instruction tape overflow"),
            VmError::CharSegmentOverflow => write!(f, "character segment overflow"),
            VmError::StreamStackOverflow => write!(f, "stream stack overflow"),
            VmError::StringStackOverflow => write!(f, "string stack overflow"),
            VmError::CompilerScratchOverflow => write!(f, "compiler scratch tape overflow"),
            VmError::CompilerFunctionStackOverflow => {
                write!(f, "compiler function stack overflow")
            }
            VmError::CompileError => {
                write!(f, "compilation error: unresolved token or oversize literal/token")
            }
            VmError::Multiple(flags) => write!(f, "multiple VM exceptions latched: {:?}", flags),
        }
    }
}

impl std::error::Error for VmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bit_maps_to_specific_variant() {
        let mut flags = Flags::new();
        flags.vs_underflow = true;
        assert_eq!(VmError::from_flags(&flags), VmError::ValueStackUnderflow);
    }

    #[test]
    fn several_bits_map_to_multiple() {
        let mut flags = Flags::new();
        flags.vs_underflow = true;
        flags.rs_overflow = true;
        assert_eq!(VmError::from_flags(&flags), VmError::Multiple(flags));
    }
}
