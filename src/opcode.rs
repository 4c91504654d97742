//! # Opcode encoding
//!
//! The code segment is a flat tape of 32-bit words. The high bit of each
//! word discriminates between the two kinds of opcode this core knows about:
//!
//! - `VALUE(v)` — high bit clear; the low 31 bits are an unsigned immediate
//!   to push onto the value stack.
//! - `CALL(fid)` — high bit set; the low 31 bits are a dictionary index of
//!   the function to invoke.
//!
//! There is no other opcode space at this layer. Arithmetic, I/O, and
//! control flow are all native words installed into the dictionary — see
//! [`crate::stdwords`]. A `VALUE`/`CALL` pair is the entire instruction set;
//! everything else is built out of dictionary entries.

/// High bit clear: the rest of the word is a value literal.
pub const OP_VALUE: u32 = 0x0000_0000;
/// High bit set: the rest of the word is a dictionary index to call.
pub const OP_CALL: u32 = 0x8000_0000;
/// Mask selecting the 31-bit operand.
pub const OPERAND_MASK: u32 = 0x7FFF_FFFF;

/// Largest value literal representable on the tape (`2^31 - 1`).
pub const MAX_LITERAL: u32 = OPERAND_MASK;

/// A single decoded instruction-tape word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Push `v` onto the value stack.
    Value(u32),
    /// Call the dictionary entry at index `fid`.
    Call(u32),
}

impl Opcode {
    /// Pack this opcode into its on-tape 32-bit representation.
    pub fn encode(self) -> u32 {
        match self {
            Opcode::Value(v) => OP_VALUE | (v & OPERAND_MASK),
            Opcode::Call(fid) => OP_CALL | (fid & OPERAND_MASK),
        }
    }

    /// Unpack a 32-bit tape word into its discriminated form.
    pub fn decode(word: u32) -> Opcode {
        let operand = get_operand(word);
        if get_operation(word) == OP_CALL {
            Opcode::Call(operand)
        } else {
            Opcode::Value(operand)
        }
    }
}

/// Extract the operation bit (`OP_VALUE` or `OP_CALL`) from a tape word.
pub fn get_operation(word: u32) -> u32 {
    word & OP_CALL
}

/// Extract the 31-bit operand from a tape word.
pub fn get_operand(word: u32) -> u32 {
    word & OPERAND_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_value_and_call() {
        for v in [0u32, 1, 42, MAX_LITERAL] {
            let word = Opcode::Value(v).encode();
            assert_eq!(Opcode::decode(word), Opcode::Value(v));
        }
        for fid in [0u32, 1, 42, MAX_LITERAL] {
            let word = Opcode::Call(fid).encode();
            assert_eq!(Opcode::decode(word), Opcode::Call(fid));
        }
    }

    #[test]
    fn operation_and_operand_are_a_clean_partition() {
        for word in [0u32, 1, 0x7FFF_FFFF, 0x8000_0000, 0x8000_0001, 0xFFFF_FFFF] {
            let op = get_operation(word);
            let operand = get_operand(word);
            assert!(op == OP_VALUE || op == OP_CALL);
            assert!(operand < 0x8000_0000);
            assert_eq!(word, op | operand);
        }
    }

    #[test]
    fn literal_overflow_truncates_to_31_bits_on_encode() {
        // encode() masks; rejecting oversize literals is the compiler's job.
        let word = Opcode::Value(0xFFFF_FFFF).encode();
        assert_eq!(Opcode::decode(word), Opcode::Value(MAX_LITERAL));
    }
}
