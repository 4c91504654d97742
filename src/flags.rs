//! # Latched exception flags
//!
//! Failures in this core never unwind. Every exceptional condition — stack
//! overflow, stack underflow, dictionary/tape/char-segment exhaustion, a
//! stray token during compilation — sets a bit in [`Flags`] and is polled,
//! not thrown. Once any bit is set, every public VM operation is a no-op
//! until the host explicitly clears it: "latched" means sticky across calls
//! within one top-level operation, not self-resetting.
//!
//! `bf` is a separate single boolean used by conditional native words (e.g.
//! `if`); it is not part of the latched exception set and is never touched
//! by [`Flags::any`].

/// One bit per exceptional condition the core can latch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    /// Value stack overflow.
    pub vs_overflow: bool,
    /// Value stack underflow.
    pub vs_underflow: bool,
    /// Return stack overflow.
    pub rs_overflow: bool,
    /// Return stack underflow.
    pub rs_underflow: bool,
    /// Function table overflow.
    pub fn_overflow: bool,
    /// Instruction-tape (code segment) overflow.
    pub ins_overflow: bool,
    /// Character-segment overflow.
    pub char_overflow: bool,
    /// Stream-stack overflow.
    pub stream_overflow: bool,
    /// String-stack (token buffer) overflow.
    pub string_overflow: bool,
    /// Compiler scratch-tape overflow.
    pub compiler_ins_overflow: bool,
    /// Compiler function-stack overflow.
    pub compiler_fn_overflow: bool,
    /// Unresolved token, oversize literal, or other compile-time error.
    /// Kept distinct from `ins_overflow` since a compile error is a
    /// semantic rejection, not a resource exhaustion.
    pub compile_error: bool,
    /// Boolean flag used by conditional native words; not part of the
    /// latched exception set.
    pub bf: bool,
}

impl Flags {
    /// A fresh, unlatched flag set.
    pub fn new() -> Self {
        Flags::default()
    }

    /// `true` if any exception bit is latched (excludes `bf`).
    pub fn any(&self) -> bool {
        self.vs_overflow
            || self.vs_underflow
            || self.rs_overflow
            || self.rs_underflow
            || self.fn_overflow
            || self.ins_overflow
            || self.char_overflow
            || self.stream_overflow
            || self.string_overflow
            || self.compiler_ins_overflow
            || self.compiler_fn_overflow
            || self.compile_error
    }

    /// Clear every latched exception bit. Leaves `bf` untouched — it is not
    /// an exception, it is ordinary conditional-word state.
    pub fn clear(&mut self) {
        let bf = self.bf;
        *self = Flags::default();
        self.bf = bf;
    }

    /// Render the latched bits as a human-readable error, or `None` if clean.
    pub fn to_error(&self) -> Option<crate::error::VmError> {
        if !self.any() {
            return None;
        }
        Some(crate::error::VmError::from_flags(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flags_have_nothing_latched() {
        let flags = Flags::new();
        assert!(!flags.any());
        assert!(flags.to_error().is_none());
    }

    #[test]
    fn clear_resets_exceptions_but_preserves_bf() {
        let mut flags = Flags::new();
        flags.vs_overflow = true;
        flags.bf = true;
        flags.clear();
        assert!(!flags.any());
        assert!(flags.bf);
    }
}
