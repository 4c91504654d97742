//! # Dictionary of callable words
//!
//! The dictionary is an append-only table of [`FunctionRecord`]s, each
//! either *interpreted* (a range into the code segment) or *native* (a bare
//! function pointer). Names live in a parallel NUL-terminated character
//! segment so records stay small and cheap to append.
//!
//! Redefinition never deletes or mutates a prior record: [`Dictionary::find`]
//! scans from the most recently added entry backward, so a new definition of
//! an existing name simply shadows the old one for future lookups while any
//! `CALL(fid)` already baked into the code tape keeps calling the exact
//! record it was compiled against.

use crate::arena::Arena;
use crate::flags::Flags;

/// Dictionary index: a thin newtype over the zero-based slot. Lookup returns
/// `Option<FuncId>` rather than a sentinel value for "not found".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(pub u32);

/// Calling convention for native words: a bare function pointer over the VM.
/// No boxed closures, since no native word needs to capture anything beyond
/// the VM itself.
pub type NativeFn = fn(&mut crate::vm::Vm);

/// Where a function's code lives.
#[derive(Clone, Copy)]
pub enum FunctionKind {
    /// A contiguous, stable range in the code segment: `code[offset..offset+count]`.
    Interpreted { code_offset: u32, code_count: u32 },
    /// A native callback invoked synchronously by the interpreter.
    Native(NativeFn),
}

/// One dictionary entry.
pub struct FunctionRecord {
    pub kind: FunctionKind,
    /// Runs during compilation instead of being compiled as a `CALL`.
    pub is_immediate: bool,
    /// Offset of this function's NUL-terminated name in the character segment.
    pub name_offset: u32,
    /// Declared input arity. Informational only — the interpreter does not
    /// enforce it.
    pub in_vs: u32,
    /// Declared output arity. Informational only.
    pub out_vs: u32,
}

/// Function table plus the character segment backing function names.
pub struct Dictionary {
    functions: Arena<FunctionRecord>,
    chars: Arena<u8>,
}

impl Dictionary {
    pub fn new(max_functions: usize, max_chars: usize) -> Self {
        Dictionary {
            functions: Arena::new(max_functions),
            chars: Arena::new(max_chars),
        }
    }

    /// Linear search from the most recently added record backward.
    ///
    /// Returns the freshest matching entry, or `None` if `name` has never
    /// been defined.
    pub fn find(&self, name: &str) -> Option<FuncId> {
        for idx in (0..self.functions.len()).rev() {
            if self.name_of(FuncId(idx as u32)) == Some(name) {
                return Some(FuncId(idx as u32));
            }
        }
        None
    }

    /// Allocate a new interpreted-function record with an empty code range,
    /// ready for the compiler to finalize on definition commit.
    pub fn allocate_interpreted(
        &mut self,
        name: &str,
        code_segment_len: u32,
        flags: &mut Flags,
    ) -> Option<FuncId> {
        let name_offset = self.intern_name(name, flags)?;
        let mut overflow = false;
        let idx = self.functions.push(
            FunctionRecord {
                kind: FunctionKind::Interpreted {
                    code_offset: code_segment_len,
                    code_count: 0,
                },
                is_immediate: false,
                name_offset,
                in_vs: 0,
                out_vs: 0,
            },
            &mut overflow,
        );
        if overflow {
            flags.fn_overflow = true;
            return None;
        }
        idx.map(|i| FuncId(i as u32))
    }

    /// Finalize an interpreted record after its scratch tape has been
    /// appended to the main code segment.
    pub fn finalize_interpreted(&mut self, fid: FuncId, code_offset: u32, code_count: u32) {
        if let Some(record) = self.functions.get_mut(fid.0 as usize) {
            record.kind = FunctionKind::Interpreted {
                code_offset,
                code_count,
            };
        }
    }

    /// Append a native-function record.
    pub fn add_native(
        &mut self,
        name: &str,
        is_immediate: bool,
        native: NativeFn,
        in_vs: u32,
        out_vs: u32,
        flags: &mut Flags,
    ) -> Option<FuncId> {
        let name_offset = self.intern_name(name, flags)?;
        let mut overflow = false;
        let idx = self.functions.push(
            FunctionRecord {
                kind: FunctionKind::Native(native),
                is_immediate,
                name_offset,
                in_vs,
                out_vs,
            },
            &mut overflow,
        );
        if overflow {
            flags.fn_overflow = true;
            return None;
        }
        idx.map(|i| FuncId(i as u32))
    }

    pub fn get(&self, fid: FuncId) -> Option<&FunctionRecord> {
        self.functions.get(fid.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Read the NUL-terminated name stored for `fid` back out as `&str`.
    ///
    /// Returns `None` if the stored bytes are not valid UTF-8, which never
    /// happens for names this dictionary interned itself.
    pub fn name_of(&self, fid: FuncId) -> Option<&str> {
        let record = self.functions.get(fid.0 as usize)?;
        let start = record.name_offset as usize;
        let bytes = self.chars.as_slice();
        let end = bytes[start..].iter().position(|&b| b == 0)? + start;
        std::str::from_utf8(&bytes[start..end]).ok()
    }

    /// Snapshot the current (function count, char count) for transactional
    /// compilation.
    pub fn snapshot(&self) -> (usize, usize) {
        (self.functions.len(), self.chars.len())
    }

    /// Roll back to a prior `snapshot()`.
    pub fn restore(&mut self, snapshot: (usize, usize)) {
        self.functions.truncate(snapshot.0);
        self.chars.truncate(snapshot.1);
    }

    fn intern_name(&mut self, name: &str, flags: &mut Flags) -> Option<u32> {
        let mut overflow = false;
        let (start, written) = self
            .chars
            .extend_from_slice(name.as_bytes(), &mut overflow);
        if overflow || written != name.as_bytes().len() {
            flags.char_overflow = true;
            return None;
        }
        self.chars.push(0, &mut overflow);
        if overflow {
            flags.char_overflow = true;
            return None;
        }
        Some(start as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_none_for_unknown_name() {
        let dict = Dictionary::new(8, 256);
        assert_eq!(dict.find("undefined"), None);
    }

    #[test]
    fn redefinition_shadows_by_reverse_scan() {
        let mut dict = Dictionary::new(8, 256);
        let mut flags = Flags::new();
        let first = dict.allocate_interpreted("foo", 0, &mut flags).unwrap();
        assert_eq!(dict.find("foo"), Some(first));
        let second = dict.allocate_interpreted("foo", 0, &mut flags).unwrap();
        assert_ne!(first, second);
        assert_eq!(dict.find("foo"), Some(second));
        // The old record is still reachable by id; redefinition never invalidates it.
        assert!(dict.get(first).is_some());
    }

    #[test]
    fn function_table_overflow_latches_and_is_a_no_op() {
        let mut dict = Dictionary::new(1, 256);
        let mut flags = Flags::new();
        let first = dict.allocate_interpreted("a", 0, &mut flags);
        assert!(first.is_some());
        assert!(!flags.fn_overflow);
        let second = dict.allocate_interpreted("b", 0, &mut flags);
        assert!(second.is_none());
        assert!(flags.fn_overflow);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn char_segment_overflow_latches() {
        let mut dict = Dictionary::new(8, 4);
        let mut flags = Flags::new();
        let ok = dict.allocate_interpreted("ab", 0, &mut flags);
        assert!(ok.is_some());
        let fail = dict.allocate_interpreted("toolong", 0, &mut flags);
        assert!(fail.is_none());
        assert!(flags.char_overflow);
    }
}
