//! # Stream subsystem
//!
//! Streams are shared-ownership byte sources/sinks: file-backed or
//! memory-backed, readable and/or writable depending on [`StreamMode`]. The
//! VM holds strong references to streams through the stream stack; pushing
//! increments the reference count, popping decrements it, and the backing
//! resource closes when the count reaches zero.
//!
//! Only the reference count needs to be atomic — the rest of a stream's
//! state is touched from one thread at a time. `Arc` already gives an
//! atomic strong count for free, so a [`Stream`] is simply a cloneable
//! `Arc<Mutex<StreamInner>>` handle: cloning it *is* the stream-stack push's
//! refcount increment, and dropping the last clone *is* the close-on-zero
//! behavior, with no bespoke refcounting code needed.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::flags::Flags;

/// Access mode a stream was opened with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Read-only: writes are silently rejected.
    Ro,
    /// Write-only: reads always report end-of-stream.
    Wo,
    /// Read-write.
    Rw,
}

impl StreamMode {
    fn allows_read(self) -> bool {
        matches!(self, StreamMode::Ro | StreamMode::Rw)
    }

    fn allows_write(self) -> bool {
        matches!(self, StreamMode::Wo | StreamMode::Rw)
    }
}

enum Backing {
    File { file: File, pos: u64, len: u64 },
    Memory { buf: Vec<u8>, pos: usize, cap: usize },
}

struct StreamInner {
    mode: StreamMode,
    backing: Backing,
}

/// A shared-ownership input/output stream.
///
/// Cloning a `Stream` is the refcount increment; dropping the last clone
/// closes the backing resource.
#[derive(Clone)]
pub struct Stream(Arc<Mutex<StreamInner>>);

impl Stream {
    /// Open a file on disk in the given mode.
    pub fn open_file<P: AsRef<Path>>(path: P, mode: StreamMode) -> io::Result<Stream> {
        let mut opts = OpenOptions::new();
        match mode {
            StreamMode::Ro => {
                opts.read(true);
            }
            StreamMode::Wo => {
                opts.write(true).create(true).truncate(true);
            }
            StreamMode::Rw => {
                opts.read(true).write(true).create(true);
            }
        }
        let file = opts.open(path)?;
        Ok(Self::from_file(file, mode))
    }

    /// Wrap an already-open file handle.
    pub fn from_file(file: File, mode: StreamMode) -> Stream {
        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        Stream(Arc::new(Mutex::new(StreamInner {
            mode,
            backing: Backing::File { file, pos: 0, len },
        })))
    }

    /// A fresh, empty read-write memory stream bounded to `max_size` bytes.
    pub fn memory(max_size: usize) -> Stream {
        Stream(Arc::new(Mutex::new(StreamInner {
            mode: StreamMode::Rw,
            backing: Backing::Memory {
                buf: Vec::new(),
                pos: 0,
                cap: max_size,
            },
        })))
    }

    /// A read-only memory stream preloaded with `text`. Used internally by
    /// `compile_string` to hand the tokenizer an in-memory view of source
    /// text without a byte-at-a-time write loop.
    pub(crate) fn from_text(text: &str) -> Stream {
        let bytes = text.as_bytes().to_vec();
        let cap = bytes.len();
        Stream(Arc::new(Mutex::new(StreamInner {
            mode: StreamMode::Ro,
            backing: Backing::Memory {
                buf: bytes,
                pos: 0,
                cap,
            },
        })))
    }

    /// Read one byte. Returns `None` if the mode forbids reads or the
    /// stream has reached end-of-stream — a mode violation itself is not
    /// flagged, it just yields a sentinel read.
    pub fn read_char(&self) -> Option<u8> {
        let mut inner = self.0.lock().unwrap();
        if !inner.mode.allows_read() {
            return None;
        }
        match &mut inner.backing {
            Backing::Memory { buf, pos, .. } => {
                if *pos >= buf.len() {
                    return None;
                }
                let b = buf[*pos];
                *pos += 1;
                Some(b)
            }
            Backing::File { file, pos, len } => {
                if *pos >= *len {
                    return None;
                }
                if file.seek(SeekFrom::Start(*pos)).is_err() {
                    return None;
                }
                let mut byte = [0u8; 1];
                match file.read_exact(&mut byte) {
                    Ok(()) => {
                        *pos += 1;
                        Some(byte[0])
                    }
                    Err(_) => None,
                }
            }
        }
    }

    /// `true` if the next `read_char` would yield nothing — either the mode
    /// forbids reads or position has reached the end.
    pub fn is_eos(&self) -> bool {
        let inner = self.0.lock().unwrap();
        if !inner.mode.allows_read() {
            return true;
        }
        match &inner.backing {
            Backing::Memory { buf, pos, .. } => *pos >= buf.len(),
            Backing::File { pos, len, .. } => *pos >= *len,
        }
    }

    /// Write one byte at the current position. Returns `false` (a silent
    /// no-op) if the mode forbids writes or — for bounded memory streams —
    /// capacity has been reached.
    pub fn write_char(&self, ch: u8) -> bool {
        let mut inner = self.0.lock().unwrap();
        if !inner.mode.allows_write() {
            return false;
        }
        match &mut inner.backing {
            Backing::Memory { buf, pos, cap } => {
                if *pos >= *cap {
                    return false;
                }
                if *pos < buf.len() {
                    buf[*pos] = ch;
                } else {
                    buf.push(ch);
                }
                *pos += 1;
                true
            }
            Backing::File { file, pos, len } => {
                if file.seek(SeekFrom::Start(*pos)).is_err() {
                    return false;
                }
                if file.write_all(&[ch]).is_err() {
                    return false;
                }
                *pos += 1;
                if *pos > *len {
                    *len = *pos;
                }
                true
            }
        }
    }

    /// Total size of the backing data, in bytes.
    pub fn size(&self) -> u32 {
        let inner = self.0.lock().unwrap();
        (match &inner.backing {
            Backing::Memory { buf, .. } => buf.len() as u64,
            Backing::File { len, .. } => *len,
        }) as u32
    }

    /// Current read/write position.
    pub fn pos(&self) -> u32 {
        let inner = self.0.lock().unwrap();
        (match &inner.backing {
            Backing::Memory { pos, .. } => *pos as u64,
            Backing::File { pos, .. } => *pos,
        }) as u32
    }

    /// Seek to an absolute position. Memory streams are always seekable;
    /// file streams are seekable here too since both backings track `pos`
    /// explicitly rather than relying on the OS cursor between calls.
    pub fn set_pos(&self, pos: u32) {
        let mut inner = self.0.lock().unwrap();
        match &mut inner.backing {
            Backing::Memory { pos: p, .. } => *p = pos as usize,
            Backing::File { pos: p, .. } => *p = pos as u64,
        }
    }

    /// Number of live handles to this stream, including this one.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

/// Stack of active input streams; the top is the tokenizer's current input.
/// Bounded to a fixed number of entries at construction.
pub struct StreamStack {
    streams: Vec<Stream>,
    cap: usize,
}

impl StreamStack {
    pub fn new(cap: usize) -> Self {
        StreamStack {
            streams: Vec::with_capacity(cap),
            cap,
        }
    }

    /// Push a stream, taking a strong reference. Sets `flags.stream_overflow`
    /// and leaves the stack unchanged if already at capacity.
    pub fn push(&mut self, stream: Stream, flags: &mut Flags) {
        if self.streams.len() >= self.cap {
            flags.stream_overflow = true;
            return;
        }
        self.streams.push(stream);
    }

    /// Pop and release the top stream, if any.
    pub fn pop(&mut self) -> Option<Stream> {
        self.streams.pop()
    }

    /// Borrow the current top-of-stack stream — the tokenizer's input.
    pub fn top(&self) -> Option<&Stream> {
        self.streams.last()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
