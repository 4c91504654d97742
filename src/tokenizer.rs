//! # Tokenizer
//!
//! Pulls whitespace-delimited tokens off the stream stack's current top,
//! popping exhausted streams as it goes so a finished include-stream falls
//! back to whatever pushed it. Each extracted token is handed to the caller
//! already pushed onto the string stack; the caller (the compiler) pops it
//! once it has resolved the token against the dictionary or as a literal.

use crate::flags::Flags;
use crate::stream::StreamStack;
use crate::stringstack::StringStack;

/// Longest token this tokenizer will keep in full; anything past this many
/// bytes is truncated and the excess is discarded.
pub const MAX_TOKEN_SIZE: usize = 1023;

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Extract the next token and push it onto `strings`.
///
/// Returns `true` if a token was produced, `false` if the stream stack ran
/// dry without yielding one. Streams that hit end-of-stream while being
/// scanned for a token are popped here, not by the caller — this is the only
/// place a stream is dropped on EOS.
pub fn next_token(streams: &mut StreamStack, strings: &mut StringStack, flags: &mut Flags) -> bool {
    loop {
        let stream = match streams.top() {
            Some(s) => s.clone(),
            None => return false,
        };

        let mut first = None;
        loop {
            match stream.read_char() {
                Some(b) if is_whitespace(b) => continue,
                Some(b) => {
                    first = Some(b);
                    break;
                }
                None => break,
            }
        }

        let first = match first {
            Some(b) => b,
            None => {
                // This stream yielded nothing but whitespace before EOS.
                streams.pop();
                if streams.is_empty() {
                    return false;
                }
                continue;
            }
        };

        let mut buf = Vec::with_capacity(16);
        buf.push(first);
        let mut truncated = false;
        loop {
            match stream.read_char() {
                Some(b) if is_whitespace(b) => break,
                Some(b) => {
                    if buf.len() < MAX_TOKEN_SIZE {
                        buf.push(b);
                    } else {
                        truncated = true;
                    }
                }
                None => break,
            }
        }

        if truncated {
            flags.compile_error = true;
        }

        let token = String::from_utf8_lossy(&buf).into_owned();
        strings.push(&token, flags);
        return true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Stream;

    fn setup(text: &str) -> (StreamStack, StringStack, Flags) {
        let mut streams = StreamStack::new(4);
        let mut flags = Flags::new();
        streams.push(Stream::from_text(text), &mut flags);
        (streams, StringStack::new(4096, 64), flags)
    }

    #[test]
    fn splits_on_ascii_whitespace() {
        let (mut streams, mut strings, mut flags) = setup("2 3  +\t.\n");
        let mut tokens = Vec::new();
        while next_token(&mut streams, &mut strings, &mut flags) {
            tokens.push(strings.top().unwrap().to_string());
            strings.pop();
        }
        assert_eq!(tokens, vec!["2", "3", "+", "."]);
        assert!(!flags.compile_error);
    }

    #[test]
    fn exhausted_stream_yields_false_and_is_popped() {
        let (mut streams, mut strings, mut flags) = setup("");
        assert!(!next_token(&mut streams, &mut strings, &mut flags));
        assert!(streams.is_empty());
    }

    #[test]
    fn oversize_token_is_truncated_and_latches_compile_error() {
        let long = "x".repeat(MAX_TOKEN_SIZE + 50);
        let (mut streams, mut strings, mut flags) = setup(&long);
        assert!(next_token(&mut streams, &mut strings, &mut flags));
        assert_eq!(strings.top().unwrap().len(), MAX_TOKEN_SIZE);
        assert!(flags.compile_error);
    }

    #[test]
    fn popping_an_exhausted_include_stream_falls_back_to_the_next_one() {
        let mut streams = StreamStack::new(4);
        let mut flags = Flags::new();
        streams.push(Stream::from_text("outer"), &mut flags);
        streams.push(Stream::from_text(""), &mut flags);
        let mut strings = StringStack::new(4096, 64);
        assert!(next_token(&mut streams, &mut strings, &mut flags));
        assert_eq!(strings.top().unwrap(), "outer");
        assert_eq!(streams.len(), 1);
    }
}
