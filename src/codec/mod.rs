//! Encoding of outgoing commands.
//!
//! Encoding a command does not produce a flat byte vector: every
//! synchronizing literal forces the client to pause until the server grants
//! a continuation request. [`EncodeBuffer`] therefore accumulates bytes and
//! *stop points*; [`EncodeBuffer::next_chunk`] then yields [`Chunk`]s, and a
//! chunk with `wait_for_continuation` set must not be followed by further
//! bytes until the server has answered with `+`.

mod encode;

use std::{collections::VecDeque, io, io::Write};

pub use encode::encode_command;
pub(crate) use encode::{
    encode_append_begin_catenate, encode_append_begin_message, encode_append_end_catenate,
    encode_append_finish, encode_append_start, encode_catenate_data_begin, encode_catenate_url,
    encode_continuation_response, encode_idle_done, EncodeIntoBuffer,
};

use crate::types::response::Capability;

/// One transmission unit of an encoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub bytes: Vec<u8>,
    /// When set, the chunk ends right after a synchronizing literal header
    /// and the server must answer with a continuation request before any
    /// further bytes of this command may be sent.
    pub wait_for_continuation: bool,
}

/// Wire-form options the encoder works with.
///
/// The defaults describe a plain RFC 3501 server; richer profiles are
/// derived from capability advertisements via
/// [`EncodingOptions::from_capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {
    /// Prefer quoted strings over literals where the content allows it.
    pub use_quoted_string: bool,
    /// Allow `{N}` synchronizing literals. Disabling this makes strings
    /// that fit no other form an encode error.
    pub use_synchronizing_literal: bool,
    /// `{N+}` (LITERAL+, RFC 7888).
    pub use_non_synchronizing_literal_plus: bool,
    /// `{N-}` for N ≤ 4096 (LITERAL-, RFC 7888).
    pub use_non_synchronizing_literal_minus: bool,
    /// `~{N}` binary literals (RFC 3516).
    pub use_binary_literal: bool,
    /// Allow UTF-8 inside quoted strings (UTF8=ACCEPT/ONLY, RFC 6855).
    pub use_utf8_quoted_string: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            use_quoted_string: true,
            use_synchronizing_literal: true,
            use_non_synchronizing_literal_plus: false,
            use_non_synchronizing_literal_minus: false,
            use_binary_literal: false,
            use_utf8_quoted_string: false,
        }
    }
}

impl EncodingOptions {
    /// Derives the profile a capability advertisement permits.
    pub fn from_capabilities(capabilities: &[Capability]) -> Self {
        let mut options = Self::default();

        for capability in capabilities {
            match capability {
                Capability::LiteralPlus => options.use_non_synchronizing_literal_plus = true,
                Capability::LiteralMinus => options.use_non_synchronizing_literal_minus = true,
                Capability::Binary => options.use_binary_literal = true,
                Capability::Utf8Accept | Capability::Utf8Only => {
                    options.use_utf8_quoted_string = true
                }
                _ => {}
            }
        }

        options
    }
}

/// Whether the engine derives [`EncodingOptions`] from capability
/// advertisements or uses a caller-pinned profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionsPolicy {
    #[default]
    Automatic,
    Fixed(EncodingOptions),
}

/// An append-only byte buffer with explicit stop points.
#[derive(Debug, Clone, Default)]
pub struct EncodeBuffer {
    options: EncodingOptions,
    accumulator: Vec<u8>,
    chunks: VecDeque<Chunk>,
}

impl EncodeBuffer {
    pub fn new(options: EncodingOptions) -> Self {
        Self {
            options,
            accumulator: Vec::new(),
            chunks: VecDeque::new(),
        }
    }

    pub fn options(&self) -> &EncodingOptions {
        &self.options
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.accumulator.extend_from_slice(bytes);
    }

    /// Appends UTF-8 text verbatim. No IMAP quoting is applied; use
    /// [`EncodeBuffer::write_string`] for string arguments.
    pub fn write_str(&mut self, value: &str) {
        self.accumulator.extend_from_slice(value.as_bytes());
    }

    /// Records the current end of the buffer as a stop point: the caller
    /// will have to await a continuation request here.
    pub fn mark_stop_point(&mut self) {
        self.chunks.push_back(Chunk {
            bytes: std::mem::take(&mut self.accumulator),
            wait_for_continuation: true,
        });
    }

    /// Writes an IMAP string argument, choosing quoted vs literal form.
    ///
    /// A string qualifies for the quoted form when quoting is enabled and
    /// it contains only printable characters that need no escaping; with
    /// `use_utf8_quoted_string`, valid UTF-8 also qualifies. Everything
    /// else is sent as a literal: `{N+}` when LITERAL+ is usable, `{N-}`
    /// when LITERAL- is usable and N ≤ 4096, and `{N}` followed by a stop
    /// point otherwise.
    pub fn write_string(&mut self, value: &[u8]) -> io::Result<()> {
        if self.fits_quoted(value) {
            self.accumulator.push(b'"');
            self.accumulator.extend_from_slice(value);
            self.accumulator.push(b'"');
            Ok(())
        } else {
            self.write_literal(value)
        }
    }

    /// Writes a literal, never a quoted string.
    pub fn write_literal(&mut self, value: &[u8]) -> io::Result<()> {
        self.write_literal_header(value.len(), false)?;
        self.write_bytes(value);
        Ok(())
    }

    /// Writes a binary literal (`~{N}`), allowing NUL bytes (RFC 3516).
    pub fn write_literal8(&mut self, value: &[u8]) -> io::Result<()> {
        self.write_literal_header(value.len(), true)?;
        self.write_bytes(value);
        Ok(())
    }

    /// Writes only the literal size header (plus a stop point when the
    /// literal is synchronizing). Used for streamed APPEND payloads whose
    /// bytes follow as separate chunks.
    pub(crate) fn write_literal_header(&mut self, length: usize, binary: bool) -> io::Result<()> {
        if binary {
            self.accumulator.push(b'~');
        }

        if self.options.use_non_synchronizing_literal_plus {
            write!(self, "{{{length}+}}\r\n")?;
        } else if self.options.use_non_synchronizing_literal_minus && length <= 4096 {
            write!(self, "{{{length}-}}\r\n")?;
        } else if self.options.use_synchronizing_literal {
            write!(self, "{{{length}}}\r\n")?;
            self.mark_stop_point();
        } else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "string requires a literal but synchronizing literals are disabled",
            ));
        }

        Ok(())
    }

    fn fits_quoted(&self, value: &[u8]) -> bool {
        fn is_quoted_safe(byte: u8) -> bool {
            matches!(byte, 0x20..=0x21 | 0x23..=0x5b | 0x5d..=0x7e)
        }

        if !self.options.use_quoted_string {
            return false;
        }

        if value.iter().all(|b| is_quoted_safe(*b)) {
            return true;
        }

        self.options.use_utf8_quoted_string
            && std::str::from_utf8(value)
                .map(|s| {
                    s.chars()
                        .all(|c| !c.is_ascii() || is_quoted_safe(c as u8))
                })
                .unwrap_or(false)
    }

    /// Returns the bytes up to the earliest unreturned stop point, or the
    /// remaining tail, or `None` when everything was consumed.
    pub fn next_chunk(&mut self) -> Option<Chunk> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Some(chunk);
        }

        if self.accumulator.is_empty() {
            return None;
        }

        Some(Chunk {
            bytes: std::mem::take(&mut self.accumulator),
            wait_for_continuation: false,
        })
    }

    /// Consumes the buffer, yielding all chunks in order.
    pub fn into_chunks(mut self) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(self.chunks.len() + 1);

        while let Some(chunk) = self.next_chunk() {
            chunks.push(chunk);
        }

        chunks
    }

    /// Concatenation of all remaining bytes, ignoring stop points.
    pub fn dump(self) -> Vec<u8> {
        let mut out = Vec::new();

        for chunk in self.into_chunks() {
            out.extend_from_slice(&chunk.bytes);
        }

        out
    }
}

impl Write for EncodeBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.accumulator.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_points_split_chunks() {
        let mut buf = EncodeBuffer::new(EncodingOptions::default());
        buf.write_str("a RENAME ");
        buf.write_string(b"\\").unwrap();
        buf.write_str(" ");
        buf.write_string(b"\"").unwrap();
        buf.write_str("\r\n");

        let chunks = buf.into_chunks();
        assert_eq!(
            chunks,
            vec![
                Chunk {
                    bytes: b"a RENAME {1}\r\n".to_vec(),
                    wait_for_continuation: true,
                },
                Chunk {
                    bytes: b"\\ {1}\r\n".to_vec(),
                    wait_for_continuation: true,
                },
                Chunk {
                    bytes: b"\"\r\n".to_vec(),
                    wait_for_continuation: false,
                },
            ]
        );
    }

    #[test]
    fn test_quoted_string_is_preferred() {
        let mut buf = EncodeBuffer::new(EncodingOptions::default());
        buf.write_string(b"foo").unwrap();
        buf.write_string(b"").unwrap();
        assert_eq!(buf.dump(), b"\"foo\"\"\"".to_vec());
    }

    #[test]
    fn test_literal_plus_avoids_stop_point() {
        let options = EncodingOptions {
            use_non_synchronizing_literal_plus: true,
            ..Default::default()
        };
        let mut buf = EncodeBuffer::new(options);
        buf.write_string(b"\\").unwrap();

        let chunks = buf.into_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].bytes, b"{1+}\r\n\\".to_vec());
        assert!(!chunks[0].wait_for_continuation);
    }

    #[test]
    fn test_literal_minus_is_size_capped() {
        let options = EncodingOptions {
            use_non_synchronizing_literal_minus: true,
            ..Default::default()
        };

        let mut buf = EncodeBuffer::new(options);
        buf.write_string(b"\\").unwrap();
        let chunks = buf.into_chunks();
        assert_eq!(chunks[0].bytes, b"{1-}\r\n\\".to_vec());

        let big = vec![b'x'; 4097];
        let mut buf = EncodeBuffer::new(options);
        // Forced to a literal via a quoted-special prefix.
        let mut value = b"\"".to_vec();
        value.extend_from_slice(&big);
        buf.write_string(&value).unwrap();
        let chunks = buf.into_chunks();
        assert!(chunks[0].bytes.ends_with(b"{4098}\r\n"));
        assert!(chunks[0].wait_for_continuation);
    }

    #[test]
    fn test_utf8_quoting_is_gated() {
        let mut buf = EncodeBuffer::new(EncodingOptions::default());
        buf.write_string("Pa²²W0rD".as_bytes()).unwrap();
        assert_eq!(buf.dump(), b"{10}\r\nPa\xc2\xb2\xc2\xb2W0rD".to_vec());

        let options = EncodingOptions {
            use_utf8_quoted_string: true,
            ..Default::default()
        };
        let mut buf = EncodeBuffer::new(options);
        buf.write_string("Pa²²W0rD".as_bytes()).unwrap();
        assert_eq!(buf.dump(), "\"Pa²²W0rD\"".as_bytes().to_vec());
    }

    #[test]
    fn test_options_from_capabilities() {
        let options = EncodingOptions::from_capabilities(&[
            Capability::Imap4Rev1,
            Capability::LiteralPlus,
            Capability::Binary,
        ]);
        assert!(options.use_non_synchronizing_literal_plus);
        assert!(options.use_binary_literal);
        assert!(!options.use_non_synchronizing_literal_minus);
    }
}
