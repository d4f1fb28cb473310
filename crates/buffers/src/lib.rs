//! Bounds-checked binary buffer utilities for bwn-rs.
//!
//! The serialization streams this workspace reads come from foreign tooling
//! and cannot be trusted to be well formed, so every read is checked against
//! the buffer bounds and reports the offset at which it fell off the end.
//!
//! # Overview
//!
//! - [`Reader`] - Reads big-endian binary data from a byte slice with cursor
//!   tracking; every read is bounds-checked.
//! - [`Writer`] - Writes big-endian binary data to an auto-growing buffer.
//! - [`utf8_or_latin1`] - Decodes a string payload as UTF-8, falling back to
//!   a byte-preserving Latin-1 read on invalid sequences.
//! - [`hex_preview`] - Bounded hex rendering of opaque payloads for
//!   diagnostics.
//!
//! # Example
//!
//! ```
//! use bwn_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u16(0xACED);
//! writer.u16(0x0005);
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u16(), Ok(0xACED));
//! assert_eq!(reader.u16(), Ok(0x0005));
//! assert!(reader.u8().is_err());
//! ```

mod reader;
mod strings;
mod writer;

pub use reader::Reader;
pub use strings::{hex_preview, latin1, utf8_or_latin1};
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer. Carries the cursor
    /// offset at which the read started and the number of bytes it needed.
    OutOfBounds { offset: usize, needed: usize },
}

impl BufferError {
    /// The cursor offset at which the failing read started.
    pub fn offset(&self) -> usize {
        match self {
            BufferError::OutOfBounds { offset, .. } => *offset,
        }
    }
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::OutOfBounds { offset, needed } => {
                write!(f, "read of {needed} byte(s) at offset {offset:#x} runs past end of buffer")
            }
        }
    }
}

impl std::error::Error for BufferError {}
