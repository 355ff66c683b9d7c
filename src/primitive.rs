//! Low level readers shared by the datagram parsers
//!
//! Fixed-layout numeric fields are read by `binrw` directly. What lives
//! here are the pieces `binrw` does not cover on its own: NUL padded
//! strings and length fields where running out of input is a valid
//! outcome rather than an error.
use std::io::{self, Read};
use std::string::FromUtf8Error;

/// Decode a fixed-width string field
///
/// The bytes must be UTF-8. NUL padding at either end is removed.
pub fn fixed_string(bytes: Vec<u8>) -> Result<String, FromUtf8Error> {
    let s = String::from_utf8(bytes)?;
    Ok(s.trim_matches('\0').to_string())
}

/// Outcome of reading a 4 byte little-endian integer that may be absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybeI32 {
    /// All four bytes were read
    Value(i32),
    /// The stream ended before the first byte
    End,
    /// The stream ended after `n` bytes
    Partial(usize),
}

/// Read a little-endian `i32`, telling a clean end of stream apart
/// from a truncated value
pub fn read_i32_or_end<R: Read>(reader: &mut R) -> io::Result<MaybeI32> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(match filled {
        0 => MaybeI32::End,
        4 => MaybeI32::Value(i32::from_le_bytes(buf)),
        n => MaybeI32::Partial(n),
    })
}

/// Read at most `len` bytes, returning whatever the stream had
pub fn read_up_to<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Discard up to `len` bytes, returning how many were skipped
pub fn skip<R: Read>(reader: &mut R, len: usize) -> io::Result<u64> {
    io::copy(&mut reader.take(len as u64), &mut io::sink())
}
