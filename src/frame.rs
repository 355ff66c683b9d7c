//! The length envelope around every datagram
//!
//! ```text
//! [i32 length L][L bytes body][i32 length L]
//! ```
//!
//! Both lengths are little-endian and must agree. A stream that ends
//! exactly where a leading length would start is finished, not broken.
use crate::error::{FramingError, Result};
use crate::parser::{DatagramHeader, HEADER_LENGTH};
use crate::primitive::{read_i32_or_end, read_up_to, skip, MaybeI32};
use binrw::BinRead;
use std::io::{Cursor, Read, Write};

/// Where a [`FrameReader`] is in its stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Between records, the next read is a leading length
    AwaitingHeader,
    /// Inside a record body
    DecodingBody,
    /// Body consumed, the next read is the trailing length
    AwaitingTrailer,
    /// The stream ended cleanly at a record boundary
    Done,
    /// The envelope was broken; no further records are read
    Failed,
}

/// Reads framed datagrams from a byte stream
///
/// After [`FrameState::Done`] or [`FrameState::Failed`] every read
/// returns `None`.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    state: FrameState,
    position: u64,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a stream positioned at a record boundary
    pub fn new(reader: R) -> Self {
        FrameReader {
            reader,
            state: FrameState::AwaitingHeader,
            position: 0,
        }
    }

    /// The current state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Bytes consumed so far, the offset of the next record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Recover the wrapped stream
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the next record and hand its body to `decode`
    ///
    /// The trailing length is checked before `decode` runs, so a
    /// decode error leaves the stream usable at the next record.
    pub fn next_with<T, F>(&mut self, decode: F) -> Option<Result<T>>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let body = match self.next_body()? {
            Ok(body) => body,
            Err(e) => return Some(Err(e)),
        };
        Some(decode(&body))
    }

    /// Read the next record body
    pub fn next_body(&mut self) -> Option<Result<Vec<u8>>> {
        let length = match self.leading_length()? {
            Ok(length) => length,
            Err(e) => return Some(Err(e)),
        };
        let result = self.body(length).and_then(|body| {
            self.trailer(length)?;
            Ok(body)
        });
        Some(result)
    }

    /// Read only the common header of the next record, skipping the rest
    /// of the body
    pub fn next_header(&mut self) -> Option<Result<DatagramHeader>> {
        let length = match self.leading_length()? {
            Ok(length) => length,
            Err(e) => return Some(Err(e)),
        };
        if length < HEADER_LENGTH {
            // Too short for a header: frame it, then let the header decode fail
            let result = self.body(length).and_then(|body| {
                self.trailer(length)?;
                Ok(DatagramHeader::read(&mut Cursor::new(&body))?)
            });
            return Some(result);
        }
        let result = self.header_only(length).and_then(|header| {
            self.trailer(length)?;
            Ok(header)
        });
        Some(result)
    }

    fn fail<T>(&mut self, e: FramingError) -> Result<T> {
        self.state = FrameState::Failed;
        Err(e.into())
    }

    fn leading_length(&mut self) -> Option<Result<usize>> {
        if self.state != FrameState::AwaitingHeader {
            return None;
        }
        let length = match read_i32_or_end(&mut self.reader) {
            Ok(MaybeI32::End) => {
                self.state = FrameState::Done;
                return None;
            }
            Ok(MaybeI32::Partial(read)) => {
                return Some(self.fail(FramingError::TruncatedLength { read }));
            }
            Ok(MaybeI32::Value(length)) => length,
            Err(e) => {
                self.state = FrameState::Failed;
                return Some(Err(e.into()));
            }
        };
        self.position += 4;
        if length < 0 {
            return Some(self.fail(FramingError::InvalidLength(length)));
        }
        self.state = FrameState::DecodingBody;
        log::trace!("datagram of {} bytes at offset {}", length, self.position - 4);
        Some(Ok(length as usize))
    }

    fn body(&mut self, length: usize) -> Result<Vec<u8>> {
        let body = match read_up_to(&mut self.reader, length) {
            Ok(body) => body,
            Err(e) => {
                self.state = FrameState::Failed;
                return Err(e.into());
            }
        };
        self.position += body.len() as u64;
        if body.len() < length {
            return self.fail(FramingError::TruncatedBody {
                expected: length,
                found: body.len(),
            });
        }
        self.state = FrameState::AwaitingTrailer;
        Ok(body)
    }

    fn header_only(&mut self, length: usize) -> Result<DatagramHeader> {
        let head = self.body(HEADER_LENGTH)?;
        self.state = FrameState::DecodingBody;
        let header = DatagramHeader::read(&mut Cursor::new(&head))?;

        let rest = length - HEADER_LENGTH;
        let skipped = match skip(&mut self.reader, rest) {
            Ok(n) => n as usize,
            Err(e) => {
                self.state = FrameState::Failed;
                return Err(e.into());
            }
        };
        self.position += skipped as u64;
        if skipped < rest {
            return self.fail(FramingError::TruncatedBody {
                expected: length,
                found: HEADER_LENGTH + skipped,
            });
        }
        self.state = FrameState::AwaitingTrailer;
        Ok(header)
    }

    fn trailer(&mut self, length: usize) -> Result<()> {
        let leading = length as i32;
        match read_i32_or_end(&mut self.reader) {
            Ok(MaybeI32::Value(trailing)) => {
                self.position += 4;
                if trailing != leading {
                    return self.fail(FramingError::LengthMismatch { leading, trailing });
                }
                self.state = FrameState::AwaitingHeader;
                Ok(())
            }
            Ok(MaybeI32::End) | Ok(MaybeI32::Partial(_)) => {
                self.fail(FramingError::MissingTrailer(leading))
            }
            Err(e) => {
                self.state = FrameState::Failed;
                Err(e.into())
            }
        }
    }
}

/// Write `body` wrapped in its leading and trailing lengths
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    let length = i32::try_from(body.len()).map_err(|_| FramingError::BodyTooLong(body.len()))?;
    writer.write_all(&length.to_le_bytes())?;
    writer.write_all(body)?;
    writer.write_all(&length.to_le_bytes())?;
    Ok(())
}

/// Frame `body` into a new buffer
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len() + 8);
    write_frame(&mut out, body)?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    fn body(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut b = tag.to_vec();
        b.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0]);
        b.extend_from_slice(payload);
        b
    }

    #[test]
    fn round_trip() {
        let b = body(b"ABC0", &[0, 255, 10, 13, 0]);
        let framed = encode_frame(&b).unwrap();
        assert_eq!(framed.len(), b.len() + 8);

        let mut frames = FrameReader::new(framed.as_slice());
        assert_eq!(frames.next_body().unwrap().unwrap(), b);
        assert!(frames.next_body().is_none());
        assert_eq!(frames.state(), FrameState::Done);
        assert_eq!(frames.position(), framed.len() as u64);
    }

    #[test]
    fn short_bodies_round_trip() {
        for len in [0, 1, 11, 12] {
            let b = (0..len).map(|i| i as u8 ^ 0xa5).collect::<Vec<u8>>();
            let framed = encode_frame(&b).unwrap();
            let mut frames = FrameReader::new(framed.as_slice());
            assert_eq!(frames.next_body().unwrap().unwrap(), b);
            assert!(frames.next_body().is_none());
            assert_eq!(frames.state(), FrameState::Done);
        }
    }

    #[test]
    fn negative_length() {
        let mut framed = (-1i32).to_le_bytes().to_vec();
        framed.extend_from_slice(&[0; 8]);
        let mut frames = FrameReader::new(framed.as_slice());
        assert!(matches!(
            frames.next_body(),
            Some(Err(Error::Framing(FramingError::InvalidLength(-1))))
        ));
        assert_eq!(frames.state(), FrameState::Failed);
    }

    #[test]
    fn header_only_rejects_headerless_frame() {
        let mut stream = encode_frame(b"abc").unwrap();
        stream.extend(encode_frame(&body(b"NME0", b"$GPGGA")).unwrap());

        let mut frames = FrameReader::new(stream.as_slice());
        assert!(matches!(frames.next_header(), Some(Err(Error::Decode(_)))));
        assert_eq!(frames.state(), FrameState::AwaitingHeader);
        assert_eq!(frames.next_header().unwrap().unwrap().tag(), "NME0");
        assert!(frames.next_header().is_none());
    }

    #[test]
    fn tampered_trailer() {
        let mut framed = encode_frame(&body(b"ABC0", &[7; 9])).unwrap();
        let n = framed.len();
        framed[n - 4] ^= 1;

        let mut frames = FrameReader::new(framed.as_slice());
        match frames.next_body() {
            Some(Err(Error::Framing(FramingError::LengthMismatch { leading: 21, trailing: 20 }))) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(frames.state(), FrameState::Failed);
        assert!(frames.next_body().is_none());
    }

    #[test]
    fn missing_trailer() {
        let framed = encode_frame(&body(b"ABC0", &[])).unwrap();
        let cut = &framed[..framed.len() - 4];
        let mut frames = FrameReader::new(cut);
        assert!(matches!(
            frames.next_body(),
            Some(Err(Error::Framing(FramingError::MissingTrailer(12))))
        ));
    }

    #[test]
    fn truncated_body() {
        let framed = encode_frame(&body(b"ABC0", &[1; 20])).unwrap();
        let mut frames = FrameReader::new(&framed[..10]);
        assert!(matches!(
            frames.next_body(),
            Some(Err(Error::Framing(FramingError::TruncatedBody { expected: 32, found: 6 })))
        ));
    }

    #[test]
    fn header_only_skips_body() {
        let mut stream = encode_frame(&body(b"RAW0", &[9; 100])).unwrap();
        stream.extend(encode_frame(&body(b"NME0", b"$GPGGA")).unwrap());

        let mut frames = FrameReader::new(stream.as_slice());
        let first = frames.next_header().unwrap().unwrap();
        assert_eq!(first.tag(), "RAW0");
        assert_eq!(first.timestamp.ticks(), (2 << 32) + 1);
        assert_eq!(frames.position(), 120);
        let second = frames.next_header().unwrap().unwrap();
        assert_eq!(second.tag(), "NME0");
        assert!(frames.next_header().is_none());
    }

    #[test]
    fn decode_errors_do_not_break_the_stream() {
        let mut stream = encode_frame(&body(b"ABC0", &[])).unwrap();
        stream.extend(encode_frame(&body(b"DEF0", &[])).unwrap());

        let mut frames = FrameReader::new(stream.as_slice());
        let first: Option<Result<()>> =
            frames.next_with(|_| Err(FramingError::InvalidLength(0).into()));
        assert!(first.unwrap().is_err());
        assert_eq!(frames.state(), FrameState::AwaitingHeader);
        assert!(frames.next_body().unwrap().is_ok());
    }
}
