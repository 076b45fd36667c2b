//! Java `DataInput`/`DataOutput` primitives: big-endian integers and the
//! length-prefixed "modified UTF-8" strings written by `writeUTF`.

use thiserror::Error;

/// Errors decoding or encoding Java data primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected end of data at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("Malformed modified UTF-8 at offset {offset}")]
    InvalidModifiedUtf8 { offset: usize },

    #[error("String too long for a 16-bit length prefix: {0} encoded bytes")]
    StringTooLong(usize),

    #[error("Length {0} does not fit in this container")]
    LengthOverflow(i64),
}

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Everything consumed so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.data[..self.pos]
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: 1,
            })
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.read_array().map(u64::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.read_array().map(i64::from_be_bytes)
    }

    /// A Java `int` length followed by that many bytes.
    ///
    /// Negative lengths and lengths beyond the remaining input are rejected before
    /// anything is allocated.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_i32()?;
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(i64::from(len)))?;
        self.read_bytes(len)
    }

    /// `DataInput.readUTF`.
    pub fn read_utf(&mut self) -> Result<String, CodecError> {
        let len = usize::from(self.read_u16()?);
        let offset = self.pos;
        let bytes = self.read_bytes(len)?;
        decode_modified_utf8(bytes, offset)
    }
}

/// `DataOutput.writeUTF`: u16 length prefix plus modified UTF-8.
pub fn write_utf(out: &mut Vec<u8>, s: &str) -> Result<(), CodecError> {
    let encoded = encode_modified_utf8(s);
    let len = u16::try_from(encoded.len()).map_err(|_| CodecError::StringTooLong(encoded.len()))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&encoded);
    Ok(())
}

/// A Java `int` length followed by the bytes.
pub fn write_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), CodecError> {
    let len = i32::try_from(bytes.len())
        .map_err(|_| CodecError::LengthOverflow(i64::try_from(bytes.len()).unwrap_or(i64::MAX)))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Encode as Java's modified UTF-8: UTF-16 code units, NUL as two bytes, and
/// supplementary characters as two three-byte surrogates.
pub fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | ((unit >> 6) & 0x1f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | ((unit >> 12) & 0x0f) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

/// Decode Java's modified UTF-8. `offset` only feeds error messages.
pub fn decode_modified_utf8(bytes: &[u8], offset: usize) -> Result<String, CodecError> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let invalid = CodecError::InvalidModifiedUtf8 { offset: offset + i };
        let b0 = u16::from(bytes[i]);
        let continuation = |idx: usize| -> Result<u16, CodecError> {
            match bytes.get(idx) {
                Some(&b) if b & 0xc0 == 0x80 => Ok(u16::from(b & 0x3f)),
                _ => Err(CodecError::InvalidModifiedUtf8 { offset: offset + i }),
            }
        };

        match b0 >> 4 {
            0x0..=0x7 => {
                units.push(b0);
                i += 1;
            }
            0xc | 0xd => {
                units.push(((b0 & 0x1f) << 6) | continuation(i + 1)?);
                i += 2;
            }
            0xe => {
                units.push(((b0 & 0x0f) << 12) | (continuation(i + 1)? << 6) | continuation(i + 2)?);
                i += 3;
            }
            _ => return Err(invalid),
        }
    }

    String::from_utf16(&units).map_err(|_| CodecError::InvalidModifiedUtf8 { offset })
}
