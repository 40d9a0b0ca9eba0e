use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use glam::{Mat4, Vec4};

use super::{FileHeader, NodeTag, ObjectHeader};
use crate::opcode::Opcode;
use crate::runtime::DecodeError;

/// Size-checked cursor over an in-memory object body.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::ShortRead {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    /// Reads an opcode that must exist in the identifier table.
    pub fn read_opcode(&mut self) -> Result<Opcode, DecodeError> {
        let raw = self.read_u16()?;
        Opcode::from_u16(raw).ok_or(DecodeError::InvalidValue {
            what: "opcode",
            value: raw.to_string(),
        })
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidValue {
            what: "string",
            value: String::from_utf8_lossy(bytes).into_owned(),
        })
    }

    /// Reads a BGRA colour and returns it in RGBA order.
    pub fn read_colour(&mut self) -> Result<Vec4, DecodeError> {
        let b = self.read_f32()?;
        let g = self.read_f32()?;
        let r = self.read_f32()?;
        let a = self.read_f32()?;
        Ok(Vec4::new(r, g, b, a))
    }

    /// Reads a row-major matrix.
    pub fn read_matrix(&mut self) -> Result<Mat4, DecodeError> {
        let mut rows = [0.0f32; 16];
        for v in rows.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(Mat4::from_cols_array(&rows).transpose())
    }

    pub fn read_tag(&mut self) -> Result<NodeTag, DecodeError> {
        let raw = self.read_u16()?;
        NodeTag::from_u16(raw).ok_or(DecodeError::InvalidNodeTag(raw))
    }

    /// Reads the rest of an object entry after its tag. Returns the header
    /// and a reader bounded to the object's children.
    pub fn read_object(&mut self) -> Result<(ObjectHeader, WireReader<'a>), DecodeError> {
        let opcode = self.read_u16()?;
        let count = self.read_u16()?;
        let length = self.read_u32()?;
        let body = self.take(length as usize)?;
        let mut body = WireReader::new(body);
        let name = body.read_string()?;
        Ok((
            ObjectHeader {
                opcode,
                count,
                length,
                name,
            },
            body,
        ))
    }

    #[cfg(test)]
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    /// Fails if bytes are left over after an object's declared children.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::InvalidValue {
                what: "object length",
                value: format!("{} trailing bytes", self.remaining()),
            })
        }
    }
}

/// A top-level object pulled off a stream, body still undecoded.
#[derive(Debug, Clone)]
pub struct RawObject {
    pub opcode: u16,
    pub count: u16,
    pub body: Vec<u8>,
}

/// Sequential reader over a compiled stream.
pub struct StreamReader<R> {
    inner: R,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_header(&mut self) -> Result<FileHeader, DecodeError> {
        let mut magic = [0u8; 4];
        self.inner.read_exact(&mut magic).map_err(short_read(4))?;
        let version = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(short_read(4))?;
        Ok(FileHeader { magic, version })
    }

    /// Next top-level object, or `None` at a clean end of stream.
    pub fn next_object(&mut self) -> Result<Option<RawObject>, DecodeError> {
        let mut first = [0u8; 1];
        if self.inner.read(&mut first)? == 0 {
            return Ok(None);
        }
        let second = self.inner.read_u8().map_err(short_read(1))?;
        let tag = u16::from_le_bytes([first[0], second]);
        if NodeTag::from_u16(tag) != Some(NodeTag::Object) {
            return Err(DecodeError::InvalidNodeTag(tag));
        }
        let opcode = self
            .inner
            .read_u16::<LittleEndian>()
            .map_err(short_read(2))?;
        let count = self
            .inner
            .read_u16::<LittleEndian>()
            .map_err(short_read(2))?;
        let length = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(short_read(4))? as usize;
        let mut body = Vec::new();
        (&mut self.inner).take(length as u64).read_to_end(&mut body)?;
        if body.len() != length {
            return Err(DecodeError::ShortRead {
                needed: length,
                remaining: body.len(),
            });
        }
        Ok(Some(RawObject {
            opcode,
            count,
            body,
        }))
    }
}

fn short_read(needed: usize) -> impl Fn(io::Error) -> DecodeError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::ShortRead {
                needed,
                remaining: 0,
            }
        } else {
            DecodeError::Io(e)
        }
    }
}
