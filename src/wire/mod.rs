//! Binary wire format shared by the translators and the runtime parsers.
//!
//! Everything is little-endian. A compiled file is a [`FileHeader`] followed
//! by a sequence of top-level objects:
//!
//! ```text
//! object   := u16 tag=Object, u16 opcode, u16 child count, u32 body length,
//!             string name, child*            (body = name + children)
//! property := u16 tag=Property, u16 opcode, payload
//! string   := u16 length, bytes
//! colour   := f32 b, f32 g, f32 r, f32 a
//! matrix   := 16 x f32, row-major
//! ```

mod reader;
mod writer;

pub use reader::{RawObject, StreamReader, WireReader};
pub use writer::WireWriter;

/// File magic, NUL padded to four bytes.
pub const MAGIC: [u8; 4] = *b"TSC\0";

/// Current format version.
pub const CURRENT_VERSION: u32 = 0x0000_0100;

/// Size of [`FileHeader`] on the wire.
pub const FILE_HEADER_LEN: usize = 8;

/// Longest string the format can carry.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Tag written in front of every child entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NodeTag {
    Property = 1,
    Object = 2,
}

impl NodeTag {
    pub fn from_u16(value: u16) -> Option<NodeTag> {
        match value {
            1 => Some(NodeTag::Property),
            2 => Some(NodeTag::Object),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u32,
}

impl FileHeader {
    pub fn current() -> Self {
        Self {
            magic: MAGIC,
            version: CURRENT_VERSION,
        }
    }

    pub fn is_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Versions that share the current major number are readable.
    pub fn is_supported(&self) -> bool {
        self.version >> 8 == CURRENT_VERSION >> 8
    }

    pub fn write(&self, out: &mut WireWriter) {
        out.write_bytes(&self.magic);
        out.write_u32(self.version);
    }
}

/// The fixed part of an object entry, after its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHeader {
    pub opcode: u16,
    pub count: u16,
    pub length: u32,
    pub name: String,
}
