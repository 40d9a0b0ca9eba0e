use byteorder::{ByteOrder, LittleEndian};
use glam::{Mat4, Vec4};

use super::{NodeTag, MAX_STRING_LEN};
use crate::opcode::Opcode;

/// Growable little-endian output buffer.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut b = [0; 2];
        LittleEndian::write_u16(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0; 4];
        LittleEndian::write_u32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut b = [0; 4];
        LittleEndian::write_i32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut b = [0; 4];
        LittleEndian::write_f32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn write_opcode(&mut self, op: Opcode) {
        self.write_u16(op.as_u16());
    }

    /// Writes a length-prefixed string.
    ///
    /// # Panics
    ///
    /// If `s` is longer than [`MAX_STRING_LEN`] bytes. Translators reject
    /// such strings with a diagnostic before they reach the writer.
    pub fn write_string(&mut self, s: &str) {
        assert!(
            s.len() <= MAX_STRING_LEN,
            "string of {} bytes exceeds the {MAX_STRING_LEN} byte limit",
            s.len()
        );
        self.write_u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Colour given in RGBA, written as BGRA.
    pub fn write_colour(&mut self, rgba: Vec4) {
        self.write_f32(rgba.z);
        self.write_f32(rgba.y);
        self.write_f32(rgba.x);
        self.write_f32(rgba.w);
    }

    /// Matrix written row by row.
    pub fn write_matrix(&mut self, m: &Mat4) {
        for v in m.transpose().to_cols_array() {
            self.write_f32(v);
        }
    }

    /// Writes a property entry whose payload was buffered separately.
    pub fn write_property(&mut self, op: Opcode, payload: &[u8]) {
        self.write_u16(NodeTag::Property as u16);
        self.write_opcode(op);
        self.buf.extend_from_slice(payload);
    }

    /// Writes an object entry whose children were buffered separately.
    pub fn write_object(&mut self, op: Opcode, name: &str, count: u16, children: &[u8]) {
        let mut body = WireWriter::new();
        body.write_string(name);
        body.write_bytes(children);
        self.write_u16(NodeTag::Object as u16);
        self.write_opcode(op);
        self.write_u16(count);
        self.write_u32(body.len() as u32);
        self.buf.extend_from_slice(&body.buf);
    }
}
