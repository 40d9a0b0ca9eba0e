//! Binary stream → live object graph.
//!
//! [`ScriptDecoder`] walks a compiled stream one top-level object at a time.
//! Each object's body is read in full before it is parsed, so a failure
//! inside one object costs only that object: the decoder records it, tells
//! the [`ResourceManager`] and carries on with the next one.

mod error;
mod gpu_program;
mod material;
mod pass;
mod sampler;
mod texture_unit;

pub use error::DecodeError;
pub use gpu_program::{
    ConstantBufferParser, ConstantBufferRefParser, GpuProgramParser, GpuProgramRefParser,
    ShaderParser, ShaderRefParser,
};
pub use material::{MaterialParser, TechniqueParser};
pub use pass::PassParser;
pub use sampler::SamplerParser;
pub use texture_unit::TextureUnitParser;

use std::io::Read;
use std::ops::RangeInclusive;

use log::{debug, error, info};
use crate::opcode::Opcode;
use crate::resource::{FromOpcode, ResourceManager};
use crate::wire::{NodeTag, ObjectHeader, RawObject, StreamReader, WireReader};

/// Decodes one object kind from its body.
pub trait ObjectParser {
    type Output;

    /// `reader` is positioned just after the object's name and bounded to
    /// its children.
    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<Self::Output, DecodeError>;
}

/// Progress through one top-level object. A [`DecodeFailure`] records the
/// state the object had reached when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Start,
    HeaderRead,
    ChildLoop,
    Complete,
}

/// A top-level object that could not be loaded.
#[derive(Debug)]
pub struct DecodeFailure {
    pub opcode: u16,
    pub name: String,
    /// Last state reached before the failure.
    pub state: ParseState,
    pub error: DecodeError,
}

#[derive(Debug, Default)]
pub struct DecodeReport {
    pub version: u32,
    pub objects: usize,
    pub failures: Vec<DecodeFailure>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ScriptDecoder;

impl ScriptDecoder {
    /// Decodes every top-level object in `stream`. Fails outright only when
    /// the file header is unusable.
    pub fn decode(
        stream: &mut impl Read,
        manager: &mut impl ResourceManager,
    ) -> Result<DecodeReport, DecodeError> {
        let mut reader = StreamReader::new(stream);
        let header = reader.read_header()?;
        if !header.is_valid_magic() {
            return Err(DecodeError::InvalidFileType);
        }
        if !header.is_supported() {
            return Err(DecodeError::UnsupportedVersion(header.version));
        }

        let mut report = DecodeReport {
            version: header.version,
            ..DecodeReport::default()
        };
        loop {
            let raw = match reader.next_object() {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(err) => {
                    error!("stream ended early: {err}");
                    report.failures.push(DecodeFailure {
                        opcode: 0,
                        name: String::new(),
                        state: ParseState::Start,
                        error: err,
                    });
                    break;
                }
            };
            match decode_object(&raw, header.version, manager) {
                Ok(()) => report.objects += 1,
                Err(failure) => report.failures.push(failure),
            }
        }

        info!(
            "decoded {} objects ({} failed)",
            report.objects,
            report.failures.len()
        );
        Ok(report)
    }
}

fn decode_object(
    raw: &RawObject,
    version: u32,
    manager: &mut impl ResourceManager,
) -> Result<(), DecodeFailure> {
    let mut state = ParseState::Start;
    let mut name = String::new();
    match decode_body(raw, version, manager, &mut state, &mut name) {
        Ok(kind) => {
            debug!("decoded {kind} '{name}'");
            Ok(())
        }
        Err(err) => {
            let kind = Opcode::from_u16(raw.opcode).unwrap_or(Opcode::Unspecified);
            error!("failed to decode {kind} '{name}': {err}");
            manager.load_failed(kind, &name, &err);
            Err(DecodeFailure {
                opcode: raw.opcode,
                name,
                state,
                error: err,
            })
        }
    }
}

fn decode_body(
    raw: &RawObject,
    version: u32,
    manager: &mut impl ResourceManager,
    state: &mut ParseState,
    name: &mut String,
) -> Result<Opcode, DecodeError> {
    let mut body = WireReader::new(&raw.body);
    *name = body.read_string()?;
    let header = ObjectHeader {
        opcode: raw.opcode,
        count: raw.count,
        length: raw.body.len() as u32,
        name: name.clone(),
    };
    *state = ParseState::HeaderRead;

    let kind = Opcode::from_u16(raw.opcode)
        .filter(|op| op.is_top_level())
        .ok_or(DecodeError::UnknownOpcode {
            object: "stream",
            opcode: raw.opcode,
        })?;
    *state = ParseState::ChildLoop;
    match kind {
        Opcode::Material => {
            let material = MaterialParser.parse(&mut body, &header, version)?;
            manager.create_material(material);
        }
        Opcode::GpuProgram => {
            let program = GpuProgramParser.parse(&mut body, &header, version)?;
            manager.create_gpu_program(program);
        }
        Opcode::GpuCbuffer => {
            let buffer = ConstantBufferParser.parse(&mut body, &header, version)?;
            manager.create_constant_buffer(buffer);
        }
        Opcode::Sampler => {
            let sampler = SamplerParser.parse(&mut body, &header, version)?;
            manager.create_sampler(sampler);
        }
        _ => {
            return Err(DecodeError::UnknownOpcode {
                object: "stream",
                opcode: raw.opcode,
            })
        }
    }
    *state = ParseState::Complete;
    Ok(kind)
}

/// One entry of an object's child section.
pub(crate) enum Child<'r, 'a> {
    Property(Opcode, &'r mut WireReader<'a>),
    Object(Opcode, ObjectHeader, WireReader<'a>),
}

/// Reads exactly `count` children and then requires the body to be spent.
pub(crate) fn read_children<'a>(
    reader: &mut WireReader<'a>,
    count: u16,
    object: &'static str,
    mut visit: impl FnMut(Child<'_, 'a>) -> Result<(), DecodeError>,
) -> Result<(), DecodeError> {
    for _ in 0..count {
        match reader.read_tag()? {
            NodeTag::Property => {
                let raw = reader.read_u16()?;
                let op = Opcode::from_u16(raw).ok_or(DecodeError::UnknownOpcode {
                    object,
                    opcode: raw,
                })?;
                visit(Child::Property(op, &mut *reader))?;
            }
            NodeTag::Object => {
                let (header, body) = reader.read_object()?;
                let op = Opcode::from_u16(header.opcode).ok_or(DecodeError::UnknownOpcode {
                    object,
                    opcode: header.opcode,
                })?;
                visit(Child::Object(op, header, body))?;
            }
        }
    }
    reader.finish()
}

pub(crate) fn unknown(object: &'static str, op: Opcode) -> DecodeError {
    DecodeError::UnknownOpcode {
        object,
        opcode: op.as_u16(),
    }
}

/// Reads an opcode and maps it onto a typed state.
pub(crate) fn read_enum<T: FromOpcode>(r: &mut WireReader<'_>) -> Result<T, DecodeError> {
    let op = r.read_opcode()?;
    T::from_opcode(op).ok_or_else(|| DecodeError::invalid(T::WHAT, op))
}

/// Like [`read_enum`], with `Unspecified` meaning absent.
pub(crate) fn read_optional<T: FromOpcode>(r: &mut WireReader<'_>) -> Result<Option<T>, DecodeError> {
    let op = r.read_opcode()?;
    if op == Opcode::Unspecified {
        return Ok(None);
    }
    T::from_opcode(op)
        .map(Some)
        .ok_or_else(|| DecodeError::invalid(T::WHAT, op))
}

pub(crate) fn read_argc(
    r: &mut WireReader<'_>,
    allowed: RangeInclusive<u16>,
) -> Result<u16, DecodeError> {
    let n = r.read_u16()?;
    if allowed.contains(&n) {
        Ok(n)
    } else {
        Err(DecodeError::invalid("argument count", n))
    }
}

pub(crate) fn require_name(header: &ObjectHeader, object: &'static str) -> Result<(), DecodeError> {
    if header.name.is_empty() {
        Err(DecodeError::EmptyName(object))
    } else {
        Ok(())
    }
}
