use super::{read_children, require_name, unknown, Child, DecodeError, ObjectParser};
use crate::opcode::Opcode;
use crate::resource::{
    auto_constant, BuiltinType, ConstantBufferRef, ConstantParam, FromOpcode, GpuConstBuffer,
    GpuProgram, GpuProgramRef, ParamKey, ParamValue, Shader, ShaderKind, ShaderRef,
    ShaderRefKind,
};
use crate::wire::{ObjectHeader, WireReader};

pub struct GpuProgramParser;

impl ObjectParser for GpuProgramParser {
    type Output = GpuProgram;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<GpuProgram, DecodeError> {
        require_name(header, "gpu_program")?;
        let mut program = GpuProgram::new(&header.name);
        read_children(reader, header.count, "gpu_program", |child| match child {
            Child::Object(op, h, mut body) if ShaderKind::from_opcode(op).is_some() => {
                program.shaders.push(ShaderParser.parse(&mut body, &h, version)?);
                Ok(())
            }
            Child::Object(op, ..) | Child::Property(op, _) => Err(unknown("gpu_program", op)),
        })?;
        Ok(program)
    }
}

/// One stage of a program. The stage name defaults to the one implied by
/// the object kind and must agree with it when given.
pub struct ShaderParser;

impl ObjectParser for ShaderParser {
    type Output = Shader;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<Shader, DecodeError> {
        let kind = shader_kind(header)?;
        require_name(header, "shader")?;
        let mut source = None;
        let mut target = None;
        let mut entry_point = None;
        let mut stage = None;
        read_children(reader, header.count, "shader", |child| match child {
            Child::Property(op, r) => {
                let slot = match op {
                    Opcode::Source => &mut source,
                    Opcode::Target => &mut target,
                    Opcode::EntryPoint => &mut entry_point,
                    Opcode::Stage => &mut stage,
                    _ => return Err(unknown("shader", op)),
                };
                *slot = Some(r.read_string()?);
                Ok(())
            }
            Child::Object(op, ..) => Err(unknown("shader", op)),
        })?;

        let stage = stage.unwrap_or_else(|| kind.stage().to_string());
        if stage != kind.stage() {
            return Err(DecodeError::invalid("shader stage", stage));
        }
        let missing = |what| DecodeError::MissingField {
            object: "shader",
            what,
        };
        Ok(Shader {
            kind,
            name: header.name.clone(),
            source: source.ok_or_else(|| missing("source"))?,
            target: target.ok_or_else(|| missing("target"))?,
            entry_point: entry_point.ok_or_else(|| missing("entry_point"))?,
            stage,
        })
    }
}

fn shader_kind(header: &ObjectHeader) -> Result<ShaderKind, DecodeError> {
    Opcode::from_u16(header.opcode)
        .and_then(ShaderKind::from_opcode)
        .ok_or_else(|| DecodeError::invalid(ShaderKind::WHAT, header.opcode))
}

pub struct ShaderRefParser;

impl ObjectParser for ShaderRefParser {
    type Output = ShaderRef;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<ShaderRef, DecodeError> {
        let kind = Opcode::from_u16(header.opcode)
            .and_then(ShaderRefKind::from_opcode)
            .ok_or_else(|| DecodeError::invalid(ShaderRefKind::WHAT, header.opcode))?;
        require_name(header, "program reference")?;
        let mut params = Vec::new();
        read_children(reader, header.count, "program reference", |child| match child {
            Child::Property(op, r) => match read_param(op, r)? {
                Some(param) => {
                    params.push(param);
                    Ok(())
                }
                None => Err(unknown("program reference", op)),
            },
            Child::Object(op, ..) => Err(unknown("program reference", op)),
        })?;
        Ok(ShaderRef {
            kind,
            name: header.name.clone(),
            params,
        })
    }
}

pub struct GpuProgramRefParser;

impl ObjectParser for GpuProgramRefParser {
    type Output = GpuProgramRef;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<GpuProgramRef, DecodeError> {
        require_name(header, "gpu_program_ref")?;
        let mut cbuffer_refs = Vec::new();
        read_children(reader, header.count, "gpu_program_ref", |child| match child {
            Child::Object(Opcode::GpuCbufferRef, h, mut body) => {
                cbuffer_refs.push(ConstantBufferRefParser.parse(&mut body, &h, version)?);
                Ok(())
            }
            Child::Object(op, ..) | Child::Property(op, _) => {
                Err(unknown("gpu_program_ref", op))
            }
        })?;
        Ok(GpuProgramRef {
            name: header.name.clone(),
            cbuffer_refs,
        })
    }
}

pub struct ConstantBufferRefParser;

impl ObjectParser for ConstantBufferRefParser {
    type Output = ConstantBufferRef;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<ConstantBufferRef, DecodeError> {
        require_name(header, "gpu_cbuffer_ref")?;
        let mut slot = 0;
        read_children(reader, header.count, "gpu_cbuffer_ref", |child| match child {
            Child::Property(Opcode::Slot, r) => {
                slot = r.read_u32()?;
                Ok(())
            }
            Child::Object(op, ..) | Child::Property(op, _) => {
                Err(unknown("gpu_cbuffer_ref", op))
            }
        })?;
        Ok(ConstantBufferRef {
            name: header.name.clone(),
            slot,
        })
    }
}

/// Declares one field per parameter, then binds the initial values. A
/// layout that does not pack into 16-byte rows fails the whole buffer.
pub struct ConstantBufferParser;

impl ObjectParser for ConstantBufferParser {
    type Output = GpuConstBuffer;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<GpuConstBuffer, DecodeError> {
        require_name(header, "gpu_cbuffer")?;
        let mut buffer = GpuConstBuffer::new(&header.name);
        read_children(reader, header.count, "gpu_cbuffer", |child| match child {
            Child::Property(Opcode::SharedParamsRef, r) => {
                buffer.shared_params_ref = Some(r.read_string()?);
                Ok(())
            }
            Child::Property(op, r) => {
                let param = read_param(op, r)?.ok_or_else(|| unknown("gpu_cbuffer", op))?;
                buffer.add_declaration(param.element_type, param.slots as u32)?;
                buffer.params.push(param);
                Ok(())
            }
            Child::Object(op, ..) => Err(unknown("gpu_cbuffer", op)),
        })?;

        let data = buffer.params.iter().flat_map(ConstantParam::to_bytes).collect();
        buffer.bind_data(data)?;
        Ok(buffer)
    }
}

/// Reads a `param_*` property. Returns `None` when `op` is not one.
fn read_param(op: Opcode, r: &mut WireReader<'_>) -> Result<Option<ConstantParam>, DecodeError> {
    let key = match op {
        Opcode::ParamIndexed | Opcode::ParamIndexedAuto => ParamKey::Index(r.read_u32()?),
        Opcode::ParamNamed | Opcode::ParamNamedAuto => ParamKey::Name(r.read_string()?),
        _ => return Ok(None),
    };

    let param = if matches!(op, Opcode::ParamIndexed | Opcode::ParamNamed) {
        let element_type = read_builtin(r)?;
        let slots = r.read_u8()?;
        let value = match element_type {
            BuiltinType::Int => {
                ParamValue::Int((0..slots).map(|_| r.read_i32()).collect::<Result<_, _>>()?)
            }
            _ => ParamValue::Real((0..slots).map(|_| r.read_f32()).collect::<Result<_, _>>()?),
        };
        ConstantParam {
            key,
            element_type,
            slots,
            value,
        }
    } else {
        let code = r.read_u16()?;
        let constant =
            auto_constant(code).ok_or_else(|| DecodeError::invalid("auto constant", code))?;
        let element_type = read_builtin(r)?;
        let slots = r.read_u8()?;
        let raw = r.read_u8()?;
        let extra_type =
            BuiltinType::from_u8(raw).ok_or_else(|| DecodeError::invalid("extra type", raw))?;
        let count = r.read_u8()?;
        if count > 2 || (extra_type == BuiltinType::None && count > 0) {
            return Err(DecodeError::invalid("extra count", count));
        }
        let extras = (0..count)
            .map(|_| match extra_type {
                BuiltinType::Int => r.read_u32().map(|v| v as f32),
                _ => r.read_f32(),
            })
            .collect::<Result<_, _>>()?;
        ConstantParam {
            key,
            element_type,
            slots,
            value: ParamValue::Auto {
                constant: constant.name.to_string(),
                code,
                extra_type,
                extras,
            },
        }
    };
    Ok(Some(param))
}

fn read_builtin(r: &mut WireReader<'_>) -> Result<BuiltinType, DecodeError> {
    let raw = r.read_u8()?;
    match BuiltinType::from_u8(raw) {
        Some(BuiltinType::None) | None => Err(DecodeError::invalid("element type", raw)),
        Some(ty) => Ok(ty),
    }
}
