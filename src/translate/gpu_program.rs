use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::resource::{find_auto_constant, BuiltinType};
use crate::script::{Diagnostic, ErrorCode};
use crate::wire::WireWriter;

pub const SHADER_KINDS: &[Opcode] = &[
    Opcode::VertexProgram,
    Opcode::FragmentProgram,
    Opcode::GeometryProgram,
    Opcode::TessellationHullProgram,
    Opcode::TessellationDomainProgram,
    Opcode::ComputeProgram,
];

pub const SHADER_STAGES: &[&str] = &["vs", "ps", "gs", "hs", "ds", "cs"];

/// Parameter type names, with their component type and component count.
const PARAM_TYPES: &[(&str, BuiltinType, u8)] = &[
    ("float", BuiltinType::Real, 1),
    ("float2", BuiltinType::Real, 2),
    ("float3", BuiltinType::Real, 3),
    ("float4", BuiltinType::Real, 4),
    ("double", BuiltinType::Real, 1),
    ("matrix2x2", BuiltinType::Real, 4),
    ("matrix2x3", BuiltinType::Real, 6),
    ("matrix2x4", BuiltinType::Real, 8),
    ("matrix3x2", BuiltinType::Real, 6),
    ("matrix3x3", BuiltinType::Real, 9),
    ("matrix3x4", BuiltinType::Real, 12),
    ("matrix4x2", BuiltinType::Real, 8),
    ("matrix4x3", BuiltinType::Real, 12),
    ("matrix4x4", BuiltinType::Real, 16),
    ("int", BuiltinType::Int, 1),
    ("int2", BuiltinType::Int, 2),
    ("int3", BuiltinType::Int, 3),
    ("int4", BuiltinType::Int, 4),
];

/// Number of 4-byte slots a field occupies: components rounded up to a
/// multiple of four.
pub fn slot_count(components: u8) -> u8 {
    components.div_ceil(4) * 4
}

pub struct GpuProgramTranslator;

impl Translator for GpuProgramTranslator {
    fn kind(&self) -> &'static str {
        "gpu_program"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn child_kinds(&self) -> &'static [Opcode] {
        SHADER_KINDS
    }

    fn property(&self, args: &Args<'_>, _out: &mut WireWriter) -> Result<(), Diagnostic> {
        Err(args.unexpected(self.kind()))
    }
}

/// One shader stage of a GPU program.
pub struct ShaderTranslator;

impl Translator for ShaderTranslator {
    fn kind(&self) -> &'static str {
        "shader"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        match args.op {
            Opcode::Source | Opcode::Target | Opcode::EntryPoint => {
                args.exactly(1)?;
                out.write_string(args.string(0)?);
            }
            Opcode::Stage => {
                args.exactly(1)?;
                let stage = args.string(0)?.to_ascii_lowercase();
                if !SHADER_STAGES.contains(&stage.as_str()) {
                    return Err(args.error(
                        ErrorCode::InvalidParameters,
                        format!("expected one of {}, received '{stage}'", SHADER_STAGES.join("|")),
                    ));
                }
                out.write_string(&stage);
            }
            _ => return Err(args.unexpected(self.kind())),
        }
        Ok(())
    }
}

/// `vertex_program_ref` and the other per-stage program references.
pub struct ShaderRefTranslator;

impl Translator for ShaderRefTranslator {
    fn kind(&self) -> &'static str {
        "program reference"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        write_param(args, out).unwrap_or_else(|| Err(args.unexpected(self.kind())))
    }
}

pub struct GpuProgramRefTranslator;

impl Translator for GpuProgramRefTranslator {
    fn kind(&self) -> &'static str {
        "gpu_program_ref"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn child_kinds(&self) -> &'static [Opcode] {
        &[Opcode::GpuCbufferRef]
    }

    fn property(&self, args: &Args<'_>, _out: &mut WireWriter) -> Result<(), Diagnostic> {
        Err(args.unexpected(self.kind()))
    }
}

pub struct ConstantBufferTranslator;

impl Translator for ConstantBufferTranslator {
    fn kind(&self) -> &'static str {
        "gpu_cbuffer"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        if args.op == Opcode::SharedParamsRef {
            args.exactly(1)?;
            out.write_string(args.string(0)?);
            return Ok(());
        }
        write_param(args, out).unwrap_or_else(|| Err(args.unexpected(self.kind())))
    }
}

pub struct ConstantBufferRefTranslator;

impl Translator for ConstantBufferRefTranslator {
    fn kind(&self) -> &'static str {
        "gpu_cbuffer_ref"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        match args.op {
            Opcode::Slot => {
                args.exactly(1)?;
                out.write_u32(args.u32(0)?);
                Ok(())
            }
            _ => Err(args.unexpected(self.kind())),
        }
    }
}

/// Encodes `param_indexed`, `param_named` and their `_auto` forms.
fn write_param(args: &Args<'_>, out: &mut WireWriter) -> Option<Result<(), Diagnostic>> {
    let result = match args.op {
        Opcode::ParamIndexed | Opcode::ParamNamed => write_param_key(args, out)
            .and_then(|()| write_param_values(args, out)),
        Opcode::ParamIndexedAuto | Opcode::ParamNamedAuto => write_param_key(args, out)
            .and_then(|()| write_auto_param(args, out)),
        _ => return None,
    };
    Some(result)
}

fn write_param_key(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    if args.len() < 2 {
        return Err(args.error(
            ErrorCode::InvalidParameters,
            "expected a name or index followed by a type",
        ));
    }
    match args.op {
        Opcode::ParamIndexed | Opcode::ParamIndexedAuto => out.write_u32(args.u32(0)?),
        _ => out.write_string(args.string(0)?),
    }
    Ok(())
}

fn write_param_values(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let type_name = args.text(1)?.to_ascii_lowercase();
    let Some(&(_, ty, components)) = PARAM_TYPES.iter().find(|(n, _, _)| *n == type_name) else {
        return Err(args.error(
            ErrorCode::InvalidParameters,
            format!("unknown parameter type '{type_name}'"),
        ));
    };
    let given = args.len() - 2;
    if given > components as usize {
        return Err(args.error(
            ErrorCode::FewerParametersExpected,
            format!("{type_name} takes at most {components} values, received {given}"),
        ));
    }

    let slots = slot_count(components);
    out.write_u8(ty as u8);
    out.write_u8(slots);
    for i in 0..slots as usize {
        let present = i < given;
        match ty {
            BuiltinType::Int => out.write_i32(if present { args.i32(i + 2)? } else { 0 }),
            _ => out.write_f32(if present { args.f32(i + 2)? } else { 0.0 }),
        }
    }
    Ok(())
}

fn write_auto_param(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let name = args.text(1)?;
    let Some((code, constant)) = find_auto_constant(name) else {
        return Err(args.error(
            ErrorCode::InvalidParameters,
            format!("unknown auto constant '{name}'"),
        ));
    };
    let extras = args.len() - 2;
    let max_extras = if constant.extra_type == BuiltinType::None { 0 } else { 2 };
    if extras > max_extras {
        return Err(args.error(
            ErrorCode::FewerParametersExpected,
            format!("{} takes at most {max_extras} extra values, received {extras}", constant.name),
        ));
    }

    out.write_u16(code);
    out.write_u8(constant.element_type as u8);
    out.write_u8(slot_count(constant.elements));
    out.write_u8(constant.extra_type as u8);
    out.write_u8(extras as u8);
    for i in 2..args.len() {
        match constant.extra_type {
            BuiltinType::Int => out.write_u32(args.u32(i)?),
            _ => out.write_f32(args.f32(i)?),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::translate::tests::{property_payload, translate};
    use crate::wire::{NodeTag, WireReader};

    fn cbuffer(lines: &str) -> String {
        format!("gpu_cbuffer Globals\n{{\n{lines}\n}}\n")
    }

    #[test]
    fn slot_rounding() {
        assert_eq!(slot_count(1), 4);
        assert_eq!(slot_count(4), 4);
        assert_eq!(slot_count(9), 12);
        assert_eq!(slot_count(16), 16);
    }

    #[test]
    fn named_param_is_zero_filled() {
        let (op, p) = property_payload(&cbuffer("param_named tint float3 1 0.5"), 0).unwrap();
        assert_eq!(op, Opcode::ParamNamed);
        assert_eq!(&p[0..6], &[4, 0, b't', b'i', b'n', b't']);
        assert_eq!(p[6], BuiltinType::Real as u8);
        assert_eq!(p[7], 4);
        let floats: Vec<f32> = p[8..].chunks(4).map(LittleEndian::read_f32).collect();
        assert_eq!(floats, vec![1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn indexed_int_param() {
        let (_, p) = property_payload(&cbuffer("param_indexed 2 int2 7 -1"), 0).unwrap();
        assert_eq!(LittleEndian::read_u32(&p[0..4]), 2);
        assert_eq!(p[4], BuiltinType::Int as u8);
        assert_eq!(p[5], 4);
        assert_eq!(LittleEndian::read_i32(&p[6..10]), 7);
        assert_eq!(LittleEndian::read_i32(&p[10..14]), -1);
    }

    #[test]
    fn too_many_values() {
        let (_, diags) = translate(&cbuffer("param_named v float2 1 2 3"));
        assert_eq!(diags[0].code, ErrorCode::FewerParametersExpected);
    }

    #[test]
    fn auto_param_with_extra() {
        let (_, p) = property_payload(&cbuffer("param_named_auto lightPos light_position 1"), 0).unwrap();
        let after_name = 2 + "lightPos".len();
        let code = find_auto_constant("light_position").unwrap().0;
        assert_eq!(LittleEndian::read_u16(&p[after_name..]), code);
        assert_eq!(&p[after_name + 2..after_name + 6], &[1, 4, 2, 1]);
        assert_eq!(LittleEndian::read_u32(&p[after_name + 6..]), 1);
    }

    #[test]
    fn auto_param_camera_position_rounds_up() {
        let (_, p) = property_payload(&cbuffer("param_indexed_auto 0 camera_position"), 0).unwrap();
        assert_eq!(&p[6..10], &[1, 4, 0, 0]);
    }

    #[test]
    fn auto_param_rejects_unexpected_extras() {
        let (_, diags) = translate(&cbuffer("param_named_auto wvp worldviewproj_matrix 3"));
        assert_eq!(diags[0].code, ErrorCode::FewerParametersExpected);
    }

    #[test]
    fn shader_stage_is_validated() {
        let src = "gpu_program Prog\n{\n  vertex_program VS\n  {\n    stage xs\n  }\n}\n";
        let (_, diags) = translate(src);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("vs|ps|gs|hs|ds|cs"));
    }

    #[test]
    fn program_ref_with_cbuffer_slot() {
        let src = "material M\n{\n  technique\n  {\n    pass\n    {\n      gpu_program_ref Prog\n      {\n        gpu_cbuffer_ref Globals\n        {\n          slot 2\n        }\n      }\n    }\n  }\n}\n";
        let (op, p) = property_payload(src, 4).unwrap();
        assert_eq!(op, Opcode::Slot);
        assert_eq!(p, [2, 0, 0, 0]);
    }

    #[test]
    fn gpu_program_holds_shaders() {
        let src = "gpu_program Prog\n{\n  vertex_program VS\n  {\n    source a.hlsl\n    target vs_5_0\n    entry_point main\n  }\n}\n";
        let (bytes, diags) = translate(src);
        assert!(diags.is_empty());
        let mut r = WireReader::new(&bytes);
        r.read_tag().unwrap();
        let (header, mut body) = r.read_object().unwrap();
        assert_eq!(header.opcode, Opcode::GpuProgram.as_u16());
        assert_eq!(header.count, 1);
        assert_eq!(body.read_tag().unwrap(), NodeTag::Object);
        let (shader, _) = body.read_object().unwrap();
        assert_eq!(shader.opcode, Opcode::VertexProgram.as_u16());
        assert_eq!(shader.name, "VS");
        assert_eq!(shader.count, 3);
    }
}
