use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::script::{Diagnostic, ErrorCode};
use crate::wire::WireWriter;

pub const BLEND_MODES: &[Opcode] = &[
    Opcode::Add,
    Opcode::Modulate,
    Opcode::ColourBlend,
    Opcode::AlphaBlend,
];

pub const BLEND_OPS: &[Opcode] = &[
    Opcode::Add,
    Opcode::Subtract,
    Opcode::ReverseSubtract,
    Opcode::Min,
    Opcode::Max,
];

pub const COMPARE_FUNCTIONS: &[Opcode] = &[
    Opcode::AlwaysFail,
    Opcode::AlwaysPass,
    Opcode::LessEqual,
    Opcode::Less,
    Opcode::Equal,
    Opcode::NotEqual,
    Opcode::GreaterEqual,
    Opcode::Greater,
];

const FOG_MODES: &[Opcode] = &[Opcode::None, Opcode::Linear, Opcode::Exp, Opcode::Exp2];

const LIGHT_TYPES: &[Opcode] = &[Opcode::Point, Opcode::Directional, Opcode::Spot];

pub struct PassTranslator;

impl Translator for PassTranslator {
    fn kind(&self) -> &'static str {
        "pass"
    }

    fn child_kinds(&self) -> &'static [Opcode] {
        &[
            Opcode::TextureUnit,
            Opcode::GpuProgramRef,
            Opcode::VertexProgramRef,
            Opcode::FragmentProgramRef,
            Opcode::GeometryProgramRef,
            Opcode::TessellationHullProgramRef,
            Opcode::TessellationDomainProgramRef,
            Opcode::ComputeProgramRef,
            Opcode::ShadowCasterVertexProgramRef,
            Opcode::ShadowCasterFragmentProgramRef,
            Opcode::ShadowReceiverVertexProgramRef,
            Opcode::ShadowReceiverFragmentProgramRef,
        ]
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        match args.op {
            Opcode::Ambient | Opcode::Diffuse | Opcode::Emissive => write_colour(args, out)?,
            Opcode::Specular => write_specular(args, out)?,
            Opcode::SceneBlend => {
                args.arity(1, 2)?;
                write_blend(args, out)?;
            }
            Opcode::SeparateSceneBlend => {
                let n = args.arity_in(&[2, 4])?;
                out.write_u16(n as u16);
                if n == 2 {
                    out.write_opcode(args.one_of(0, BLEND_MODES)?);
                    out.write_opcode(args.one_of(1, BLEND_MODES)?);
                } else {
                    for i in 0..4 {
                        out.write_opcode(blend_factor(args, i)?);
                    }
                }
            }
            Opcode::SceneBlendOp => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, BLEND_OPS)?);
            }
            Opcode::SeparateSceneBlendOp => {
                args.exactly(2)?;
                out.write_opcode(args.one_of(0, BLEND_OPS)?);
                out.write_opcode(args.one_of(1, BLEND_OPS)?);
            }
            Opcode::DepthCheck
            | Opcode::DepthWrite
            | Opcode::AlphaToCoverage
            | Opcode::LightScissor
            | Opcode::LightClipPlanes
            | Opcode::NormaliseNormals
            | Opcode::Lighting
            | Opcode::PolygonModeOverrideable
            | Opcode::ColourWrite
            | Opcode::PointSprites => {
                args.exactly(1)?;
                out.write_bool(args.bool(0)?);
            }
            Opcode::DepthFunc => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, COMPARE_FUNCTIONS)?);
            }
            Opcode::DepthBias => {
                let n = args.arity(1, 2)?;
                out.write_u16(n as u16);
                for i in 0..n {
                    out.write_f32(args.f32(i)?);
                }
            }
            Opcode::IterationDepthBias
            | Opcode::PointSize
            | Opcode::PointSizeMin
            | Opcode::PointSizeMax
            | Opcode::LineWidth => {
                args.exactly(1)?;
                out.write_f32(args.f32(0)?);
            }
            Opcode::AlphaRejection => {
                let n = args.arity(1, 2)?;
                out.write_u16(n as u16);
                out.write_opcode(args.one_of(0, COMPARE_FUNCTIONS)?);
                if n == 2 {
                    let value = args.u32(1)?;
                    if value > 255 {
                        return Err(args.error(
                            ErrorCode::InvalidParameters,
                            format!("expected a value in 0..=255, received {value}"),
                        ));
                    }
                    out.write_u32(value);
                }
            }
            Opcode::TransparentSorting => {
                args.exactly(1)?;
                let mode = if args.text(0)?.eq_ignore_ascii_case("force") {
                    2
                } else {
                    u8::from(args.bool(0)?)
                };
                out.write_u8(mode);
            }
            Opcode::IlluminationStage => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, &[Opcode::Ambient, Opcode::PerLight, Opcode::Decal])?);
            }
            Opcode::CullHardware => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(
                    0,
                    &[Opcode::Clockwise, Opcode::Anticlockwise, Opcode::None],
                )?);
            }
            Opcode::CullSoftware => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, &[Opcode::Front, Opcode::Back, Opcode::None])?);
            }
            Opcode::Shading => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, &[Opcode::Flat, Opcode::Gouraud, Opcode::Phong])?);
            }
            Opcode::PolygonMode => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(
                    0,
                    &[Opcode::Solid, Opcode::Wireframe, Opcode::Points],
                )?);
            }
            Opcode::FogOverride => write_fog_override(args, out)?,
            Opcode::MaxLights | Opcode::StartLight | Opcode::LightMask => {
                args.exactly(1)?;
                out.write_u32(args.u32(0)?);
            }
            Opcode::Iteration => write_iteration(args, out)?,
            Opcode::PointSizeAttenuation => {
                let n = args.arity_in(&[1, 4])?;
                let on = args.bool(0)?;
                if n == 4 && !on {
                    return Err(args.error(
                        ErrorCode::InvalidParameters,
                        "attenuation factors are only allowed when enabled",
                    ));
                }
                out.write_u16(n as u16);
                out.write_bool(on);
                if n == 4 {
                    for i in 1..4 {
                        out.write_f32(args.f32(i)?);
                    }
                }
            }
            _ => return Err(args.unexpected(self.kind())),
        }
        Ok(())
    }
}

/// `vertexcolour` alone, or `0` followed by a colour.
fn write_colour(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 4)?;
    if n == 1 && args.opcode(0)? == Opcode::VertexColour {
        out.write_opcode(Opcode::VertexColour);
        return Ok(());
    }
    if n < 3 {
        return Err(args.error(
            ErrorCode::InvalidParameters,
            format!("expected vertexcolour or 3 to 4 colour components, received {n} arguments"),
        ));
    }
    let colour = args.colour(0, n)?;
    out.write_opcode(Opcode::Unspecified);
    out.write_colour(colour);
    Ok(())
}

fn write_specular(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 5)?;
    if args.opcode(0)? == Opcode::VertexColour {
        if n > 2 {
            return Err(args.error(
                ErrorCode::FewerParametersExpected,
                format!("expected vertexcolour and an optional shininess, received {n} arguments"),
            ));
        }
        let shininess = if n == 2 { args.f32(1)? } else { 0.0 };
        out.write_opcode(Opcode::VertexColour);
        out.write_f32(shininess);
        return Ok(());
    }
    if n < 4 {
        return Err(args.error(
            ErrorCode::InvalidParameters,
            format!("expected a colour and shininess, received {n} arguments"),
        ));
    }
    let colour = args.colour(0, n - 1)?;
    out.write_opcode(Opcode::Unspecified);
    out.write_colour(colour);
    out.write_f32(args.f32(n - 1)?);
    Ok(())
}

fn blend_factor(args: &Args<'_>, i: usize) -> Result<Opcode, Diagnostic> {
    let op = args.opcode(i)?;
    if op.is_blend_factor() {
        Ok(op)
    } else {
        Err(args.error(
            ErrorCode::InvalidParameters,
            format!("expected a blend factor, received '{}'", args.text(i)?),
        ))
    }
}

/// argc, then a blend mode or a source and destination factor.
pub(super) fn write_blend(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 2)?;
    out.write_u16(n as u16);
    if n == 1 {
        out.write_opcode(args.one_of(0, BLEND_MODES)?);
    } else {
        out.write_opcode(blend_factor(args, 0)?);
        out.write_opcode(blend_factor(args, 1)?);
    }
    Ok(())
}

fn write_fog_override(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity_in(&[1, 2, 5, 6, 7, 8])?;
    out.write_u16(n as u16);
    out.write_bool(args.bool(0)?);
    if n >= 2 {
        out.write_opcode(args.one_of(1, FOG_MODES)?);
    }
    if n >= 5 {
        out.write_colour(args.colour(2, 3)?);
    }
    for i in 5..n {
        out.write_f32(args.f32(i)?);
    }
    Ok(())
}

/// `once`, `once_per_light [type]` or `N [per_light|per_n_lights [n]] [type]`.
fn write_iteration(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 5)?;
    out.write_u16(n as u16);
    match args.opcode(0)? {
        Opcode::Once => {
            args.exactly(1)?;
            out.write_opcode(Opcode::Once);
        }
        Opcode::OncePerLight => {
            args.arity(1, 2)?;
            out.write_opcode(Opcode::OncePerLight);
            if n == 2 {
                out.write_opcode(args.one_of(1, LIGHT_TYPES)?);
            } else {
                out.write_opcode(Opcode::Unspecified);
            }
        }
        _ => {
            let count = args.i32(0)?;
            out.write_opcode(Opcode::Unspecified);
            out.write_i32(count);
            if n == 1 {
                out.write_opcode(Opcode::Unspecified);
                return Ok(());
            }
            let per = args.one_of(1, &[Opcode::PerLight, Opcode::PerNLights])?;
            out.write_opcode(per);
            let mut next = 2;
            if per == Opcode::PerNLights {
                out.write_i32(args.i32(2)?);
                next = 3;
            }
            if n > next + 1 {
                return Err(args.error(
                    ErrorCode::FewerParametersExpected,
                    format!("unexpected argument '{}'", args.text(next + 1)?),
                ));
            }
            if n == next + 1 {
                out.write_opcode(args.one_of(next, LIGHT_TYPES)?);
            } else {
                out.write_opcode(Opcode::Unspecified);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::translate::tests::{in_pass, property_payload, translate};

    fn payload(line: &str) -> Vec<u8> {
        let (_, payload) = property_payload(&in_pass(line), 2).unwrap();
        payload
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks(4).map(LittleEndian::read_f32).collect()
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        LittleEndian::read_u16(&bytes[at..at + 2])
    }

    #[test]
    fn ambient_colour_is_written_bgra() {
        let p = payload("ambient 0.1 0.2 0.3");
        assert_eq!(u16_at(&p, 0), 0);
        assert_eq!(floats(&p[2..]), vec![0.3, 0.2, 0.1, 1.0]);
    }

    #[test]
    fn ambient_vertex_colour_is_opcode_only() {
        let p = payload("ambient vertexcolour");
        assert_eq!(p.len(), 2);
        assert_eq!(u16_at(&p, 0), Opcode::VertexColour.as_u16());
    }

    #[test]
    fn ambient_needs_three_components() {
        let (_, diags) = translate(&in_pass("ambient 0.1 0.2"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::InvalidParameters);
    }

    #[test]
    fn specular_forms() {
        let p = payload("specular 1 0 0 32");
        assert_eq!(u16_at(&p, 0), 0);
        assert_eq!(floats(&p[2..]), vec![0.0, 0.0, 1.0, 1.0, 32.0]);

        let p = payload("specular 1 0 0 0.5 16");
        assert_eq!(floats(&p[2..]), vec![0.0, 0.0, 1.0, 0.5, 16.0]);

        let p = payload("specular vertexcolour");
        assert_eq!(u16_at(&p, 0), Opcode::VertexColour.as_u16());
        assert_eq!(floats(&p[2..]), vec![0.0]);
    }

    #[test]
    fn depth_bias_carries_argc() {
        let p = payload("depth_bias 0.5");
        assert_eq!(u16_at(&p, 0), 1);
        assert_eq!(floats(&p[2..]), vec![0.5]);

        let p = payload("depth_bias 0.5 0.1");
        assert_eq!(u16_at(&p, 0), 2);
        assert_eq!(floats(&p[2..]), vec![0.5, 0.1]);
    }

    #[test]
    fn depth_bias_arity_is_enforced() {
        let (bytes, diags) = translate(&in_pass("depth_bias 1 2 3"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::FewerParametersExpected);
        let (clean, _) = translate(&in_pass(""));
        assert_eq!(bytes, clean);
    }

    #[test]
    fn scene_blend_mode_and_factors() {
        let p = payload("scene_blend add");
        assert_eq!(p.len(), 4);
        assert_eq!(u16_at(&p, 0), 1);
        assert_eq!(u16_at(&p, 2), Opcode::Add.as_u16());

        let p = payload("scene_blend src_alpha one_minus_src_alpha");
        assert_eq!(p.len(), 6);
        assert_eq!(u16_at(&p, 0), 2);
        assert_eq!(u16_at(&p, 2), Opcode::SrcAlpha.as_u16());
        assert_eq!(u16_at(&p, 4), Opcode::OneMinusSrcAlpha.as_u16());
    }

    #[test]
    fn scene_blend_rejects_non_factor() {
        let (_, diags) = translate(&in_pass("scene_blend add src_alpha"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn transparent_sorting_force() {
        assert_eq!(payload("transparent_sorting force"), vec![2]);
        assert_eq!(payload("transparent_sorting on"), vec![1]);
    }

    #[test]
    fn alpha_rejection_value_range() {
        let p = payload("alpha_rejection greater 128");
        assert_eq!(u16_at(&p, 0), 2);
        assert_eq!(u16_at(&p, 2), Opcode::Greater.as_u16());
        assert_eq!(LittleEndian::read_u32(&p[4..8]), 128);
        let (_, diags) = translate(&in_pass("alpha_rejection greater 300"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn fog_override_full() {
        let p = payload("fog_override on exp 1 0.5 0 0.01 10 100");
        assert_eq!(u16_at(&p, 0), 8);
        assert_eq!(p[2], 1);
        assert_eq!(u16_at(&p, 3), Opcode::Exp.as_u16());
        assert_eq!(floats(&p[5..]), vec![0.0, 0.5, 1.0, 1.0, 0.01, 10.0, 100.0]);
    }

    #[test]
    fn fog_override_arity() {
        let (_, diags) = translate(&in_pass("fog_override on exp 1"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn iteration_forms() {
        let p = payload("iteration once");
        assert_eq!(u16_at(&p, 0), 1);
        assert_eq!(u16_at(&p, 2), Opcode::Once.as_u16());
        assert_eq!(p.len(), 4);

        let p = payload("iteration once_per_light point");
        assert_eq!(u16_at(&p, 2), Opcode::OncePerLight.as_u16());
        assert_eq!(u16_at(&p, 4), Opcode::Point.as_u16());

        let p = payload("iteration 2 per_n_lights 3 spot");
        assert_eq!(u16_at(&p, 0), 4);
        assert_eq!(u16_at(&p, 2), 0);
        assert_eq!(LittleEndian::read_i32(&p[4..8]), 2);
        assert_eq!(u16_at(&p, 8), Opcode::PerNLights.as_u16());
        assert_eq!(LittleEndian::read_i32(&p[10..14]), 3);
        assert_eq!(u16_at(&p, 14), Opcode::Spot.as_u16());

        let p = payload("iteration 4");
        assert_eq!(p.len(), 10);
        assert_eq!(u16_at(&p, 8), 0);
    }

    #[test]
    fn point_size_attenuation() {
        let p = payload("point_size_attenuation on 1 0 0.5");
        assert_eq!(u16_at(&p, 0), 4);
        assert_eq!(p[2], 1);
        assert_eq!(floats(&p[3..]), vec![1.0, 0.0, 0.5]);
        let (_, diags) = translate(&in_pass("point_size_attenuation on 1"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn enumerations_are_checked() {
        let (_, diags) = translate(&in_pass("shading smooth\ncull_hardware none"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("shading"));
    }
}
