use super::gpu_program::{GpuProgramRefParser, ShaderRefParser};
use super::texture_unit::TextureUnitParser;
use super::{
    read_argc, read_children, read_enum, read_optional, unknown, Child, DecodeError, ObjectParser,
};
use crate::opcode::Opcode;
use crate::resource::{
    ColourSource, FogOverride, FromOpcode, Iteration, LightType, Pass, SceneBlend, ShaderRefKind,
    TransparentSorting,
};
use crate::wire::{ObjectHeader, WireReader};

pub struct PassParser;

impl ObjectParser for PassParser {
    type Output = Pass;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<Pass, DecodeError> {
        let mut pass = Pass::new(&header.name);

        read_children(reader, header.count, "pass", |child| {
            match child {
                Child::Property(op, r) => read_property(&mut pass, op, r)?,
                Child::Object(Opcode::TextureUnit, h, mut body) => pass
                    .texture_units
                    .push(TextureUnitParser.parse(&mut body, &h, version)?),
                Child::Object(Opcode::GpuProgramRef, h, mut body) => {
                    pass.gpu_program_ref = Some(GpuProgramRefParser.parse(&mut body, &h, version)?)
                }
                Child::Object(op, h, mut body) if ShaderRefKind::from_opcode(op).is_some() => pass
                    .shader_refs
                    .push(ShaderRefParser.parse(&mut body, &h, version)?),
                Child::Object(op, ..) => return Err(unknown("pass", op)),
            }
            Ok(())
        })?;
        Ok(pass)
    }
}

fn read_property(pass: &mut Pass, op: Opcode, r: &mut WireReader<'_>) -> Result<(), DecodeError> {
    match op {
        Opcode::Ambient => pass.ambient = read_colour_source(r)?,
        Opcode::Diffuse => pass.diffuse = read_colour_source(r)?,
        Opcode::Emissive => pass.emissive = read_colour_source(r)?,
        Opcode::Specular => {
            pass.specular = read_colour_source(r)?;
            pass.shininess = r.read_f32()?;
        }
        Opcode::SceneBlend => {
            pass.scene_blend = read_scene_blend(r)?;
            pass.alpha_blend = None;
        }
        Opcode::SeparateSceneBlend => {
            match r.read_u16()? {
                2 => {
                    pass.scene_blend = SceneBlend::Mode(read_enum(r)?);
                    pass.alpha_blend = Some(SceneBlend::Mode(read_enum(r)?));
                }
                4 => {
                    pass.scene_blend = SceneBlend::Factors {
                        source: read_enum(r)?,
                        dest: read_enum(r)?,
                    };
                    pass.alpha_blend = Some(SceneBlend::Factors {
                        source: read_enum(r)?,
                        dest: read_enum(r)?,
                    });
                }
                n => return Err(DecodeError::invalid("argument count", n)),
            }
        }
        Opcode::SceneBlendOp => {
            pass.blend_op = read_enum(r)?;
            pass.alpha_blend_op = pass.blend_op;
        }
        Opcode::SeparateSceneBlendOp => {
            pass.blend_op = read_enum(r)?;
            pass.alpha_blend_op = read_enum(r)?;
        }
        Opcode::DepthCheck => pass.depth_check = r.read_bool()?,
        Opcode::DepthWrite => pass.depth_write = r.read_bool()?,
        Opcode::AlphaToCoverage => pass.alpha_to_coverage = r.read_bool()?,
        Opcode::LightScissor => pass.light_scissor = r.read_bool()?,
        Opcode::LightClipPlanes => pass.light_clip_planes = r.read_bool()?,
        Opcode::NormaliseNormals => pass.normalise_normals = r.read_bool()?,
        Opcode::Lighting => pass.lighting = r.read_bool()?,
        Opcode::PolygonModeOverrideable => pass.polygon_mode_overrideable = r.read_bool()?,
        Opcode::ColourWrite => pass.colour_write = r.read_bool()?,
        Opcode::PointSprites => pass.point_sprites = r.read_bool()?,
        Opcode::DepthFunc => pass.depth_func = read_enum(r)?,
        Opcode::DepthBias => {
            let n = read_argc(r, 1..=2)?;
            pass.depth_bias_constant = r.read_f32()?;
            pass.depth_bias_slope_scale = if n == 2 { r.read_f32()? } else { 0.0 };
        }
        Opcode::IterationDepthBias => pass.iteration_depth_bias = r.read_f32()?,
        Opcode::AlphaRejection => {
            let n = read_argc(r, 1..=2)?;
            pass.alpha_reject_func = read_enum(r)?;
            if n == 2 {
                let value = r.read_u32()?;
                pass.alpha_reject_value = u8::try_from(value)
                    .map_err(|_| DecodeError::invalid("alpha rejection value", value))?;
            }
        }
        Opcode::TransparentSorting => {
            pass.transparent_sorting = match r.read_u8()? {
                0 => TransparentSorting::Off,
                1 => TransparentSorting::On,
                2 => TransparentSorting::Force,
                other => return Err(DecodeError::invalid("transparent sorting", other)),
            }
        }
        Opcode::IlluminationStage => pass.illumination_stage = Some(read_enum(r)?),
        Opcode::CullHardware => pass.cull_hardware = read_enum(r)?,
        Opcode::CullSoftware => pass.cull_software = read_enum(r)?,
        Opcode::Shading => pass.shading = read_enum(r)?,
        Opcode::PolygonMode => pass.polygon_mode = read_enum(r)?,
        Opcode::FogOverride => pass.fog = read_fog_override(r)?,
        Opcode::MaxLights => pass.max_lights = r.read_u32()?,
        Opcode::StartLight => pass.start_light = r.read_u32()?,
        Opcode::LightMask => pass.light_mask = r.read_u32()?,
        Opcode::Iteration => pass.iteration = read_iteration(r)?,
        Opcode::PointSize => pass.point_size = r.read_f32()?,
        Opcode::PointSizeMin => pass.point_size_min = r.read_f32()?,
        Opcode::PointSizeMax => pass.point_size_max = r.read_f32()?,
        Opcode::LineWidth => pass.line_width = r.read_f32()?,
        Opcode::PointSizeAttenuation => {
            let n = read_argc(r, 1..=4)?;
            let on = r.read_bool()?;
            pass.point_attenuation = match (on, n) {
                (true, 4) => Some([r.read_f32()?, r.read_f32()?, r.read_f32()?]),
                (true, 1) => Some([1.0, 0.0, 0.0]),
                (false, 1) => None,
                _ => return Err(DecodeError::invalid("argument count", n)),
            };
        }
        _ => return Err(unknown("pass", op)),
    }
    Ok(())
}

fn read_colour_source(r: &mut WireReader<'_>) -> Result<ColourSource, DecodeError> {
    match r.read_opcode()? {
        Opcode::VertexColour => Ok(ColourSource::VertexColour),
        Opcode::Unspecified => Ok(ColourSource::Fixed(r.read_colour()?)),
        other => Err(DecodeError::invalid("colour source", other)),
    }
}

/// argc, then a blend mode or two factors.
pub(super) fn read_scene_blend(r: &mut WireReader<'_>) -> Result<SceneBlend, DecodeError> {
    if read_argc(r, 1..=2)? == 1 {
        Ok(SceneBlend::Mode(read_enum(r)?))
    } else {
        Ok(SceneBlend::Factors {
            source: read_enum(r)?,
            dest: read_enum(r)?,
        })
    }
}

fn read_fog_override(r: &mut WireReader<'_>) -> Result<FogOverride, DecodeError> {
    let n = r.read_u16()?;
    if ![1, 2, 5, 6, 7, 8].contains(&n) {
        return Err(DecodeError::invalid("argument count", n));
    }
    let mut fog = FogOverride {
        enabled: r.read_bool()?,
        ..FogOverride::default()
    };
    if n >= 2 {
        fog.mode = read_enum(r)?;
    }
    if n >= 5 {
        fog.colour = r.read_colour()?;
    }
    if n >= 6 {
        fog.density = r.read_f32()?;
    }
    if n >= 7 {
        fog.start = r.read_f32()?;
    }
    if n >= 8 {
        fog.end = r.read_f32()?;
    }
    Ok(fog)
}

fn read_iteration(r: &mut WireReader<'_>) -> Result<Iteration, DecodeError> {
    read_argc(r, 1..=5)?;
    let mut iteration = Iteration::default();
    match r.read_opcode()? {
        Opcode::Once => {}
        Opcode::OncePerLight => {
            iteration.per_light = true;
            iteration.only_light_type = read_optional::<LightType>(r)?;
        }
        Opcode::Unspecified => {
            iteration.count = r.read_i32()?;
            match r.read_opcode()? {
                Opcode::Unspecified => {}
                Opcode::PerLight => {
                    iteration.per_light = true;
                    iteration.only_light_type = read_optional(r)?;
                }
                Opcode::PerNLights => {
                    iteration.per_light = true;
                    iteration.lights_per_iteration = r.read_i32()?;
                    iteration.only_light_type = read_optional(r)?;
                }
                other => return Err(DecodeError::invalid("iteration", other)),
            }
        }
        other => return Err(DecodeError::invalid("iteration", other)),
    }
    Ok(iteration)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use glam::Vec4;

    use super::*;
    use crate::resource::{BlendFactor, CompareFunction, FogMode, SceneBlendType};
    use crate::wire::WireWriter;

    fn decode(props: &[(Opcode, WireWriter)]) -> Result<Pass, DecodeError> {
        let mut children = WireWriter::new();
        for (op, payload) in props {
            children.write_property(*op, payload.as_bytes());
        }
        let mut w = WireWriter::new();
        w.write_object(Opcode::Pass, "", props.len() as u16, children.as_bytes());
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        r.read_tag()?;
        let (header, mut body) = r.read_object()?;
        PassParser.parse(&mut body, &header, 0x0100)
    }

    fn payload(write: impl FnOnce(&mut WireWriter)) -> WireWriter {
        let mut w = WireWriter::new();
        write(&mut w);
        w
    }

    #[test]
    fn ambient_comes_back_rgba() {
        let p = payload(|w| {
            w.write_opcode(Opcode::Unspecified);
            w.write_colour(Vec4::new(0.1, 0.2, 0.3, 1.0));
        });
        let pass = decode(&[(Opcode::Ambient, p)]).unwrap();
        assert_eq!(pass.ambient, ColourSource::Fixed(Vec4::new(0.1, 0.2, 0.3, 1.0)));
    }

    #[test]
    fn blend_factors() {
        let p = payload(|w| {
            w.write_u16(2);
            w.write_opcode(Opcode::SrcAlpha);
            w.write_opcode(Opcode::OneMinusSrcAlpha);
        });
        let pass = decode(&[(Opcode::SceneBlend, p)]).unwrap();
        assert_eq!(
            pass.scene_blend.factors(),
            (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
        );
    }

    #[test]
    fn blend_mode_out_of_domain() {
        let p = payload(|w| {
            w.write_u16(1);
            w.write_opcode(Opcode::Less);
        });
        let err = decode(&[(Opcode::SceneBlend, p)]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { what: "blend mode", .. }));
    }

    #[test]
    fn fog_defaults_fill_missing_fields() {
        let p = payload(|w| {
            w.write_u16(6);
            w.write_bool(true);
            w.write_opcode(Opcode::Exp);
            w.write_colour(Vec4::new(0.5, 0.5, 0.5, 1.0));
            w.write_f32(0.02);
        });
        let pass = decode(&[(Opcode::FogOverride, p)]).unwrap();
        assert!(pass.fog.enabled);
        assert_eq!(pass.fog.mode, FogMode::Exp);
        assert_approx_eq!(pass.fog.density, 0.02);
        assert_eq!(pass.fog.start, 0.0);
        assert_eq!(pass.fog.end, 1.0);
    }

    #[test]
    fn iteration_per_n_lights() {
        let p = payload(|w| {
            w.write_u16(4);
            w.write_opcode(Opcode::Unspecified);
            w.write_i32(2);
            w.write_opcode(Opcode::PerNLights);
            w.write_i32(3);
            w.write_opcode(Opcode::Unspecified);
        });
        let pass = decode(&[(Opcode::Iteration, p)]).unwrap();
        assert_eq!(pass.iteration.count, 2);
        assert!(pass.iteration.per_light);
        assert_eq!(pass.iteration.lights_per_iteration, 3);
        assert_eq!(pass.iteration.only_light_type, None);
    }

    #[test]
    fn alpha_rejection_and_depth() {
        let reject = payload(|w| {
            w.write_u16(2);
            w.write_opcode(Opcode::Greater);
            w.write_u32(128);
        });
        let depth = payload(|w| {
            w.write_u16(2);
            w.write_f32(0.5);
            w.write_f32(0.1);
        });
        let pass = decode(&[(Opcode::AlphaRejection, reject), (Opcode::DepthBias, depth)]).unwrap();
        assert_eq!(pass.alpha_reject_func, CompareFunction::Greater);
        assert_eq!(pass.alpha_reject_value, 128);
        assert_approx_eq!(pass.depth_bias_slope_scale, 0.1);
    }

    #[test]
    fn separate_blend_modes() {
        let p = payload(|w| {
            w.write_u16(2);
            w.write_opcode(Opcode::Add);
            w.write_opcode(Opcode::AlphaBlend);
        });
        let pass = decode(&[(Opcode::SeparateSceneBlend, p)]).unwrap();
        assert_eq!(pass.scene_blend, SceneBlend::Mode(SceneBlendType::Add));
        assert_eq!(pass.alpha_blend, Some(SceneBlend::Mode(SceneBlendType::AlphaBlend)));
    }

    #[test]
    fn unknown_property_fails_the_pass() {
        let err = decode(&[(Opcode::Scroll, WireWriter::new())]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOpcode { object: "pass", .. }));
    }
}
