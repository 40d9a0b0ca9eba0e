use super::pass::read_scene_blend;
use super::sampler::read_sampler_property;
use super::{read_argc, read_children, read_enum, unknown, Child, DecodeError, ObjectParser};
use crate::opcode::Opcode;
use crate::resource::{
    ContentType, EnvMapType, FromOpcode, LayerBlend, LayerBlendOp, LayerSource, PixelFormat,
    TextureType, TextureUnit, WaveXform,
};
use crate::wire::{ObjectHeader, WireReader};

pub struct TextureUnitParser;

impl ObjectParser for TextureUnitParser {
    type Output = TextureUnit;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<TextureUnit, DecodeError> {
        let mut unit = TextureUnit::new(&header.name);
        read_children(reader, header.count, "texture_unit", |child| match child {
            Child::Property(op, r) => {
                if read_sampler_property(&mut unit.sampler, op, r)? {
                    Ok(())
                } else {
                    read_property(&mut unit, op, r)
                }
            }
            Child::Object(op, ..) => Err(unknown("texture_unit", op)),
        })?;
        Ok(unit)
    }
}

fn read_property(
    unit: &mut TextureUnit,
    op: Opcode,
    r: &mut WireReader<'_>,
) -> Result<(), DecodeError> {
    match op {
        Opcode::SamplerRef => unit.sampler_ref = Some(r.read_string()?),
        Opcode::TextureAlias => unit.texture_alias = Some(r.read_string()?),
        Opcode::Texture => read_texture(unit, r)?,
        Opcode::AnimTexture => match r.read_u8()? {
            0 => {
                let base = r.read_string()?;
                let frames = r.read_u16()?;
                let duration = r.read_f32()?;
                unit.set_animated_frames(&base, frames, duration);
            }
            1 => {
                let n = r.read_u16()?;
                unit.anim_duration = r.read_f32()?;
                unit.frames = (0..n).map(|_| r.read_string()).collect::<Result<_, _>>()?;
            }
            other => return Err(DecodeError::invalid("anim_texture form", other)),
        },
        Opcode::CubicTexture => {
            let n = r.read_u16()?;
            let frames = match n {
                2 => 1,
                7 => 6,
                _ => return Err(DecodeError::invalid("argument count", n)),
            };
            unit.frames = (0..frames).map(|_| r.read_string()).collect::<Result<_, _>>()?;
            unit.texture_type = TextureType::Cubic;
            unit.cubic_separate_uv = match r.read_opcode()? {
                Opcode::SeparateUv => true,
                Opcode::CombinedUvw if n == 2 => false,
                other => return Err(DecodeError::invalid("cubic texture layout", other)),
            };
        }
        Opcode::TexCoordSet => unit.tex_coord_set = r.read_u32()?,
        Opcode::ColourOp => {
            let (operation, source1) = match r.read_opcode()? {
                Opcode::Replace => (LayerBlendOp::Source1, LayerSource::Texture),
                Opcode::Add => (LayerBlendOp::Add, LayerSource::Texture),
                Opcode::Modulate => (LayerBlendOp::Modulate, LayerSource::Texture),
                Opcode::AlphaBlend => (LayerBlendOp::BlendTextureAlpha, LayerSource::Texture),
                other => return Err(DecodeError::invalid("colour_op", other)),
            };
            unit.colour_blend = LayerBlend::new(operation, source1, LayerSource::Current);
        }
        Opcode::ColourOpEx => unit.colour_blend = read_layer_blend(r, false)?,
        Opcode::AlphaOpEx => unit.alpha_blend = read_layer_blend(r, true)?,
        Opcode::ColourOpMultipassFallback => unit.colour_blend_fallback = read_scene_blend(r)?,
        Opcode::EnvMap => {
            let op = r.read_opcode()?;
            unit.env_map = if op == Opcode::Off {
                None
            } else {
                Some(EnvMapType::from_opcode(op).ok_or_else(|| {
                    DecodeError::invalid(EnvMapType::WHAT, op)
                })?)
            };
        }
        Opcode::Scroll => unit.scroll = [r.read_f32()?, r.read_f32()?],
        Opcode::ScrollAnim => unit.scroll_anim = [r.read_f32()?, r.read_f32()?],
        Opcode::Scale => unit.scale = [r.read_f32()?, r.read_f32()?],
        Opcode::Rotate => unit.rotate = r.read_f32()?,
        Opcode::RotateAnim => unit.rotate_anim = r.read_f32()?,
        Opcode::WaveXform => unit.wave_xforms.push(WaveXform {
            transform: read_enum(r)?,
            waveform: read_enum(r)?,
            base: r.read_f32()?,
            frequency: r.read_f32()?,
            phase: r.read_f32()?,
            amplitude: r.read_f32()?,
        }),
        Opcode::Transform => unit.transform = r.read_matrix()?,
        Opcode::BindingType => unit.binding_type = read_enum(r)?,
        Opcode::ContentType => {
            let n = read_argc(r, 1..=4)?;
            unit.content_type = match r.read_opcode()? {
                Opcode::Named => ContentType::Named,
                Opcode::Shadow => ContentType::Shadow,
                Opcode::Compositor if n >= 3 => ContentType::Compositor {
                    compositor: r.read_string()?,
                    texture: r.read_string()?,
                    mrt_index: if n == 4 { r.read_u32()? } else { 0 },
                },
                other => return Err(DecodeError::invalid("content type", other)),
            };
        }
        _ => return Err(unknown("texture_unit", op)),
    }
    Ok(())
}

fn read_texture(unit: &mut TextureUnit, r: &mut WireReader<'_>) -> Result<(), DecodeError> {
    let n = read_argc(r, 1..=5)?;
    unit.frames = vec![r.read_string()?];
    for _ in 1..n {
        match r.read_opcode()? {
            Opcode::Unspecified => unit.num_mipmaps = Some(r.read_u32()?),
            Opcode::Unlimited => unit.num_mipmaps = None,
            Opcode::Alpha => unit.is_alpha = true,
            Opcode::Gamma => unit.hardware_gamma = true,
            Opcode::PixelFormat => {
                let code = r.read_u32()?;
                unit.pixel_format = Some(
                    PixelFormat::from_code(code)
                        .ok_or_else(|| DecodeError::invalid("pixel format", code))?,
                );
            }
            other => {
                unit.texture_type = TextureType::from_opcode(other)
                    .ok_or_else(|| DecodeError::invalid(TextureType::WHAT, other))?
            }
        }
    }
    Ok(())
}

fn read_layer_blend(r: &mut WireReader<'_>, alpha: bool) -> Result<LayerBlend, DecodeError> {
    let mut blend = LayerBlend::new(read_enum(r)?, read_enum(r)?, read_enum(r)?);
    if blend.operation == LayerBlendOp::BlendManual {
        blend.factor = r.read_f32()?;
    }
    for source in [blend.source1, blend.source2] {
        if source != LayerSource::Manual {
            continue;
        }
        if alpha {
            blend.manual_alphas.push(r.read_f32()?);
        } else {
            blend.manual_colours.push(r.read_colour()?);
        }
    }
    Ok(blend)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec4};

    use super::*;
    use crate::resource::{TransformType, WaveformType};
    use crate::wire::WireWriter;

    fn decode(props: Vec<(Opcode, WireWriter)>) -> Result<TextureUnit, DecodeError> {
        let mut children = WireWriter::new();
        for (op, payload) in &props {
            children.write_property(*op, payload.as_bytes());
        }
        let mut w = WireWriter::new();
        w.write_object(Opcode::TextureUnit, "base", props.len() as u16, children.as_bytes());
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        r.read_tag()?;
        let (header, mut body) = r.read_object()?;
        TextureUnitParser.parse(&mut body, &header, 0x0100)
    }

    fn payload(write: impl FnOnce(&mut WireWriter)) -> WireWriter {
        let mut w = WireWriter::new();
        write(&mut w);
        w
    }

    #[test]
    fn texture_with_format_and_mipmaps() {
        let p = payload(|w| {
            w.write_u16(4);
            w.write_string("wall.png");
            w.write_opcode(Opcode::Tex3D);
            w.write_opcode(Opcode::Unspecified);
            w.write_u32(5);
            w.write_opcode(Opcode::PixelFormat);
            w.write_u32(PixelFormat::DXT5 as u32);
        });
        let unit = decode(vec![(Opcode::Texture, p)]).unwrap();
        assert_eq!(unit.name, "base");
        assert_eq!(unit.texture_name(), Some("wall.png"));
        assert_eq!(unit.texture_type, TextureType::Tex3D);
        assert_eq!(unit.num_mipmaps, Some(5));
        assert_eq!(unit.pixel_format, Some(PixelFormat::DXT5));
    }

    #[test]
    fn unknown_pixel_format_fails() {
        let p = payload(|w| {
            w.write_u16(2);
            w.write_string("a.png");
            w.write_opcode(Opcode::PixelFormat);
            w.write_u32(9999);
        });
        let err = decode(vec![(Opcode::Texture, p)]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { what: "pixel format", .. }));
    }

    #[test]
    fn anim_texture_short_form_expands_frames() {
        let p = payload(|w| {
            w.write_u8(0);
            w.write_string("flame.png");
            w.write_u16(2);
            w.write_f32(0.5);
        });
        let unit = decode(vec![(Opcode::AnimTexture, p)]).unwrap();
        assert_eq!(unit.frames, vec!["flame_0.png", "flame_1.png"]);
        assert_eq!(unit.anim_duration, 0.5);
    }

    #[test]
    fn manual_colour_blend() {
        let p = payload(|w| {
            w.write_opcode(Opcode::BlendManual);
            w.write_opcode(Opcode::SrcManual);
            w.write_opcode(Opcode::SrcTexture);
            w.write_f32(0.25);
            w.write_colour(Vec4::new(1.0, 0.0, 0.0, 1.0));
        });
        let unit = decode(vec![(Opcode::ColourOpEx, p)]).unwrap();
        assert_eq!(unit.colour_blend.operation, LayerBlendOp::BlendManual);
        assert_eq!(unit.colour_blend.factor, 0.25);
        assert_eq!(unit.colour_blend.manual_colours, vec![Vec4::new(1.0, 0.0, 0.0, 1.0)]);
    }

    #[test]
    fn sampler_parameters_go_to_inline_state() {
        let p = payload(|w| w.write_f32(8.0));
        let unit = decode(vec![(Opcode::MaxAnisotropy, p)]).unwrap();
        assert_eq!(unit.sampler.max_anisotropy, 8.0);
    }

    #[test]
    fn transforms() {
        let wave = payload(|w| {
            w.write_opcode(Opcode::ScrollX);
            w.write_opcode(Opcode::Sine);
            for v in [0.0, 0.25, 0.0, 1.0] {
                w.write_f32(v);
            }
        });
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let matrix = payload(|w| w.write_matrix(&m));
        let unit = decode(vec![(Opcode::WaveXform, wave), (Opcode::Transform, matrix)]).unwrap();
        assert_eq!(unit.wave_xforms[0].transform, TransformType::ScrollX);
        assert_eq!(unit.wave_xforms[0].waveform, WaveformType::Sine);
        assert_eq!(unit.transform, m);
    }

    #[test]
    fn compositor_content() {
        let p = payload(|w| {
            w.write_u16(4);
            w.write_opcode(Opcode::Compositor);
            w.write_string("Bloom");
            w.write_string("rt0");
            w.write_u32(1);
        });
        let unit = decode(vec![(Opcode::ContentType, p)]).unwrap();
        assert_eq!(
            unit.content_type,
            ContentType::Compositor {
                compositor: "Bloom".into(),
                texture: "rt0".into(),
                mrt_index: 1
            }
        );
    }
}
