use glam::Mat4;

use super::pass::write_blend;
use super::sampler::write_sampler_property;
use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::resource::PixelFormat;
use crate::script::{Diagnostic, ErrorCode};
use crate::wire::WireWriter;

const TEXTURE_TYPES: &[Opcode] = &[
    Opcode::Tex1D,
    Opcode::Tex2D,
    Opcode::Tex3D,
    Opcode::Cubic,
    Opcode::Tex2DArray,
    Opcode::Unlimited,
    Opcode::Alpha,
    Opcode::Gamma,
];

const LAYER_OPS: &[Opcode] = &[
    Opcode::Source1,
    Opcode::Source2,
    Opcode::Modulate,
    Opcode::ModulateX2,
    Opcode::ModulateX4,
    Opcode::Add,
    Opcode::AddSigned,
    Opcode::AddSmooth,
    Opcode::Subtract,
    Opcode::BlendDiffuseAlpha,
    Opcode::BlendTextureAlpha,
    Opcode::BlendCurrentAlpha,
    Opcode::BlendManual,
    Opcode::DotProduct,
    Opcode::BlendDiffuseColour,
];

const LAYER_SOURCES: &[Opcode] = &[
    Opcode::SrcCurrent,
    Opcode::SrcTexture,
    Opcode::SrcDiffuse,
    Opcode::SrcSpecular,
    Opcode::SrcManual,
];

pub struct TextureUnitTranslator;

impl Translator for TextureUnitTranslator {
    fn kind(&self) -> &'static str {
        "texture_unit"
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        if let Some(result) = write_sampler_property(args, out) {
            return result;
        }
        match args.op {
            Opcode::SamplerRef | Opcode::TextureAlias => {
                args.exactly(1)?;
                out.write_string(args.string(0)?);
            }
            Opcode::Texture => write_texture(args, out)?,
            Opcode::AnimTexture => write_anim_texture(args, out)?,
            Opcode::CubicTexture => {
                let n = args.arity_in(&[2, 7])?;
                out.write_u16(n as u16);
                for i in 0..n - 1 {
                    out.write_string(args.string(i)?);
                }
                let layout = if n == 2 {
                    args.one_of(1, &[Opcode::CombinedUvw, Opcode::SeparateUv])?
                } else {
                    args.one_of(6, &[Opcode::SeparateUv])?
                };
                out.write_opcode(layout);
            }
            Opcode::TexCoordSet => {
                args.exactly(1)?;
                out.write_u32(args.u32(0)?);
            }
            Opcode::ColourOp => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(
                    0,
                    &[Opcode::Replace, Opcode::Add, Opcode::Modulate, Opcode::AlphaBlend],
                )?);
            }
            Opcode::ColourOpEx | Opcode::AlphaOpEx => write_layer_op(args, out)?,
            Opcode::ColourOpMultipassFallback => write_blend(args, out)?,
            Opcode::EnvMap => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(
                    0,
                    &[
                        Opcode::Off,
                        Opcode::Spherical,
                        Opcode::Planar,
                        Opcode::CubicReflection,
                        Opcode::CubicNormal,
                    ],
                )?);
            }
            Opcode::Scroll | Opcode::ScrollAnim | Opcode::Scale => {
                args.exactly(2)?;
                out.write_f32(args.f32(0)?);
                out.write_f32(args.f32(1)?);
            }
            Opcode::Rotate | Opcode::RotateAnim => {
                args.exactly(1)?;
                out.write_f32(args.f32(0)?);
            }
            Opcode::WaveXform => {
                args.exactly(6)?;
                out.write_opcode(args.one_of(
                    0,
                    &[
                        Opcode::ScrollX,
                        Opcode::ScrollY,
                        Opcode::ScaleX,
                        Opcode::ScaleY,
                        Opcode::Rotate,
                    ],
                )?);
                out.write_opcode(args.one_of(
                    1,
                    &[
                        Opcode::Sine,
                        Opcode::Triangle,
                        Opcode::Square,
                        Opcode::Sawtooth,
                        Opcode::InverseSawtooth,
                    ],
                )?);
                for i in 2..6 {
                    out.write_f32(args.f32(i)?);
                }
            }
            Opcode::Transform => {
                args.exactly(16)?;
                let mut rows = [0.0f32; 16];
                for (i, v) in rows.iter_mut().enumerate() {
                    *v = args.f32(i)?;
                }
                out.write_matrix(&Mat4::from_cols_array(&rows).transpose());
            }
            Opcode::BindingType => {
                args.exactly(1)?;
                out.write_opcode(args.one_of(0, &[Opcode::Vertex, Opcode::Fragment])?);
            }
            Opcode::ContentType => write_content_type(args, out)?,
            _ => return Err(args.unexpected(self.kind())),
        }
        Ok(())
    }
}

fn write_texture(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 5)?;
    out.write_u16(n as u16);
    out.write_string(args.string(0)?);
    for i in 1..n {
        let op = args.opcode(i)?;
        if TEXTURE_TYPES.contains(&op) {
            out.write_opcode(op);
        } else if args.is_number(i) {
            out.write_opcode(Opcode::Unspecified);
            out.write_u32(args.u32(i)?);
        } else if let Some(format) = PixelFormat::from_name(args.text(i)?) {
            out.write_opcode(Opcode::PixelFormat);
            out.write_u32(format as u32);
        } else {
            return Err(args.error(
                ErrorCode::InvalidParameters,
                format!("'{}' is not a supported texture argument", args.text(i)?),
            ));
        }
    }
    Ok(())
}

/// Short form `name frames duration` or long form `frame1 .. frameN duration`.
fn write_anim_texture(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(3, u16::MAX as usize)?;
    if n == 3 && args.u32(1).is_ok() {
        let frames = args.u32(1)?;
        let frames = u16::try_from(frames).map_err(|_| {
            args.error(
                ErrorCode::InvalidParameters,
                format!("too many frames: {frames}"),
            )
        })?;
        out.write_u8(0);
        out.write_string(args.string(0)?);
        out.write_u16(frames);
        out.write_f32(args.f32(2)?);
    } else {
        out.write_u8(1);
        out.write_u16((n - 1) as u16);
        out.write_f32(args.f32(n - 1)?);
        for i in 0..n - 1 {
            out.write_string(args.string(i)?);
        }
    }
    Ok(())
}

/// `op source1 source2 [manual_factor] [manual_colour1] [manual_colour2]`
fn write_layer_op(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(3, 10)?;
    let op = args.one_of(0, LAYER_OPS)?;
    let sources = [args.one_of(1, LAYER_SOURCES)?, args.one_of(2, LAYER_SOURCES)?];
    out.write_opcode(op);
    out.write_opcode(sources[0]);
    out.write_opcode(sources[1]);

    let mut next = 3;
    if op == Opcode::BlendManual {
        out.write_f32(args.f32(next)?);
        next += 1;
    }

    let manual = sources.iter().filter(|&&s| s == Opcode::SrcManual).count();
    if manual > 0 {
        let remaining = n.saturating_sub(next);
        let per_source = if args.op == Opcode::AlphaOpEx {
            1
        } else {
            remaining / manual
        };
        let valid = if args.op == Opcode::AlphaOpEx {
            remaining == manual
        } else {
            remaining % manual == 0 && (3..=4).contains(&per_source)
        };
        if !valid {
            return Err(args.error(
                ErrorCode::InvalidParameters,
                format!("{remaining} values do not match {manual} manual sources"),
            ));
        }
        for _ in 0..manual {
            if per_source == 1 {
                out.write_f32(args.f32(next)?);
            } else {
                out.write_colour(args.colour(next, per_source)?);
            }
            next += per_source;
        }
    }

    if next < n {
        return Err(args.error(
            ErrorCode::FewerParametersExpected,
            format!("unexpected argument '{}'", args.text(next)?),
        ));
    }
    Ok(())
}

fn write_content_type(args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
    let n = args.arity(1, 4)?;
    let kind = args.one_of(0, &[Opcode::Named, Opcode::Shadow, Opcode::Compositor])?;
    out.write_u16(n as u16);
    out.write_opcode(kind);
    if kind == Opcode::Compositor {
        if n < 3 {
            return Err(args.error(
                ErrorCode::InvalidParameters,
                "compositor content needs a compositor and a texture name",
            ));
        }
        out.write_string(args.string(1)?);
        out.write_string(args.string(2)?);
        if n == 4 {
            out.write_u32(args.u32(3)?);
        }
    } else if n > 1 {
        return Err(args.error(
            ErrorCode::FewerParametersExpected,
            format!("expected 1 argument for {}, received {n}", kind.name()),
        ));
    }
    Ok(())
}
