use super::pass::COMPARE_FUNCTIONS;
use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::script::Diagnostic;
use crate::wire::WireWriter;

const ADDRESS_MODES: &[Opcode] = &[Opcode::Wrap, Opcode::Mirror, Opcode::Clamp, Opcode::Border];

const FILTER_PRESETS: &[Opcode] = &[
    Opcode::None,
    Opcode::Bilinear,
    Opcode::Trilinear,
    Opcode::Anisotropic,
];

const FILTER_OPTIONS: &[Opcode] = &[
    Opcode::None,
    Opcode::Point,
    Opcode::Linear,
    Opcode::Anisotropic,
];

pub struct SamplerTranslator;

impl Translator for SamplerTranslator {
    fn kind(&self) -> &'static str {
        "sampler"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        write_sampler_property(args, out).unwrap_or_else(|| Err(args.unexpected(self.kind())))
    }
}

/// Encodes a sampler parameter. Returns `None` when the property is not one.
/// Shared with texture units, which carry an inline sampler.
pub(super) fn write_sampler_property(
    args: &Args<'_>,
    out: &mut WireWriter,
) -> Option<Result<(), Diagnostic>> {
    let result = match args.op {
        Opcode::TexAddressMode => args.arity(1, 3).and_then(|n| {
            out.write_u16(n as u16);
            for i in 0..n {
                out.write_opcode(args.one_of(i, ADDRESS_MODES)?);
            }
            Ok(())
        }),
        Opcode::TexBorderColour => args.arity(3, 4).and_then(|n| {
            out.write_colour(args.colour(0, n)?);
            Ok(())
        }),
        Opcode::Filtering => args.arity_in(&[1, 3]).and_then(|n| {
            out.write_u16(n as u16);
            if n == 1 {
                out.write_opcode(args.one_of(0, FILTER_PRESETS)?);
            } else {
                for i in 0..3 {
                    out.write_opcode(args.one_of(i, FILTER_OPTIONS)?);
                }
            }
            Ok(())
        }),
        Opcode::CompareTest => args.exactly(1).and_then(|()| {
            out.write_bool(args.bool(0)?);
            Ok(())
        }),
        Opcode::CompareFunc => args.exactly(1).and_then(|()| {
            out.write_opcode(args.one_of(0, COMPARE_FUNCTIONS)?);
            Ok(())
        }),
        Opcode::MaxAnisotropy | Opcode::MipmapBias => args.exactly(1).and_then(|()| {
            out.write_f32(args.f32(0)?);
            Ok(())
        }),
        _ => return None,
    };
    Some(result)
}
