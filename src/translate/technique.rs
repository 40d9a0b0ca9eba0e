use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::script::Diagnostic;
use crate::wire::WireWriter;

pub struct TechniqueTranslator;

impl Translator for TechniqueTranslator {
    fn kind(&self) -> &'static str {
        "technique"
    }

    fn child_kinds(&self) -> &'static [Opcode] {
        &[Opcode::Pass]
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        match args.op {
            Opcode::Scheme | Opcode::ShadowCasterMaterial | Opcode::ShadowReceiverMaterial => {
                args.exactly(1)?;
                out.write_string(args.string(0)?);
            }
            Opcode::LodIndex => {
                args.exactly(1)?;
                out.write_u32(args.u32(0)?);
            }
            Opcode::GpuVendorRule => {
                args.exactly(2)?;
                out.write_opcode(args.one_of(0, &[Opcode::Include, Opcode::Exclude])?);
                out.write_string(args.string(1)?);
            }
            Opcode::GpuDeviceRule => {
                let n = args.arity(2, 3)?;
                out.write_u16(n as u16);
                out.write_opcode(args.one_of(0, &[Opcode::Include, Opcode::Exclude])?);
                out.write_string(args.string(1)?);
                if n == 3 {
                    out.write_bool(args.bool(2)?);
                }
            }
            _ => return Err(args.unexpected(self.kind())),
        }
        Ok(())
    }
}
