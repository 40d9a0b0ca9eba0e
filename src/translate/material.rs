use super::{Args, Translator};
use crate::opcode::Opcode;
use crate::script::Diagnostic;
use crate::wire::WireWriter;

pub struct MaterialTranslator;

impl Translator for MaterialTranslator {
    fn kind(&self) -> &'static str {
        "material"
    }

    fn requires_name(&self) -> bool {
        true
    }

    fn child_kinds(&self) -> &'static [Opcode] {
        &[Opcode::Technique, Opcode::GpuProgram, Opcode::GpuCbuffer]
    }

    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic> {
        match args.op {
            Opcode::LodValues | Opcode::LodDistances => {
                let n = args.arity(1, u16::MAX as usize)?;
                out.write_u16(n as u16);
                for i in 0..n {
                    out.write_f32(args.f32(i)?);
                }
            }
            Opcode::LodStrategy => {
                args.exactly(1)?;
                out.write_string(&args.string(0)?.to_ascii_lowercase());
            }
            Opcode::ReceiveShadows | Opcode::TransparencyCastsShadows => {
                args.exactly(1)?;
                out.write_bool(args.bool(0)?);
            }
            Opcode::SetTextureAlias => {
                args.exactly(2)?;
                out.write_string(args.string(0)?);
                out.write_string(args.string(1)?);
            }
            _ => return Err(args.unexpected(self.kind())),
        }
        Ok(())
    }
}
