use super::{
    read_argc, read_children, read_enum, require_name, unknown, Child, DecodeError, ObjectParser,
};
use crate::opcode::Opcode;
use crate::resource::{AddressMode, Sampler, SamplerState};
use crate::wire::{ObjectHeader, WireReader};

pub struct SamplerParser;

impl ObjectParser for SamplerParser {
    type Output = Sampler;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        _version: u32,
    ) -> Result<Sampler, DecodeError> {
        require_name(header, "sampler")?;
        let mut state = SamplerState::default();
        read_children(reader, header.count, "sampler", |child| match child {
            Child::Property(op, r) => {
                if read_sampler_property(&mut state, op, r)? {
                    Ok(())
                } else {
                    Err(unknown("sampler", op))
                }
            }
            Child::Object(op, ..) => Err(unknown("sampler", op)),
        })?;
        Ok(Sampler {
            name: header.name.clone(),
            state,
        })
    }
}

/// Applies one sampler parameter. Returns false when `op` is not one.
pub(super) fn read_sampler_property(
    state: &mut SamplerState,
    op: Opcode,
    r: &mut WireReader<'_>,
) -> Result<bool, DecodeError> {
    match op {
        Opcode::TexAddressMode => {
            let n = read_argc(r, 1..=3)?;
            let u: AddressMode = read_enum(r)?;
            let v = if n >= 2 { read_enum(r)? } else { u };
            let w = if n == 3 { read_enum(r)? } else if n == 1 { u } else { state.address_w };
            state.address_u = u;
            state.address_v = v;
            state.address_w = w;
        }
        Opcode::TexBorderColour => state.border_colour = r.read_colour()?,
        Opcode::Filtering => match r.read_u16()? {
            1 => state.set_filtering_preset(read_enum(r)?),
            3 => {
                state.min_filter = read_enum(r)?;
                state.mag_filter = read_enum(r)?;
                state.mip_filter = read_enum(r)?;
            }
            n => return Err(DecodeError::invalid("argument count", n)),
        },
        Opcode::CompareTest => state.compare_test = r.read_bool()?,
        Opcode::CompareFunc => state.compare_func = read_enum(r)?,
        Opcode::MaxAnisotropy => state.max_anisotropy = r.read_f32()?,
        Opcode::MipmapBias => state.mipmap_bias = r.read_f32()?,
        _ => return Ok(false),
    }
    Ok(true)
}
