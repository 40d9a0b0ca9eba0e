use super::gpu_program::{ConstantBufferParser, GpuProgramParser};
use super::pass::PassParser;
use super::{read_argc, read_children, require_name, unknown, Child, DecodeError, ObjectParser};
use crate::opcode::Opcode;
use crate::resource::{GpuRule, Material, Technique};
use crate::wire::{ObjectHeader, WireReader};

pub struct MaterialParser;

impl ObjectParser for MaterialParser {
    type Output = Material;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<Material, DecodeError> {
        require_name(header, "material")?;
        let mut material = Material::new(&header.name);

        read_children(reader, header.count, "material", |child| {
            match child {
                Child::Property(op, r) => match op {
                    Opcode::LodValues | Opcode::LodDistances => {
                        let n = r.read_u16()?;
                        material.lod_values = (0..n).map(|_| r.read_f32()).collect::<Result<_, _>>()?;
                    }
                    Opcode::LodStrategy => material.lod_strategy = Some(r.read_string()?),
                    Opcode::ReceiveShadows => material.receive_shadows = r.read_bool()?,
                    Opcode::TransparencyCastsShadows => {
                        material.transparency_casts_shadows = r.read_bool()?
                    }
                    Opcode::SetTextureAlias => {
                        let alias = r.read_string()?;
                        let texture = r.read_string()?;
                        material.texture_aliases.push((alias, texture));
                    }
                    _ => return Err(unknown("material", op)),
                },
                Child::Object(op, h, mut body) => match op {
                    Opcode::Technique => material
                        .techniques
                        .push(TechniqueParser.parse(&mut body, &h, version)?),
                    Opcode::GpuProgram => material
                        .gpu_programs
                        .push(GpuProgramParser.parse(&mut body, &h, version)?),
                    Opcode::GpuCbuffer => material
                        .constant_buffers
                        .push(ConstantBufferParser.parse(&mut body, &h, version)?),
                    _ => return Err(unknown("material", op)),
                },
            }
            Ok(())
        })?;
        Ok(material)
    }
}

pub struct TechniqueParser;

impl ObjectParser for TechniqueParser {
    type Output = Technique;

    fn parse(
        &self,
        reader: &mut WireReader<'_>,
        header: &ObjectHeader,
        version: u32,
    ) -> Result<Technique, DecodeError> {
        let mut technique = Technique::new(&header.name);

        read_children(reader, header.count, "technique", |child| {
            match child {
                Child::Property(op, r) => match op {
                    Opcode::Scheme => technique.scheme = Some(r.read_string()?),
                    Opcode::LodIndex => technique.lod_index = r.read_u32()?,
                    Opcode::ShadowCasterMaterial => {
                        technique.shadow_caster_material = Some(r.read_string()?)
                    }
                    Opcode::ShadowReceiverMaterial => {
                        technique.shadow_receiver_material = Some(r.read_string()?)
                    }
                    Opcode::GpuVendorRule => {
                        let include = read_rule_kind(r)?;
                        let pattern = r.read_string()?;
                        technique.gpu_vendor_rules.push(GpuRule {
                            include,
                            pattern,
                            case_sensitive: false,
                        });
                    }
                    Opcode::GpuDeviceRule => {
                        let n = read_argc(r, 2..=3)?;
                        let include = read_rule_kind(r)?;
                        let pattern = r.read_string()?;
                        let case_sensitive = if n == 3 { r.read_bool()? } else { false };
                        technique.gpu_device_rules.push(GpuRule {
                            include,
                            pattern,
                            case_sensitive,
                        });
                    }
                    _ => return Err(unknown("technique", op)),
                },
                Child::Object(Opcode::Pass, h, mut body) => {
                    technique.passes.push(PassParser.parse(&mut body, &h, version)?)
                }
                Child::Object(op, ..) => return Err(unknown("technique", op)),
            }
            Ok(())
        })?;
        Ok(technique)
    }
}

fn read_rule_kind(r: &mut WireReader<'_>) -> Result<bool, DecodeError> {
    match r.read_opcode()? {
        Opcode::Include => Ok(true),
        Opcode::Exclude => Ok(false),
        other => Err(DecodeError::invalid("gpu rule", other)),
    }
}
