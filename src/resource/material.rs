use serde::Serialize;

use super::pass::Pass;
use super::program::{GpuConstBuffer, GpuProgram};

/// A complete material: LOD settings, techniques and any GPU programs or
/// constant buffers declared inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    /// LOD thresholds, in the units of `lod_strategy`.
    pub lod_values: Vec<f32>,
    pub lod_strategy: Option<String>,
    pub receive_shadows: bool,
    pub transparency_casts_shadows: bool,
    /// `(alias, texture)` pairs applied to every texture unit with that alias.
    pub texture_aliases: Vec<(String, String)>,
    pub techniques: Vec<Technique>,
    pub gpu_programs: Vec<GpuProgram>,
    pub constant_buffers: Vec<GpuConstBuffer>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lod_values: Vec::new(),
            lod_strategy: None,
            receive_shadows: true,
            transparency_casts_shadows: false,
            texture_aliases: Vec::new(),
            techniques: Vec::new(),
            gpu_programs: Vec::new(),
            constant_buffers: Vec::new(),
        }
    }

    /// Resolves a texture alias declared on this material.
    pub fn texture_alias(&self, alias: &str) -> Option<&str> {
        self.texture_aliases
            .iter()
            .rev()
            .find(|(a, _)| a == alias)
            .map(|(_, t)| t.as_str())
    }
}

/// Include/exclude rule matched against the GPU vendor or device name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuRule {
    pub include: bool,
    pub pattern: String,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Technique {
    pub name: String,
    pub scheme: Option<String>,
    pub lod_index: u32,
    pub shadow_caster_material: Option<String>,
    pub shadow_receiver_material: Option<String>,
    pub gpu_vendor_rules: Vec<GpuRule>,
    pub gpu_device_rules: Vec<GpuRule>,
    pub passes: Vec<Pass>,
}

impl Technique {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_alias_wins() {
        let mut m = Material::new("M");
        m.texture_aliases.push(("diffuse".into(), "a.png".into()));
        m.texture_aliases.push(("diffuse".into(), "b.png".into()));
        assert_eq!(m.texture_alias("diffuse"), Some("b.png"));
        assert_eq!(m.texture_alias("normal"), None);
    }
}
