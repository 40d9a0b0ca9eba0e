//! Decoded object graph and the resource manager seam.
//!
//! The runtime decoder builds these structures from a compiled stream and
//! hands each finished top-level object to a [`ResourceManager`]. Enumerated
//! states are typed here; on the wire they travel as [`Opcode`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::opcode::Opcode;
use crate::runtime::DecodeError;

/// Maps a wire opcode onto a typed state. `WHAT` names the state in errors.
pub trait FromOpcode: Sized {
    const WHAT: &'static str;

    fn from_opcode(op: Opcode) -> Option<Self>;
}

macro_rules! opcode_enum {
    ($(#[$meta:meta])* $name:ident ($what:literal) { $($variant:ident => $op:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $crate::resource::FromOpcode for $name {
            const WHAT: &'static str = $what;

            fn from_opcode(op: $crate::opcode::Opcode) -> Option<Self> {
                match op {
                    $($crate::opcode::Opcode::$op => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

mod auto_constant;
mod material;
mod pass;
mod program;
mod texture;

pub use auto_constant::{auto_constant, find_auto_constant, AutoConstant, AUTO_CONSTANTS};
pub use material::{GpuRule, Material, Technique};
pub use pass::{
    BlendFactor, BlendOperation, ColourSource, CompareFunction, CullHardware, CullSoftware,
    FogMode, FogOverride, IlluminationStage, Iteration, LightType, Pass, PolygonMode, SceneBlend,
    SceneBlendType, ShadeMode, TransparentSorting,
};
pub use program::{
    BuiltinType, ConstantBufferError, ConstantBufferRef, ConstantParam, GpuConstBuffer,
    GpuProgram, GpuProgramRef, ParamKey, ParamValue, Shader, ShaderKind, ShaderRef,
    ShaderRefKind,
};
pub use texture::{
    AddressMode, BindingType, ContentType, EnvMapType, FilterOption, FilterPreset, LayerBlend,
    LayerBlendOp, LayerSource, PixelFormat, Sampler, SamplerState, TextureType, TextureUnit,
    TransformType, WaveXform, WaveformType,
};

/// Receives decoded top-level objects.
pub trait ResourceManager {
    fn create_material(&mut self, material: Material) -> Arc<Material>;

    fn create_gpu_program(&mut self, program: GpuProgram) -> Arc<GpuProgram>;

    fn create_constant_buffer(&mut self, buffer: GpuConstBuffer) -> Arc<GpuConstBuffer>;

    fn create_sampler(&mut self, sampler: Sampler) -> Arc<Sampler>;

    /// Called when a top-level object could not be decoded.
    fn load_failed(&mut self, kind: Opcode, name: &str, error: &DecodeError);
}

/// A failed load, as seen by the cache.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub kind: String,
    pub name: String,
    pub error: String,
}

/// In-memory resource manager indexed by name. A later object with the same
/// name replaces the earlier one.
#[derive(Debug, Default, Serialize)]
pub struct ResourceCache {
    pub materials: BTreeMap<String, Arc<Material>>,
    pub gpu_programs: BTreeMap<String, Arc<GpuProgram>>,
    pub constant_buffers: BTreeMap<String, Arc<GpuConstBuffer>>,
    pub samplers: BTreeMap<String, Arc<Sampler>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<LoadFailure>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material(&self, name: &str) -> Option<&Arc<Material>> {
        self.materials.get(name)
    }

    pub fn gpu_program(&self, name: &str) -> Option<&Arc<GpuProgram>> {
        self.gpu_programs.get(name)
    }

    pub fn constant_buffer(&self, name: &str) -> Option<&Arc<GpuConstBuffer>> {
        self.constant_buffers.get(name)
    }

    pub fn sampler(&self, name: &str) -> Option<&Arc<Sampler>> {
        self.samplers.get(name)
    }

    /// Total number of loaded objects.
    pub fn len(&self) -> usize {
        self.materials.len()
            + self.gpu_programs.len()
            + self.constant_buffers.len()
            + self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceManager for ResourceCache {
    fn create_material(&mut self, material: Material) -> Arc<Material> {
        debug!("material {} loaded", material.name);
        let handle = Arc::new(material);
        self.materials.insert(handle.name.clone(), Arc::clone(&handle));
        handle
    }

    fn create_gpu_program(&mut self, program: GpuProgram) -> Arc<GpuProgram> {
        debug!("gpu program {} loaded", program.name);
        let handle = Arc::new(program);
        self.gpu_programs.insert(handle.name.clone(), Arc::clone(&handle));
        handle
    }

    fn create_constant_buffer(&mut self, buffer: GpuConstBuffer) -> Arc<GpuConstBuffer> {
        debug!("constant buffer {} loaded", buffer.name);
        let handle = Arc::new(buffer);
        self.constant_buffers.insert(handle.name.clone(), Arc::clone(&handle));
        handle
    }

    fn create_sampler(&mut self, sampler: Sampler) -> Arc<Sampler> {
        debug!("sampler {} loaded", sampler.name);
        let handle = Arc::new(sampler);
        self.samplers.insert(handle.name.clone(), Arc::clone(&handle));
        handle
    }

    fn load_failed(&mut self, kind: Opcode, name: &str, err: &DecodeError) {
        debug!("recording failed {kind} '{name}': {err}");
        self.failures.push(LoadFailure {
            kind: kind.name(),
            name: name.to_string(),
            error: err.to_string(),
        });
    }
}
