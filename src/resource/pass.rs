use glam::Vec4;
use serde::Serialize;

use super::program::{GpuProgramRef, ShaderRef};
use super::texture::TextureUnit;

opcode_enum! {
    CompareFunction("compare function") {
        AlwaysFail => AlwaysFail,
        AlwaysPass => AlwaysPass,
        LessEqual => LessEqual,
        Less => Less,
        Equal => Equal,
        NotEqual => NotEqual,
        GreaterEqual => GreaterEqual,
        Greater => Greater,
    }
}

opcode_enum! {
    BlendFactor("blend factor") {
        One => One,
        Zero => Zero,
        DestColour => DestColour,
        SrcColour => SrcColour,
        OneMinusDestColour => OneMinusDestColour,
        OneMinusSrcColour => OneMinusSrcColour,
        DestAlpha => DestAlpha,
        SrcAlpha => SrcAlpha,
        OneMinusDestAlpha => OneMinusDestAlpha,
        OneMinusSrcAlpha => OneMinusSrcAlpha,
    }
}

opcode_enum! {
    /// Shorthand blend modes.
    SceneBlendType("blend mode") {
        Add => Add,
        Modulate => Modulate,
        ColourBlend => ColourBlend,
        AlphaBlend => AlphaBlend,
    }
}

opcode_enum! {
    BlendOperation("blend operation") {
        Add => Add,
        Subtract => Subtract,
        ReverseSubtract => ReverseSubtract,
        Min => Min,
        Max => Max,
    }
}

opcode_enum! {
    IlluminationStage("illumination stage") {
        Ambient => Ambient,
        PerLight => PerLight,
        Decal => Decal,
    }
}

opcode_enum! {
    CullHardware("hardware culling mode") {
        Clockwise => Clockwise,
        Anticlockwise => Anticlockwise,
        None => None,
    }
}

opcode_enum! {
    CullSoftware("software culling mode") {
        Front => Front,
        Back => Back,
        None => None,
    }
}

opcode_enum! {
    ShadeMode("shading mode") {
        Flat => Flat,
        Gouraud => Gouraud,
        Phong => Phong,
    }
}

opcode_enum! {
    PolygonMode("polygon mode") {
        Solid => Solid,
        Wireframe => Wireframe,
        Points => Points,
    }
}

opcode_enum! {
    FogMode("fog mode") {
        None => None,
        Linear => Linear,
        Exp => Exp,
        Exp2 => Exp2,
    }
}

opcode_enum! {
    LightType("light type") {
        Point => Point,
        Directional => Directional,
        Spot => Spot,
    }
}

/// Where a lighting colour comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColourSource {
    VertexColour,
    Fixed(Vec4),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneBlend {
    Mode(SceneBlendType),
    Factors { source: BlendFactor, dest: BlendFactor },
}

impl SceneBlend {
    /// The source and destination factors this blend resolves to.
    pub fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            SceneBlend::Mode(SceneBlendType::Add) => (BlendFactor::One, BlendFactor::One),
            SceneBlend::Mode(SceneBlendType::Modulate) => {
                (BlendFactor::DestColour, BlendFactor::Zero)
            }
            SceneBlend::Mode(SceneBlendType::ColourBlend) => {
                (BlendFactor::SrcColour, BlendFactor::OneMinusSrcColour)
            }
            SceneBlend::Mode(SceneBlendType::AlphaBlend) => {
                (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
            }
            SceneBlend::Factors { source, dest } => (source, dest),
        }
    }
}

impl Default for SceneBlend {
    fn default() -> Self {
        SceneBlend::Factors {
            source: BlendFactor::One,
            dest: BlendFactor::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransparentSorting {
    Off,
    #[default]
    On,
    Force,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FogOverride {
    pub enabled: bool,
    pub mode: FogMode,
    pub colour: Vec4,
    pub density: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for FogOverride {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::None,
            colour: Vec4::ONE,
            density: 0.001,
            start: 0.0,
            end: 1.0,
        }
    }
}

/// How many times a pass is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Iteration {
    pub count: i32,
    pub per_light: bool,
    pub lights_per_iteration: i32,
    pub only_light_type: Option<LightType>,
}

impl Default for Iteration {
    fn default() -> Self {
        Self {
            count: 1,
            per_light: false,
            lights_per_iteration: 1,
            only_light_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pass {
    pub name: String,
    pub ambient: ColourSource,
    pub diffuse: ColourSource,
    pub specular: ColourSource,
    pub emissive: ColourSource,
    pub shininess: f32,
    pub scene_blend: SceneBlend,
    /// Separate alpha blending, when set.
    pub alpha_blend: Option<SceneBlend>,
    pub blend_op: BlendOperation,
    pub alpha_blend_op: BlendOperation,
    pub depth_check: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunction,
    pub depth_bias_constant: f32,
    pub depth_bias_slope_scale: f32,
    pub iteration_depth_bias: f32,
    pub alpha_reject_func: CompareFunction,
    pub alpha_reject_value: u8,
    pub alpha_to_coverage: bool,
    pub light_scissor: bool,
    pub light_clip_planes: bool,
    pub transparent_sorting: TransparentSorting,
    pub illumination_stage: Option<IlluminationStage>,
    pub cull_hardware: CullHardware,
    pub cull_software: CullSoftware,
    pub normalise_normals: bool,
    pub lighting: bool,
    pub shading: ShadeMode,
    pub polygon_mode: PolygonMode,
    pub polygon_mode_overrideable: bool,
    pub fog: FogOverride,
    pub colour_write: bool,
    pub max_lights: u32,
    pub start_light: u32,
    pub light_mask: u32,
    pub iteration: Iteration,
    pub point_size: f32,
    pub point_sprites: bool,
    /// Constant, linear and quadratic attenuation, when enabled.
    pub point_attenuation: Option<[f32; 3]>,
    pub point_size_min: f32,
    pub point_size_max: f32,
    pub line_width: f32,
    pub texture_units: Vec<TextureUnit>,
    pub gpu_program_ref: Option<GpuProgramRef>,
    pub shader_refs: Vec<ShaderRef>,
}

impl Default for Pass {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: ColourSource::Fixed(Vec4::ONE),
            diffuse: ColourSource::Fixed(Vec4::ONE),
            specular: ColourSource::Fixed(Vec4::ZERO),
            emissive: ColourSource::Fixed(Vec4::ZERO),
            shininess: 0.0,
            scene_blend: SceneBlend::default(),
            alpha_blend: None,
            blend_op: BlendOperation::Add,
            alpha_blend_op: BlendOperation::Add,
            depth_check: true,
            depth_write: true,
            depth_func: CompareFunction::LessEqual,
            depth_bias_constant: 0.0,
            depth_bias_slope_scale: 0.0,
            iteration_depth_bias: 0.0,
            alpha_reject_func: CompareFunction::AlwaysPass,
            alpha_reject_value: 0,
            alpha_to_coverage: false,
            light_scissor: false,
            light_clip_planes: false,
            transparent_sorting: TransparentSorting::On,
            illumination_stage: None,
            cull_hardware: CullHardware::Clockwise,
            cull_software: CullSoftware::Back,
            normalise_normals: false,
            lighting: true,
            shading: ShadeMode::Gouraud,
            polygon_mode: PolygonMode::Solid,
            polygon_mode_overrideable: true,
            fog: FogOverride::default(),
            colour_write: true,
            max_lights: 8,
            start_light: 0,
            light_mask: u32::MAX,
            iteration: Iteration::default(),
            point_size: 1.0,
            point_sprites: false,
            point_attenuation: None,
            point_size_min: 0.0,
            point_size_max: 0.0,
            line_width: 1.0,
            texture_units: Vec::new(),
            gpu_program_ref: None,
            shader_refs: Vec::new(),
        }
    }
}

impl Pass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_transparent(&self) -> bool {
        let blend = self.scene_blend.factors();
        blend != (BlendFactor::One, BlendFactor::Zero)
    }
}
