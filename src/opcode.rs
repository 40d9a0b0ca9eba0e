//! Identifier table shared by the compiler and the runtime decoder.
//!
//! Every keyword of the material language maps to a stable `u16` opcode.
//! Opcode 0 is reserved as [`Opcode::Unspecified`] and is never assigned to
//! a keyword, so the wire format can use it as an "absent" sentinel.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

macro_rules! opcodes {
    ($($variant:ident $(=> $($kw:literal),+)?;)*) => {
        /// A keyword or construct identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u16)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// All opcodes in wire order; `ALL[n] as u16 == n`.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// Source spellings that map to this opcode.
            pub fn keywords(self) -> &'static [&'static str] {
                match self {
                    $(Opcode::$variant => &[$($($kw),+)?],)*
                }
            }
        }
    };
}

opcodes! {
    Unspecified;
    On => "on", "true", "yes";
    Off => "off", "false", "no";

    // Constructs
    Material => "material";
    VertexProgram => "vertex_program";
    GeometryProgram => "geometry_program";
    FragmentProgram => "fragment_program";
    Technique => "technique";
    Pass => "pass";
    TextureUnit => "texture_unit";
    VertexProgramRef => "vertex_program_ref";
    GeometryProgramRef => "geometry_program_ref";
    FragmentProgramRef => "fragment_program_ref";
    ShadowCasterVertexProgramRef => "shadow_caster_vertex_program_ref";
    ShadowCasterFragmentProgramRef => "shadow_caster_fragment_program_ref";
    ShadowReceiverVertexProgramRef => "shadow_receiver_vertex_program_ref";
    ShadowReceiverFragmentProgramRef => "shadow_receiver_fragment_program_ref";
    ShadowCasterMaterial => "shadow_caster_material";
    ShadowReceiverMaterial => "shadow_receiver_material";

    // Material
    LodValues => "lod_values";
    LodStrategy => "lod_strategy";
    LodDistances => "lod_distances";
    ReceiveShadows => "receive_shadows";
    TransparencyCastsShadows => "transparency_casts_shadows";
    SetTextureAlias => "set_texture_alias";

    // GPU program parameters
    Source => "source";
    Syntax => "syntax";
    DefaultParams => "default_params";
    ParamIndexed => "param_indexed";
    ParamNamed => "param_named";
    ParamIndexedAuto => "param_indexed_auto";
    ParamNamedAuto => "param_named_auto";

    // Technique
    Scheme => "scheme";
    LodIndex => "lod_index";
    GpuVendorRule => "gpu_vendor_rule";
    GpuDeviceRule => "gpu_device_rule";
    Include => "include";
    Exclude => "exclude";

    // Pass
    Ambient => "ambient";
    Diffuse => "diffuse";
    Specular => "specular";
    Emissive => "emissive";
    VertexColour => "vertexcolour";
    SceneBlend => "scene_blend";
    ColourBlend => "colour_blend";
    One => "one";
    Zero => "zero";
    DestColour => "dest_colour";
    SrcColour => "src_colour";
    OneMinusDestColour => "one_minus_dest_colour";
    OneMinusSrcColour => "one_minus_src_colour";
    DestAlpha => "dest_alpha";
    SrcAlpha => "src_alpha";
    OneMinusDestAlpha => "one_minus_dest_alpha";
    OneMinusSrcAlpha => "one_minus_src_alpha";
    SeparateSceneBlend => "separate_scene_blend";
    SceneBlendOp => "scene_blend_op";
    ReverseSubtract => "reverse_subtract";
    Min => "min";
    Max => "max";
    SeparateSceneBlendOp => "separate_scene_blend_op";
    DepthCheck => "depth_check";
    DepthWrite => "depth_write";
    DepthFunc => "depth_func";
    DepthBias => "depth_bias";
    IterationDepthBias => "iteration_depth_bias";
    AlwaysFail => "always_fail";
    AlwaysPass => "always_pass";
    LessEqual => "less_equal";
    Less => "less";
    Equal => "equal";
    NotEqual => "not_equal";
    GreaterEqual => "greater_equal";
    Greater => "greater";
    AlphaRejection => "alpha_rejection";
    AlphaToCoverage => "alpha_to_coverage";
    LightScissor => "light_scissor";
    LightClipPlanes => "light_clip_planes";
    TransparentSorting => "transparent_sorting";
    IlluminationStage => "illumination_stage";
    Decal => "decal";
    CullHardware => "cull_hardware";
    Clockwise => "clockwise";
    Anticlockwise => "anticlockwise";
    CullSoftware => "cull_software";
    Back => "back";
    Front => "front";
    NormaliseNormals => "normalise_normals";
    Lighting => "lighting";
    Shading => "shading";
    Flat => "flat";
    Gouraud => "gouraud";
    Phong => "phong";
    PolygonMode => "polygon_mode";
    Solid => "solid";
    Wireframe => "wireframe";
    Points => "points";
    PolygonModeOverrideable => "polygon_mode_overrideable";
    FogOverride => "fog_override";
    None => "none";
    Linear => "linear";
    Exp => "exp";
    Exp2 => "exp2";
    ColourWrite => "colour_write";
    MaxLights => "max_lights";
    StartLight => "start_light";
    Iteration => "iteration";
    Once => "once";
    OncePerLight => "once_per_light";
    PerLight => "per_light";
    PerNLights => "per_n_lights";
    Point => "point";
    Spot => "spot";
    Directional => "directional";
    LightMask => "light_mask";
    PointSize => "point_size";
    PointSprites => "point_sprites";
    PointSizeAttenuation => "point_size_attenuation";
    PointSizeMin => "point_size_min";
    PointSizeMax => "point_size_max";

    // Texture unit
    TextureAlias => "texture_alias";
    Texture => "texture";
    Tex1D => "1d";
    Tex2D => "2d";
    Tex3D => "3d";
    Cubic => "cubic";
    Tex2DArray => "2darray";
    Unlimited => "unlimited";
    Alpha => "alpha";
    Gamma => "gamma";
    PixelFormat;
    AnimTexture => "anim_texture";
    CubicTexture => "cubic_texture";
    SeparateUv => "separateUV";
    CombinedUvw => "combinedUVW";
    TexCoordSet => "tex_coord_set";
    TexAddressMode => "tex_address_mode";
    Wrap => "wrap";
    Clamp => "clamp";
    Border => "border";
    Mirror => "mirror";
    TexBorderColour => "tex_border_colour";
    Filtering => "filtering";
    Bilinear => "bilinear";
    Trilinear => "trilinear";
    Anisotropic => "anisotropic";
    CompareTest => "compare_test";
    CompareFunc => "compare_func", "comp_func";
    MaxAnisotropy => "max_anisotropy";
    MipmapBias => "mipmap_bias";
    ColourOp => "colour_op";
    Replace => "replace";
    Add => "add";
    Modulate => "modulate";
    AlphaBlend => "alpha_blend";
    ColourOpEx => "colour_op_ex";
    Source1 => "source1";
    Source2 => "source2";
    ModulateX2 => "modulate_x2";
    ModulateX4 => "modulate_x4";
    AddSigned => "add_signed";
    AddSmooth => "add_smooth";
    Subtract => "subtract";
    BlendDiffuseColour => "blend_diffuse_colour";
    BlendDiffuseAlpha => "blend_diffuse_alpha";
    BlendTextureAlpha => "blend_texture_alpha";
    BlendCurrentAlpha => "blend_current_alpha";
    BlendManual => "blend_manual";
    DotProduct => "dotproduct";
    SrcCurrent => "src_current";
    SrcTexture => "src_texture";
    SrcDiffuse => "src_diffuse";
    SrcSpecular => "src_specular";
    SrcManual => "src_manual";
    ColourOpMultipassFallback => "colour_op_multipass_fallback";
    AlphaOpEx => "alpha_op_ex";
    EnvMap => "env_map";
    Spherical => "spherical";
    Planar => "planar";
    CubicReflection => "cubic_reflection";
    CubicNormal => "cubic_normal";
    Scroll => "scroll";
    ScrollAnim => "scroll_anim";
    Rotate => "rotate";
    RotateAnim => "rotate_anim";
    Scale => "scale";
    WaveXform => "wave_xform";
    ScrollX => "scroll_x";
    ScrollY => "scroll_y";
    ScaleX => "scale_x";
    ScaleY => "scale_y";
    Sine => "sine";
    Triangle => "triangle";
    Square => "square";
    Sawtooth => "sawtooth";
    InverseSawtooth => "inverse_sawtooth";
    Transform => "transform";
    BindingType => "binding_type";
    Vertex => "vertex";
    Fragment => "fragment";
    ContentType => "content_type";
    Named => "named";
    Shadow => "shadow";
    TextureSource => "texture_source";
    SharedParams => "shared_params";
    SharedParamNamed => "shared_param_named";
    SharedParamsRef => "shared_params_ref";
    Compositor => "compositor";

    // Later additions
    TessellationHullProgram => "tessellation_hull_program";
    TessellationDomainProgram => "tessellation_domain_program";
    ComputeProgram => "compute_program";
    TessellationHullProgramRef => "tessellation_hull_program_ref";
    TessellationDomainProgramRef => "tessellation_domain_program_ref";
    ComputeProgramRef => "compute_program_ref";
    LineWidth => "line_width";
    Sampler => "sampler";
    SamplerRef => "sampler_ref";
    GpuProgram => "gpu_program";
    GpuProgramRef => "gpu_program_ref";
    GpuCbuffer => "gpu_cbuffer";
    GpuCbufferRef => "gpu_cbuffer_ref";
    EntryPoint => "entry_point";
    Stage => "stage";
    Target => "target";
    Slot => "slot";
}

static KEYWORDS: LazyLock<HashMap<String, Opcode>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for &op in Opcode::ALL {
        for kw in op.keywords() {
            map.insert(kw.to_ascii_lowercase(), op);
        }
    }
    map
});

impl Opcode {
    /// Look up a source word. Matching is case-insensitive.
    pub fn lookup(word: &str) -> Option<Opcode> {
        KEYWORDS.get(&word.to_ascii_lowercase()).copied()
    }

    /// Inverse of `op as u16`.
    pub fn from_u16(value: u16) -> Option<Opcode> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// The canonical spelling, or the variant name for wire-only opcodes.
    pub fn name(self) -> String {
        match self.keywords().first() {
            Some(kw) => (*kw).to_string(),
            None => format!("{self:?}"),
        }
    }

    /// Object kinds allowed at the top of a script or stream.
    pub fn is_top_level(self) -> bool {
        matches!(
            self,
            Opcode::Material | Opcode::GpuProgram | Opcode::GpuCbuffer | Opcode::Sampler
        )
    }

    pub fn is_blend_factor(self) -> bool {
        (Opcode::One.as_u16()..=Opcode::OneMinusSrcAlpha.as_u16()).contains(&self.as_u16())
    }

    pub fn is_compare_function(self) -> bool {
        (Opcode::AlwaysFail.as_u16()..=Opcode::Greater.as_u16()).contains(&self.as_u16())
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_are_dense() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.as_u16() as usize, i, "{op:?} out of place");
        }
    }

    #[test]
    fn no_keyword_maps_to_zero() {
        assert!(Opcode::Unspecified.keywords().is_empty());
        for op in Opcode::ALL {
            for kw in op.keywords() {
                assert_ne!(Opcode::lookup(kw), Some(Opcode::Unspecified));
            }
        }
    }

    #[test]
    fn keywords_are_unique() {
        let mut seen = HashMap::new();
        for &op in Opcode::ALL {
            for kw in op.keywords() {
                let prev = seen.insert(kw.to_ascii_lowercase(), op);
                assert!(prev.is_none(), "keyword {kw} assigned twice");
            }
        }
    }

    #[test]
    fn boolean_aliases() {
        assert_eq!(Opcode::lookup("on"), Some(Opcode::On));
        assert_eq!(Opcode::lookup("true"), Some(Opcode::On));
        assert_eq!(Opcode::lookup("yes"), Some(Opcode::On));
        assert_eq!(Opcode::lookup("no"), Some(Opcode::Off));
        assert_eq!(Opcode::On.as_u16(), 1);
        assert_eq!(Opcode::Off.as_u16(), 2);
        assert_eq!(Opcode::Material.as_u16(), 3);
    }

    #[test]
    fn mixed_case_spellings() {
        assert_eq!(Opcode::lookup("separateUV"), Some(Opcode::SeparateUv));
        assert_eq!(Opcode::lookup("combineduvw"), Some(Opcode::CombinedUvw));
        assert_eq!(Opcode::lookup("comp_func"), Some(Opcode::CompareFunc));
        assert_eq!(Opcode::lookup("dotproduct"), Some(Opcode::DotProduct));
    }

    #[test]
    fn from_u16_round_trips() {
        assert_eq!(Opcode::from_u16(Opcode::Pass.as_u16()), Some(Opcode::Pass));
        assert_eq!(Opcode::from_u16(u16::MAX), None);
    }

    #[test]
    fn subranges() {
        assert!(Opcode::SrcAlpha.is_blend_factor());
        assert!(!Opcode::Add.is_blend_factor());
        assert!(Opcode::LessEqual.is_compare_function());
        assert!(!Opcode::DepthFunc.is_compare_function());
    }

    #[test]
    fn wire_only_opcodes_have_no_keyword() {
        assert!(Opcode::PixelFormat.keywords().is_empty());
        assert_eq!(Opcode::PixelFormat.name(), "PixelFormat");
    }
}
