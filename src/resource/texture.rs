use glam::{Mat4, Vec4};
use serde::Serialize;

use super::pass::{CompareFunction, SceneBlend};

opcode_enum! {
    TextureType("texture type") {
        Tex1D => Tex1D,
        Tex2D => Tex2D,
        Tex3D => Tex3D,
        Cubic => Cubic,
        Tex2DArray => Tex2DArray,
    }
}

opcode_enum! {
    AddressMode("address mode") {
        Wrap => Wrap,
        Mirror => Mirror,
        Clamp => Clamp,
        Border => Border,
    }
}

opcode_enum! {
    FilterOption("filter option") {
        None => None,
        Point => Point,
        Linear => Linear,
        Anisotropic => Anisotropic,
    }
}

opcode_enum! {
    FilterPreset("filtering preset") {
        None => None,
        Bilinear => Bilinear,
        Trilinear => Trilinear,
        Anisotropic => Anisotropic,
    }
}

opcode_enum! {
    LayerBlendOp("layer blend operation") {
        Source1 => Source1,
        Source2 => Source2,
        Modulate => Modulate,
        ModulateX2 => ModulateX2,
        ModulateX4 => ModulateX4,
        Add => Add,
        AddSigned => AddSigned,
        AddSmooth => AddSmooth,
        Subtract => Subtract,
        BlendDiffuseAlpha => BlendDiffuseAlpha,
        BlendTextureAlpha => BlendTextureAlpha,
        BlendCurrentAlpha => BlendCurrentAlpha,
        BlendManual => BlendManual,
        DotProduct => DotProduct,
        BlendDiffuseColour => BlendDiffuseColour,
    }
}

opcode_enum! {
    LayerSource("layer source") {
        Current => SrcCurrent,
        Texture => SrcTexture,
        Diffuse => SrcDiffuse,
        Specular => SrcSpecular,
        Manual => SrcManual,
    }
}

opcode_enum! {
    EnvMapType("environment map") {
        Spherical => Spherical,
        Planar => Planar,
        CubicReflection => CubicReflection,
        CubicNormal => CubicNormal,
    }
}

opcode_enum! {
    TransformType("transform type") {
        ScrollX => ScrollX,
        ScrollY => ScrollY,
        ScaleX => ScaleX,
        ScaleY => ScaleY,
        Rotate => Rotate,
    }
}

opcode_enum! {
    WaveformType("waveform") {
        Sine => Sine,
        Triangle => Triangle,
        Square => Square,
        Sawtooth => Sawtooth,
        InverseSawtooth => InverseSawtooth,
    }
}

opcode_enum! {
    BindingType("binding type") {
        Vertex => Vertex,
        Fragment => Fragment,
    }
}

macro_rules! pixel_formats {
    ($($variant:ident = $code:literal;)+) => {
        /// Texture pixel formats accepted by `texture`, named `PF_<VARIANT>`.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[repr(u32)]
        pub enum PixelFormat {
            $($variant = $code,)+
        }

        impl PixelFormat {
            const TABLE: &'static [(PixelFormat, &'static str)] = &[
                $((PixelFormat::$variant, concat!("PF_", stringify!($variant))),)+
            ];
        }
    };
}

pixel_formats! {
    L8 = 1;
    L16 = 2;
    A8 = 3;
    A4L4 = 4;
    BYTE_LA = 5;
    R5G6B5 = 6;
    B5G6R5 = 7;
    A4R4G4B4 = 8;
    A1R5G5B5 = 9;
    R8G8B8 = 10;
    B8G8R8 = 11;
    A8R8G8B8 = 12;
    A8B8G8R8 = 13;
    B8G8R8A8 = 14;
    R8G8B8A8 = 15;
    X8R8G8B8 = 16;
    X8B8G8R8 = 17;
    A2R10G10B10 = 18;
    A2B10G10R10 = 19;
    DXT1 = 20;
    DXT2 = 21;
    DXT3 = 22;
    DXT4 = 23;
    DXT5 = 24;
    FLOAT16_R = 25;
    FLOAT16_RGB = 26;
    FLOAT16_RGBA = 27;
    FLOAT32_R = 28;
    FLOAT32_RGB = 29;
    FLOAT32_RGBA = 30;
    FLOAT16_GR = 31;
    FLOAT32_GR = 32;
    DEPTH = 33;
    SHORT_RGBA = 34;
    SHORT_GR = 35;
    SHORT_RGB = 36;
    BC4_UNORM = 37;
    BC5_UNORM = 38;
    BC6H_UF16 = 39;
    BC7_UNORM = 40;
}

impl PixelFormat {
    /// Looks up `PF_A8R8G8B8` style names, ignoring case.
    pub fn from_name(name: &str) -> Option<PixelFormat> {
        Self::TABLE
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|&(f, _)| f)
    }

    pub fn from_code(code: u32) -> Option<PixelFormat> {
        Self::TABLE
            .iter()
            .find(|(f, _)| *f as u32 == code)
            .map(|&(f, _)| f)
    }

    pub fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(f, _)| *f == self)
            .map_or("PF_UNKNOWN", |(_, n)| n)
    }
}

/// Addressing, filtering and comparison state, standalone or inline in a
/// texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplerState {
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub border_colour: Vec4,
    pub min_filter: FilterOption,
    pub mag_filter: FilterOption,
    pub mip_filter: FilterOption,
    pub compare_test: bool,
    pub compare_func: CompareFunction,
    pub max_anisotropy: f32,
    pub mipmap_bias: f32,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            address_u: AddressMode::Wrap,
            address_v: AddressMode::Wrap,
            address_w: AddressMode::Wrap,
            border_colour: Vec4::new(0.0, 0.0, 0.0, 1.0),
            min_filter: FilterOption::Linear,
            mag_filter: FilterOption::Linear,
            mip_filter: FilterOption::Point,
            compare_test: false,
            compare_func: CompareFunction::GreaterEqual,
            max_anisotropy: 1.0,
            mipmap_bias: 0.0,
        }
    }
}

impl SamplerState {
    /// Applies a `filtering` preset.
    pub fn set_filtering_preset(&mut self, preset: FilterPreset) {
        let (min, mag, mip) = match preset {
            FilterPreset::None => (FilterOption::Point, FilterOption::Point, FilterOption::None),
            FilterPreset::Bilinear => (FilterOption::Linear, FilterOption::Linear, FilterOption::Point),
            FilterPreset::Trilinear => (FilterOption::Linear, FilterOption::Linear, FilterOption::Linear),
            FilterPreset::Anisotropic => (
                FilterOption::Anisotropic,
                FilterOption::Anisotropic,
                FilterOption::Linear,
            ),
        };
        self.min_filter = min;
        self.mag_filter = mag;
        self.mip_filter = mip;
    }
}

/// A named, standalone sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sampler {
    pub name: String,
    pub state: SamplerState,
}

/// Texture combination for one channel group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerBlend {
    pub operation: LayerBlendOp,
    pub source1: LayerSource,
    pub source2: LayerSource,
    pub factor: f32,
    pub manual_colours: Vec<Vec4>,
    pub manual_alphas: Vec<f32>,
}

impl LayerBlend {
    pub fn new(operation: LayerBlendOp, source1: LayerSource, source2: LayerSource) -> Self {
        Self {
            operation,
            source1,
            source2,
            factor: 0.0,
            manual_colours: Vec::new(),
            manual_alphas: Vec::new(),
        }
    }
}

impl Default for LayerBlend {
    fn default() -> Self {
        Self::new(LayerBlendOp::Modulate, LayerSource::Texture, LayerSource::Current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveXform {
    pub transform: TransformType,
    pub waveform: WaveformType,
    pub base: f32,
    pub frequency: f32,
    pub phase: f32,
    pub amplitude: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Named,
    Shadow,
    Compositor {
        compositor: String,
        texture: String,
        mrt_index: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureUnit {
    pub name: String,
    pub texture_alias: Option<String>,
    /// Texture names; several for animated or six-sided cubic textures.
    pub frames: Vec<String>,
    pub anim_duration: f32,
    pub texture_type: TextureType,
    /// `None` leaves the mipmap count to the texture.
    pub num_mipmaps: Option<u32>,
    pub is_alpha: bool,
    pub hardware_gamma: bool,
    pub pixel_format: Option<PixelFormat>,
    pub cubic_separate_uv: bool,
    pub tex_coord_set: u32,
    pub sampler: SamplerState,
    pub sampler_ref: Option<String>,
    pub colour_blend: LayerBlend,
    pub alpha_blend: LayerBlend,
    pub colour_blend_fallback: SceneBlend,
    pub env_map: Option<EnvMapType>,
    pub scroll: [f32; 2],
    pub scroll_anim: [f32; 2],
    pub rotate: f32,
    pub rotate_anim: f32,
    pub scale: [f32; 2],
    pub wave_xforms: Vec<WaveXform>,
    pub transform: Mat4,
    pub binding_type: BindingType,
    pub content_type: ContentType,
}

impl Default for TextureUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            texture_alias: None,
            frames: Vec::new(),
            anim_duration: 0.0,
            texture_type: TextureType::Tex2D,
            num_mipmaps: None,
            is_alpha: false,
            hardware_gamma: false,
            pixel_format: None,
            cubic_separate_uv: false,
            tex_coord_set: 0,
            sampler: SamplerState::default(),
            sampler_ref: None,
            colour_blend: LayerBlend::default(),
            alpha_blend: LayerBlend::default(),
            colour_blend_fallback: SceneBlend::Mode(super::pass::SceneBlendType::Modulate),
            env_map: None,
            scroll: [0.0; 2],
            scroll_anim: [0.0; 2],
            rotate: 0.0,
            rotate_anim: 0.0,
            scale: [1.0; 2],
            wave_xforms: Vec::new(),
            transform: Mat4::IDENTITY,
            binding_type: BindingType::Fragment,
            content_type: ContentType::Named,
        }
    }
}

impl TextureUnit {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Name of the first frame, if any texture is set.
    pub fn texture_name(&self) -> Option<&str> {
        self.frames.first().map(String::as_str)
    }

    /// Sets `count` frames named `stem_0.ext` .. `stem_{count-1}.ext`.
    pub fn set_animated_frames(&mut self, base: &str, count: u16, duration: f32) {
        let (stem, ext) = match base.rfind('.') {
            Some(dot) => base.split_at(dot),
            None => (base, ""),
        };
        self.frames = (0..count).map(|i| format!("{stem}_{i}{ext}")).collect();
        self.anim_duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_names() {
        assert_eq!(PixelFormat::from_name("PF_A8R8G8B8"), Some(PixelFormat::A8R8G8B8));
        assert_eq!(PixelFormat::from_name("pf_dxt5"), Some(PixelFormat::DXT5));
        assert_eq!(PixelFormat::from_name("A8R8G8B8"), None);
        assert_eq!(PixelFormat::from_code(12), Some(PixelFormat::A8R8G8B8));
        assert_eq!(PixelFormat::from_code(0), None);
        assert_eq!(PixelFormat::BC7_UNORM.name(), "PF_BC7_UNORM");
    }

    #[test]
    fn animated_frames_keep_extension() {
        let mut unit = TextureUnit::new("");
        unit.set_animated_frames("flame.png", 3, 1.5);
        assert_eq!(unit.frames, vec!["flame_0.png", "flame_1.png", "flame_2.png"]);
        unit.set_animated_frames("noext", 1, 0.0);
        assert_eq!(unit.frames, vec!["noext_0"]);
    }

    #[test]
    fn filtering_presets() {
        let mut state = SamplerState::default();
        state.set_filtering_preset(FilterPreset::Anisotropic);
        assert_eq!(state.min_filter, FilterOption::Anisotropic);
        assert_eq!(state.mip_filter, FilterOption::Linear);
        state.set_filtering_preset(FilterPreset::None);
        assert_eq!(state.mag_filter, FilterOption::Point);
        assert_eq!(state.mip_filter, FilterOption::None);
    }
}
