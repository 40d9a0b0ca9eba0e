//! Full pipeline integration tests: script → compile → binary → decode → object graph.

use std::io::Cursor;

use assert_approx_eq::assert_approx_eq;
use glam::Vec4;

use matscript::compiler::{CompiledScript, CompilerOptions, ScriptCompiler};
use matscript::resource::{
    BlendFactor, BuiltinType, ColourSource, ConstantBufferError, GpuConstBuffer, ParamKey,
    ParamValue, Pass, ResourceCache, SceneBlend, SceneBlendType, ShaderKind, ShaderRefKind,
};
use matscript::runtime::{DecodeReport, ScriptDecoder};
use matscript::script::ErrorCode;

fn compile(src: &str) -> CompiledScript {
    ScriptCompiler::new(CompilerOptions::default())
        .compile_source(src, "test.material")
        .expect("compile failed")
}

fn decode(bytes: &[u8]) -> (DecodeReport, ResourceCache) {
    let mut cache = ResourceCache::new();
    let report = ScriptDecoder::decode(&mut Cursor::new(bytes), &mut cache).expect("bad header");
    (report, cache)
}

/// Compiles `lines` inside a single pass and returns the decoded pass.
fn pass_of(lines: &str) -> (Pass, CompiledScript) {
    let src = format!("material M\n{{\n  technique\n  {{\n    pass\n    {{\n{lines}\n    }}\n  }}\n}}\n");
    let compiled = compile(&src);
    let (report, cache) = decode(&compiled.bytes);
    assert!(report.is_clean(), "{:?}", report.failures);
    let material = cache.material("M").expect("material missing");
    (material.techniques[0].passes[0].clone(), compiled)
}

// =============================================================================
// Colours
// =============================================================================

#[test]
fn ambient_colour_survives_the_round_trip() {
    let (pass, compiled) = pass_of("ambient 0.1 0.2 0.3");
    assert!(compiled.is_clean());
    let ColourSource::Fixed(c) = pass.ambient else {
        panic!("expected a fixed colour, got {:?}", pass.ambient);
    };
    assert_approx_eq!(c.x, 0.1);
    assert_approx_eq!(c.y, 0.2);
    assert_approx_eq!(c.z, 0.3);
    assert_approx_eq!(c.w, 1.0);
}

#[test]
fn ambient_colour_is_stored_bgra() {
    let compiled = compile("material M\n{\n  technique\n  {\n    pass\n    {\n      ambient 0.1 0.2 0.3\n    }\n  }\n}\n");
    let floats: Vec<f32> = [0.3f32, 0.2, 0.1, 1.0].to_vec();
    let needle: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
    assert!(compiled
        .bytes
        .windows(needle.len())
        .any(|w| w == needle.as_slice()));
}

#[test]
fn vertex_colour_tracking() {
    let (pass, _) = pass_of("ambient vertexcolour\ndiffuse 1 0 0 0.5");
    assert_eq!(pass.ambient, ColourSource::VertexColour);
    assert_eq!(pass.diffuse, ColourSource::Fixed(Vec4::new(1.0, 0.0, 0.0, 0.5)));
}

// =============================================================================
// Variable-arity properties
// =============================================================================

#[test]
fn depth_bias_one_or_two_values() {
    let (pass, _) = pass_of("depth_bias 0.5");
    assert_approx_eq!(pass.depth_bias_constant, 0.5);
    assert_approx_eq!(pass.depth_bias_slope_scale, 0.0);

    let (pass, _) = pass_of("depth_bias 0.5 0.1");
    assert_approx_eq!(pass.depth_bias_constant, 0.5);
    assert_approx_eq!(pass.depth_bias_slope_scale, 0.1);
}

#[test]
fn scene_blend_mode_and_factors() {
    let (pass, _) = pass_of("scene_blend add");
    assert_eq!(pass.scene_blend, SceneBlend::Mode(SceneBlendType::Add));

    let (pass, _) = pass_of("scene_blend src_alpha one_minus_src_alpha");
    assert_eq!(
        pass.scene_blend.factors(),
        (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
    );
    assert!(pass.is_transparent());
}

#[test]
fn bad_arity_drops_only_that_property() {
    let (pass, compiled) = pass_of("depth_bias 1 2 3\nlighting off");
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].code, ErrorCode::FewerParametersExpected);
    assert_approx_eq!(pass.depth_bias_constant, 0.0);
    assert!(!pass.lighting);
}

// =============================================================================
// Texture units and samplers
// =============================================================================

#[test]
fn texture_unit_with_sampler_ref() {
    let src = "sampler Clamped\n{\n  tex_address_mode clamp\n  max_anisotropy 8\n}\n\
               material M\n{\n  technique\n  {\n    pass\n    {\n      texture_unit Diffuse\n      {\n        texture wall.png\n        sampler_ref Clamped\n        scroll_anim 0.5 0\n      }\n    }\n  }\n}\n";
    let compiled = compile(src);
    assert!(compiled.is_clean(), "{:?}", compiled.diagnostics);
    assert_eq!(compiled.objects, 2);

    let (report, cache) = decode(&compiled.bytes);
    assert_eq!(report.objects, 2);
    let sampler = cache.sampler("Clamped").unwrap();
    assert_approx_eq!(sampler.state.max_anisotropy, 8.0);

    let unit = &cache.material("M").unwrap().techniques[0].passes[0].texture_units[0];
    assert_eq!(unit.name, "Diffuse");
    assert_eq!(unit.texture_name(), Some("wall.png"));
    assert_eq!(unit.sampler_ref.as_deref(), Some("Clamped"));
    assert_approx_eq!(unit.scroll_anim[0], 0.5);
}

// =============================================================================
// GPU programs and constant buffers
// =============================================================================

const PROGRAMS: &str = "gpu_program Lit\n{\n\
    vertex_program LitVS\n  {\n    source lit.hlsl\n    target vs_5_0\n    entry_point main\n  }\n\
    fragment_program LitPS\n  {\n    source lit.hlsl\n    target ps_5_0\n    entry_point main\n    stage ps\n  }\n\
}\n\
gpu_cbuffer Globals\n{\n  param_named tint float4 1 0.5 0 1\n  param_named world matrix3x4\n}\n";

#[test]
fn programs_and_buffers_decode() {
    let compiled = compile(PROGRAMS);
    assert!(compiled.is_clean(), "{:?}", compiled.diagnostics);
    let (report, cache) = decode(&compiled.bytes);
    assert!(report.is_clean(), "{:?}", report.failures);

    let program = cache.gpu_program("Lit").unwrap();
    assert_eq!(program.shaders.len(), 2);
    assert_eq!(program.shader(ShaderKind::Vertex).unwrap().stage, "vs");
    assert_eq!(program.shader(ShaderKind::Fragment).unwrap().target, "ps_5_0");

    let buffer = cache.constant_buffer("Globals").unwrap();
    assert_eq!(buffer.buffer_size(), 16 + 48);
    assert_eq!(&buffer.data().unwrap()[4..8], &0.5f32.to_le_bytes());
}

#[test]
fn pass_program_references() {
    let src = "material M\n{\n  technique\n  {\n    pass\n    {\n\
        gpu_program_ref Lit\n      {\n        gpu_cbuffer_ref Globals\n        {\n          slot 2\n        }\n      }\n\
        vertex_program_ref LitVS\n      {\n        param_named_auto worldViewProj worldviewproj_matrix\n        param_indexed 4 int 7\n      }\n\
    }\n  }\n}\n";
    let (report, cache) = decode(&compile(src).bytes);
    assert!(report.is_clean(), "{:?}", report.failures);

    let pass = &cache.material("M").unwrap().techniques[0].passes[0];
    let program_ref = pass.gpu_program_ref.as_ref().unwrap();
    assert_eq!(program_ref.name, "Lit");
    assert_eq!(program_ref.cbuffer_refs[0].slot, 2);

    let shader_ref = &pass.shader_refs[0];
    assert_eq!(shader_ref.kind, ShaderRefKind::Vertex);
    assert!(matches!(
        &shader_ref.params[0].value,
        ParamValue::Auto { constant, .. } if constant == "worldviewproj_matrix"
    ));
    assert_eq!(shader_ref.params[1].key, ParamKey::Index(4));
    assert_eq!(shader_ref.params[1].element_type, BuiltinType::Int);
    assert_eq!(shader_ref.params[1].value, ParamValue::Int(vec![7, 0, 0, 0]));
}

#[test]
fn constant_buffer_alignment() {
    let mut aligned = GpuConstBuffer::new("a");
    aligned.add_declaration(BuiltinType::Real, 8).unwrap();
    aligned.add_declaration(BuiltinType::Real, 8).unwrap();
    assert!(aligned.bind_data(vec![0; 64]).is_ok());

    let mut misaligned = GpuConstBuffer::new("b");
    misaligned.add_declaration(BuiltinType::Real, 8).unwrap();
    misaligned.add_declaration(BuiltinType::Real, 9).unwrap();
    assert_eq!(
        misaligned.bind_data(vec![0; 68]),
        Err(ConstantBufferError::Misaligned { bytes: 68 })
    );
}

// =============================================================================
// Inheritance, abstract templates and variables
// =============================================================================

#[test]
fn inheritance_copies_base_properties() {
    let src = "abstract pass Glow\n{\n  lighting off\n  scene_blend add\n}\n\
               material M\n{\n  technique\n  {\n    pass : Glow\n    {\n      depth_write off\n    }\n  }\n}\n";
    let compiled = compile(src);
    assert!(compiled.is_clean(), "{:?}", compiled.diagnostics);
    assert_eq!(compiled.objects, 1);

    let (_, cache) = decode(&compiled.bytes);
    let pass = &cache.material("M").unwrap().techniques[0].passes[0];
    assert!(!pass.lighting);
    assert!(!pass.depth_write);
    assert_eq!(pass.scene_blend, SceneBlend::Mode(SceneBlendType::Add));
}

#[test]
fn derived_material_overrides_base() {
    let src = "material Base\n{\n  receive_shadows off\n  lod_strategy distance\n}\n\
               material Child : Base\n{\n  receive_shadows on\n}\n";
    let (_, cache) = decode(&compile(src).bytes);
    assert!(!cache.material("Base").unwrap().receive_shadows);
    let child = cache.material("Child").unwrap();
    assert!(child.receive_shadows);
    assert_eq!(child.lod_strategy.as_deref(), Some("distance"));
}

#[test]
fn variables_are_substituted() {
    let src = "set $tint \"0.5 0.25 1\"\nmaterial M\n{\n  technique\n  {\n    pass\n    {\n      diffuse $tint\n      emissive $missing\n    }\n  }\n}\n";
    let compiled = compile(src);
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].code, ErrorCode::UndefinedVariable);

    let (_, cache) = decode(&compiled.bytes);
    let pass = &cache.material("M").unwrap().techniques[0].passes[0];
    assert_eq!(pass.diffuse, ColourSource::Fixed(Vec4::new(0.5, 0.25, 1.0, 1.0)));
    assert_eq!(pass.emissive, ColourSource::Fixed(Vec4::ZERO));
}

// =============================================================================
// Best-effort translation
// =============================================================================

#[test]
fn nameless_material_is_dropped_and_siblings_survive() {
    let src = "material\n{\n}\nmaterial Named\n{\n}\n";
    let compiled = compile(src);
    assert_eq!(compiled.objects, 1);
    assert!(compiled
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::ObjectNameExpected));
    let (report, cache) = decode(&compiled.bytes);
    assert_eq!(report.objects, 1);
    assert!(cache.material("Named").is_some());
}

#[test]
fn overlong_name_is_reported_and_siblings_load() {
    let name = format!("{}é", "a".repeat(65534));
    let compiled = compile(&format!("material {name}\n{{\n}}\nmaterial Ok\n{{\n}}\n"));
    assert_eq!(compiled.objects, 1);
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].code, ErrorCode::InvalidParameters);

    let (report, cache) = decode(&compiled.bytes);
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(cache.len(), 1);
    assert!(cache.material("Ok").is_some());
}

#[test]
fn material_with_too_many_children_still_loads() {
    let body = "  receive_shadows on\n".repeat(65536);
    let compiled = compile(&format!("material Big\n{{\n{body}}}\n"));
    assert_eq!(compiled.objects, 1);
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].code, ErrorCode::InvalidParameters);

    let (report, cache) = decode(&compiled.bytes);
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(cache.material("Big").unwrap().receive_shadows);
}

#[test]
fn object_named_through_a_variable() {
    let compiled = compile("set $n Rock\nmaterial $n\n{\n  receive_shadows off\n}\n");
    assert!(compiled.is_clean(), "{:?}", compiled.diagnostics);
    let (_, cache) = decode(&compiled.bytes);
    assert!(!cache.material("Rock").unwrap().receive_shadows);
    assert!(cache.material("$n").is_none());
}
