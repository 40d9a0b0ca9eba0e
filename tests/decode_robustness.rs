//! Decoder robustness: damaged and hostile streams must fail cleanly, never panic.

use std::io::Cursor;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use matscript::compiler::{CompilerOptions, ScriptCompiler};
use matscript::opcode::Opcode;
use matscript::resource::ResourceCache;
use matscript::runtime::{DecodeError, ParseState, ScriptDecoder};
use matscript::wire::{FileHeader, WireWriter};

const SEED: u64 = 42;

const SCRIPT: &str = "sampler Linear\n{\n  filtering trilinear\n}\n\
material Rock\n{\n  technique\n  {\n    pass\n    {\n      ambient 0.2 0.2 0.2\n      scene_blend alpha_blend\n      texture_unit\n      {\n        texture rock.png\n        wave_xform scroll_x sine 0 0.25 0 1\n      }\n    }\n  }\n}\n\
gpu_cbuffer Globals\n{\n  param_named tint float4 1 1 1 1\n}\n";

fn compiled() -> Vec<u8> {
    let compiled = ScriptCompiler::new(CompilerOptions::default())
        .compile_source(SCRIPT, "rock.material")
        .expect("compile failed");
    assert!(compiled.is_clean(), "{:?}", compiled.diagnostics);
    compiled.bytes
}

fn decode(bytes: &[u8]) -> Result<(usize, usize), DecodeError> {
    let mut cache = ResourceCache::new();
    let report = ScriptDecoder::decode(&mut Cursor::new(bytes), &mut cache)?;
    assert!(cache.len() <= report.objects);
    Ok((report.objects, report.failures.len()))
}

#[test]
fn intact_stream_decodes_fully() {
    assert_eq!(decode(&compiled()).unwrap(), (3, 0));
}

#[test]
fn every_truncation_is_handled() {
    let bytes = compiled();
    for len in 0..bytes.len() {
        match decode(&bytes[..len]) {
            Ok((objects, _)) => assert!(objects < 3, "length {len} decoded everything"),
            Err(DecodeError::ShortRead { .. }) => assert!(len < 8),
            Err(other) => panic!("unexpected error at length {len}: {other}"),
        }
    }
}

#[test]
fn seeded_corruption_never_panics() {
    let bytes = compiled();
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    for _ in 0..2000 {
        let mut corrupt = bytes.clone();
        for _ in 0..rng.gen_range(1..8) {
            let at = rng.gen_range(0..corrupt.len());
            corrupt[at] = rng.gen();
        }
        if rng.gen_bool(0.3) {
            let cut = rng.gen_range(0..=corrupt.len());
            corrupt.truncate(cut);
        }
        let _ = decode(&corrupt);
    }
}

#[test]
fn damaged_object_does_not_hide_later_ones() {
    let mut w = WireWriter::new();
    FileHeader::current().write(&mut w);
    let mut pass = WireWriter::new();
    // blend factor where a blend mode is expected
    let mut blend = WireWriter::new();
    blend.write_u16(1);
    blend.write_opcode(Opcode::SrcAlpha);
    pass.write_property(Opcode::SceneBlend, blend.as_bytes());
    let mut technique = WireWriter::new();
    technique.write_object(Opcode::Pass, "", 1, pass.as_bytes());
    let mut material = WireWriter::new();
    material.write_object(Opcode::Technique, "", 1, technique.as_bytes());
    w.write_object(Opcode::Material, "Broken", 1, material.as_bytes());
    w.write_object(Opcode::Sampler, "After", 0, &[]);

    let mut cache = ResourceCache::new();
    let report = ScriptDecoder::decode(&mut Cursor::new(w.into_bytes()), &mut cache).unwrap();
    assert_eq!(report.objects, 1);
    assert_eq!(report.failures[0].name, "Broken");
    assert_eq!(report.failures[0].state, ParseState::ChildLoop);
    assert!(matches!(
        report.failures[0].error,
        DecodeError::InvalidValue { .. }
    ));
    assert!(cache.material("Broken").is_none());
    assert!(cache.sampler("After").is_some());
    assert_eq!(cache.failures[0].name, "Broken");
}

#[test]
fn unknown_opcode_in_material_fails_that_material_only() {
    let mut w = WireWriter::new();
    FileHeader::current().write(&mut w);
    let mut body = WireWriter::new();
    body.write_property(Opcode::Slot, &0u32.to_le_bytes());
    w.write_object(Opcode::Material, "Odd", 1, body.as_bytes());
    w.write_object(Opcode::Material, "Fine", 0, &[]);

    let mut cache = ResourceCache::new();
    let report = ScriptDecoder::decode(&mut Cursor::new(w.into_bytes()), &mut cache).unwrap();
    assert!(matches!(
        report.failures[0].error,
        DecodeError::UnknownOpcode {
            object: "material",
            ..
        }
    ));
    assert!(cache.material("Fine").is_some());
}
