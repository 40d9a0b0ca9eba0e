//! Compile driver: script files in, `.tsc` files out.
//!
//! Each input goes through the whole pipeline on its own. A syntax error
//! aborts that file; every other problem becomes a diagnostic and the
//! offending property or object is left out of the output.

pub mod config;

pub use config::{default_options_path, load_options, CompilerOptions};

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::resource::ResourceCache;
use crate::runtime::ScriptDecoder;
use crate::script::{CompileError, Diagnostic, ScriptParser};
use crate::translate::{translate_top_level, TranslateContext};
use crate::wire::{FileHeader, StreamReader, WireWriter, FILE_HEADER_LEN};

/// The result of compiling one source text in memory.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    /// Header followed by every emitted object.
    pub bytes: Vec<u8>,
    pub objects: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledScript {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Outcome of compiling one file to disk.
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes: usize,
    pub objects: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Objects that failed to decode again. Only counted with `verify`.
    pub decode_failures: usize,
}

impl CompileReport {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty() || self.decode_failures > 0
    }
}

pub struct ScriptCompiler {
    options: CompilerOptions,
}

impl ScriptCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Runs the pipeline over `source`. `file` names the source in
    /// diagnostics and anchors relative imports.
    pub fn compile_source(&self, source: &str, file: &str) -> Result<CompiledScript, CompileError> {
        let (ast, mut diagnostics) =
            ScriptParser::parse(source, file, &self.options.import_paths)
                .map_err(CompileError::Syntax)?;
        for d in &diagnostics {
            warn!("{d}");
        }

        let mut out = WireWriter::new();
        FileHeader::current().write(&mut out);
        let mut cx = TranslateContext::new(&ast);
        let objects = ast
            .objects()
            .filter(|&id| translate_top_level(&mut cx, id, &mut out))
            .count();
        diagnostics.extend(cx.into_diagnostics());

        Ok(CompiledScript {
            bytes: out.into_bytes(),
            objects,
            diagnostics,
        })
    }

    /// Compiles `input` into `output`, creating parent directories.
    pub fn compile_file(&self, input: &Path, output: &Path) -> Result<CompileReport, CompileError> {
        if !input.exists() {
            return Err(CompileError::MissingInput(input.to_path_buf()));
        }
        let source = fs::read_to_string(input).map_err(|e| CompileError::io(input, e))?;
        let compiled = self.compile_source(&source, &input.display().to_string())?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
        }
        fs::write(output, &compiled.bytes).map_err(|e| CompileError::io(output, e))?;
        info!(
            "{} -> {} ({} bytes, {} objects, {} diagnostics)",
            input.display(),
            output.display(),
            compiled.bytes.len(),
            compiled.objects,
            compiled.diagnostics.len()
        );

        let decode_failures = if self.options.verify {
            verify(output, &compiled.bytes)
        } else {
            0
        };
        Ok(CompileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bytes: compiled.bytes.len(),
            objects: compiled.objects,
            diagnostics: compiled.diagnostics,
            decode_failures,
        })
    }

    /// Compiles every input, then links the outputs when `link` is set.
    /// Stops at the first file that cannot be compiled at all.
    pub fn compile(&self, inputs: &[PathBuf]) -> Result<Vec<CompileReport>, CompileError> {
        let mut reports = Vec::with_capacity(inputs.len());
        for input in inputs {
            let input = self.options.resolve_input(input);
            let output = self.options.output_for(&input);
            reports.push(self.compile_file(&input, &output)?);
        }

        if self.options.link {
            let outputs: Vec<PathBuf> = reports.iter().map(|r| r.output.clone()).collect();
            Self::link(&outputs, &self.options.link_output())?;
        }
        Ok(reports)
    }

    /// Writes one header followed by the object section of every input.
    pub fn link(inputs: &[PathBuf], output: &Path) -> Result<(), CompileError> {
        let mut out = WireWriter::new();
        FileHeader::current().write(&mut out);
        for input in inputs {
            let bytes = fs::read(input).map_err(|e| CompileError::io(input, e))?;
            check_header(input, &bytes)?;
            out.write_bytes(&bytes[FILE_HEADER_LEN..]);
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
        }
        fs::write(output, out.as_bytes()).map_err(|e| CompileError::io(output, e))?;
        info!(
            "linked {} files into {} ({} bytes)",
            inputs.len(),
            output.display(),
            out.len()
        );
        Ok(())
    }
}

fn check_header(path: &Path, bytes: &[u8]) -> Result<(), CompileError> {
    let link_error = |reason: String| CompileError::Link {
        path: path.to_path_buf(),
        reason,
    };
    let header = StreamReader::new(Cursor::new(bytes))
        .read_header()
        .map_err(|e| link_error(e.to_string()))?;
    if !header.is_valid_magic() {
        return Err(link_error("not a compiled material script".into()));
    }
    if !header.is_supported() {
        return Err(link_error(format!(
            "unsupported format version {:#06x}",
            header.version
        )));
    }
    Ok(())
}

fn verify(output: &Path, bytes: &[u8]) -> usize {
    let mut cache = ResourceCache::new();
    match ScriptDecoder::decode(&mut Cursor::new(bytes), &mut cache) {
        Ok(report) => {
            for failure in &report.failures {
                warn!(
                    "{}: '{}' does not decode: {}",
                    output.display(),
                    failure.name,
                    failure.error
                );
            }
            report.failures.len()
        }
        Err(e) => {
            warn!("{}: {e}", output.display());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ErrorCode;

    const WALL: &str = "material Wall\n{\n  technique\n  {\n    pass\n    {\n      ambient 0.1 0.2 0.3\n    }\n  }\n}\n";

    #[test]
    fn compile_source_counts_objects() {
        let compiler = ScriptCompiler::new(CompilerOptions::default());
        let compiled = compiler
            .compile_source(&format!("{WALL}sampler Linear\n{{\n}}\n"), "wall.material")
            .unwrap();
        assert_eq!(compiled.objects, 2);
        assert!(compiled.is_clean());
        assert_eq!(&compiled.bytes[..4], b"TSC\0");
    }

    #[test]
    fn syntax_error_aborts_the_file() {
        let compiler = ScriptCompiler::new(CompilerOptions::default());
        let err = compiler.compile_source("material M\n{\n", "m.material").unwrap_err();
        match err {
            CompileError::Syntax(d) => assert_eq!(d.code, ErrorCode::UnbalancedBraces),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn missing_input_is_reported_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = ScriptCompiler::new(CompilerOptions::default());
        let input = dir.path().join("nope.material");
        let err = compiler
            .compile_file(&input, &dir.path().join("nope.tsc"))
            .unwrap_err();
        assert!(matches!(err, CompileError::MissingInput(p) if p == input));
    }

    #[test]
    fn compile_file_creates_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wall.material");
        fs::write(&input, WALL).unwrap();
        let output = dir.path().join("out/nested/wall.tsc");

        let compiler = ScriptCompiler::new(CompilerOptions {
            verify: true,
            ..CompilerOptions::default()
        });
        let report = compiler.compile_file(&input, &output).unwrap();
        assert_eq!(report.objects, 1);
        assert!(!report.has_errors());
        assert_eq!(fs::metadata(&output).unwrap().len() as usize, report.bytes);
    }

    #[test]
    fn link_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.tsc");
        fs::write(&bogus, b"not a compiled file").unwrap();
        let err = ScriptCompiler::link(&[bogus], &dir.path().join("a.tsc")).unwrap_err();
        assert!(matches!(err, CompileError::Link { .. }));
    }
}
