//! Compiler options: loads optional ~/.matscript/config.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::CompileError;

/// Link output name used when none is configured.
pub const DEFAULT_LINK_OUTPUT: &str = "a.tsc";

/// Options for a compile run. Command line flags override file values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CompilerOptions {
    /// Inputs are resolved relative to this directory.
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
    /// Where compiled files go. Defaults to next to each input.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// File name of the linked output.
    #[serde(default)]
    pub output_file: Option<String>,
    /// Concatenate every compiled file into one after compiling.
    #[serde(default)]
    pub link: bool,
    /// Extra directories searched by `import`.
    #[serde(default)]
    pub import_paths: Vec<PathBuf>,
    /// Decode each output after writing it.
    #[serde(default)]
    pub verify: bool,
}

impl CompilerOptions {
    pub fn resolve_input(&self, input: &Path) -> PathBuf {
        match &self.project_dir {
            Some(dir) if input.is_relative() => dir.join(input),
            _ => input.to_path_buf(),
        }
    }

    /// `<output_dir or input dir>/<stem>.tsc`
    pub fn output_for(&self, input: &Path) -> PathBuf {
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let stem = input.file_stem().unwrap_or(input.as_os_str());
        dir.join(format!("{}.tsc", stem.to_string_lossy()))
    }

    /// Where `link` writes: the output directory, else the project
    /// directory, else the working directory.
    pub fn link_output(&self) -> PathBuf {
        let name = self.output_file.as_deref().unwrap_or(DEFAULT_LINK_OUTPUT);
        let dir = self
            .output_dir
            .as_ref()
            .or(self.project_dir.as_ref())
            .cloned()
            .unwrap_or_default();
        dir.join(name)
    }
}

/// Default path for the options file.
pub fn default_options_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".matscript");
    path.push("config.yaml");
    path
}

/// Load options from a YAML file. Returns defaults if the file doesn't exist.
pub fn load_options(path: &Path) -> Result<CompilerOptions, CompileError> {
    if !path.exists() {
        return Ok(CompilerOptions::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| CompileError::Config(format!("{}: {e}", path.display())))
}
