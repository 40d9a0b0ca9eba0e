//! matscript: compile material scripts to `.tsc` and inspect the results.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info};

use matscript::compiler::{default_options_path, load_options, CompilerOptions, ScriptCompiler};
use matscript::resource::ResourceCache;
use matscript::runtime::ScriptDecoder;

#[derive(Debug, Parser)]
#[command(name = "matscript", version, about = "Material script compiler")]
struct Cli {
    /// Script files to compile, or compiled files with --inspect.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Inputs are relative to this directory.
    #[arg(short = 'p', long = "project-dir", value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Where compiled files go (default: next to each input).
    #[arg(short = 'd', long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Name of the linked output (default: a.tsc).
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,

    /// Concatenate every compiled file into one.
    #[arg(short = 'l', long)]
    link: bool,

    /// Extra directory searched by `import`. May be repeated.
    #[arg(short = 'I', long = "import-path", value_name = "DIR")]
    import_paths: Vec<PathBuf>,

    /// Decode each output after writing it.
    #[arg(long)]
    verify: bool,

    /// Decode compiled files and print their contents.
    #[arg(long)]
    inspect: bool,

    /// Output format for --inspect.
    #[arg(long, value_enum, default_value_t = InspectFormat::Yaml)]
    format: InspectFormat,

    /// Options file (default: ~/.matscript/config.yaml).
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only print warnings and errors.
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print per-object progress.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

impl Cli {
    /// File options with command line flags applied on top.
    fn options(&self) -> Result<CompilerOptions, matscript::script::CompileError> {
        let path = self.config.clone().unwrap_or_else(default_options_path);
        let mut options = load_options(&path)?;
        if self.project_dir.is_some() {
            options.project_dir = self.project_dir.clone();
        }
        if self.output_dir.is_some() {
            options.output_dir = self.output_dir.clone();
        }
        if self.output.is_some() {
            options.output_file = self.output.clone();
        }
        options.link |= self.link;
        options.verify |= self.verify;
        options.import_paths.extend(self.import_paths.iter().cloned());
        Ok(options)
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    let ok = if cli.inspect {
        inspect(&cli)
    } else {
        compile(&cli)
    };
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn compile(cli: &Cli) -> bool {
    let options = match cli.options() {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            return false;
        }
    };
    let compiler = ScriptCompiler::new(options);
    match compiler.compile(&cli.inputs) {
        Ok(reports) => !reports.iter().any(|r| r.has_errors()),
        Err(e) => {
            error!("{e}");
            false
        }
    }
}

fn inspect(cli: &Cli) -> bool {
    let mut ok = true;
    for input in &cli.inputs {
        let path = match &cli.project_dir {
            Some(dir) if input.is_relative() => dir.join(input),
            _ => input.clone(),
        };
        match inspect_file(&path, cli.format) {
            Ok(clean) => ok &= clean,
            Err(e) => {
                error!("{}: {e}", path.display());
                ok = false;
            }
        }
    }
    ok
}

fn inspect_file(path: &Path, format: InspectFormat) -> Result<bool, Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut cache = ResourceCache::new();
    let report = ScriptDecoder::decode(&mut reader, &mut cache)?;
    info!("{}: format {:#06x}, {} objects", path.display(), report.version, report.objects);
    match format {
        InspectFormat::Yaml => print!("{}", serde_yaml::to_string(&cache)?),
        InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&cache)?),
    }
    Ok(report.is_clean())
}
