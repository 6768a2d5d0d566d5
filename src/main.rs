//! @ai:module:intent CLI entry point for the CDSSpec compiler
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on generator, config, output

use cdsspec_compiler::{generator, output, CodeGenerator, GeneratorConfig, OutputFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cdsspec")]
#[command(author, version, about = "CDSSpec compiler - instrument annotated C/C++ data structures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract annotations and write instrumented copies of the sources
    Generate {
        /// Root directory holding the benchmark directories
        input_dir: Option<PathBuf>,

        /// Root directory for generated files
        output_dir: Option<PathBuf>,

        /// Benchmark directories to process
        benchmarks: Vec<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Extract and validate the annotations of one directory
    Extract {
        /// Directory holding the annotated sources
        path: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Create a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "cdsspec.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cdsspec=info,cdsspec_compiler=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input_dir,
            output_dir,
            benchmarks,
            config,
        } => generate(input_dir, output_dir, benchmarks, config),
        Commands::Extract { path, format } => extract(path, format),
        Commands::Init { output } => init_config(output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Run one independent generation per benchmark directory
/// @ai:effects fs:read, fs:write
fn generate(
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    benchmarks: Vec<String>,
    config: Option<PathBuf>,
) -> cdsspec_compiler::Result<()> {
    let mut config = match config {
        Some(path) => GeneratorConfig::load(&path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = input_dir {
        config.paths.benchmarks_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.paths.generated_dir = dir;
    }
    if !benchmarks.is_empty() {
        config.run.benchmarks = benchmarks;
    }
    if config.run.benchmarks.is_empty() {
        tracing::warn!("No benchmark directories to process");
    }

    for benchmark in &config.run.benchmarks {
        let generator = CodeGenerator::new(config.input_dir(benchmark), config.output_dir(benchmark));
        let report = generator.generate()?;
        print!("{}", output::format_report(&report));
    }
    Ok(())
}

/// @ai:intent Print the validated construct model of one directory
/// @ai:effects fs:read
fn extract(path: PathBuf, format: Format) -> cdsspec_compiler::Result<()> {
    let files = generator::discover_source_files(&path)?;
    let model = cdsspec_compiler::extract_paths(&files)?;
    eprint!("{}", output::format_warnings(&model.diagnostics));
    println!("{}", output::format_model(&model, format.into())?);
    Ok(())
}

/// @ai:intent Write the default configuration
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> cdsspec_compiler::Result<()> {
    GeneratorConfig::default().save(&output)?;
    println!("Created default config at {}", output.display());
    Ok(())
}
