//! hrw4u: compile hrw4u source into header_rewrite rules

use clap::Parser;
use hrw4u_cli::{init, write_batch_output, write_output};
use hrw4u_compiler::batch::{self, BatchConfig};
use hrw4u_compiler::config::runtime::RuntimeConfig;
use hrw4u_compiler::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hrw4u", version)]
#[command(about = "Compile hrw4u source into header_rewrite rules", long_about = None)]
struct Cli {
    /// Input .hrw4u file, or a directory with --batch
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (single file) or directory (--batch); stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Trace the tree walk on stderr
    #[arg(short, long)]
    debug: bool,

    /// Print the symbol table report as JSON on stderr after compiling
    #[arg(long)]
    validate: bool,

    /// Treat INPUT as a directory of .hrw4u files
    #[arg(long)]
    batch: bool,

    /// With --batch, only look at the top level of INPUT
    #[arg(long)]
    no_recursive: bool,

    /// With --batch, number of worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// With --batch, stop after the first failing file
    #[arg(long)]
    fail_fast: bool,

    /// Runtime preferences file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match init(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };
    if cli.debug {
        config.compiler.debug_tracing = true;
    }

    if cli.batch {
        compile_batch(&cli, config)
    } else {
        compile_single(&cli, &config)
    }
}

fn compile_single(cli: &Cli, config: &RuntimeConfig) -> ExitCode {
    let compilation =
        match pipeline::compile_file(&cli.input, &config.file_processor, &config.compiler) {
            Ok(compilation) => compilation,
            Err(e) => {
                eprintln!("error: {}: {}", cli.input.display(), e);
                return ExitCode::FAILURE;
            }
        };

    let output = match compilation.into_result() {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_output(cli.output.as_deref(), &output.text()) {
        eprintln!("error: writing output: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.validate {
        match serde_json::to_string_pretty(&output.symbols.validate()) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => {
                eprintln!("error: serializing symbol report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn compile_batch(cli: &Cli, config: RuntimeConfig) -> ExitCode {
    let mut batch_config = BatchConfig {
        recursive: !cli.no_recursive,
        fail_fast: cli.fail_fast,
        file_preferences: config.file_processor,
        compiler_preferences: config.compiler,
        ..BatchConfig::default()
    };
    if let Some(threads) = cli.threads {
        batch_config.max_threads = threads;
    }

    let results = match batch::compile_directory(&cli.input, &batch_config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = cli.output.as_deref() {
        for (path, output) in &results.successful_files {
            if let Err(e) = write_batch_output(&cli.input, dir, path, &output.text()) {
                eprintln!("error: writing output for {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    for (path, error) in &results.failed_files {
        eprintln!("{}:\n{}\n", path.display(), error);
    }
    eprintln!("{}", results.summary());

    if results.failure_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

