//! u4wrh: turn header_rewrite rules back into hrw4u source

use clap::Parser;
use hrw4u_cli::{init, write_output};
use hrw4u_compiler::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "u4wrh", version)]
#[command(about = "Reverse compile header_rewrite rules into hrw4u source", long_about = None)]
struct Cli {
    /// Rule file to read
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Runtime preferences file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init(cli.config.as_deref()) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    let source = match pipeline::decompile_file(&cli.input).and_then(|d| d.into_result()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_output(cli.output.as_deref(), &source) {
        eprintln!("error: writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
