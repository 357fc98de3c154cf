//! `acc` – compiles an AgentC program, given as a JSON program source, into
//! a Rust module.
//!
//! ```text
//! acc program.json --inherited host.json --config acc.toml --output agent.rs
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use agentc::config::GeneratorOptions;
use agentc::tree::{InheritedDeclarations, ProgramSource};
use agentc::{compile, AgentcError};

#[derive(Parser, Debug)]
#[command(name = "acc", version, about = "The AgentC compiler")]
struct Cli {
    /// Program source (JSON)
    program: PathBuf,
    /// Declarations inherited from the host (JSON)
    #[arg(long, value_name = "FILE")]
    inherited: Option<PathBuf>,
    /// Generator options (TOML, JSON, ..)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Where to write the module; stdout when absent
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> agentc::Result<()> {
    let options = GeneratorOptions::load(cli.config.as_deref())?;
    let options = match &options.source_name {
        Some(_) => options,
        None => options.with_source_name(cli.program.display().to_string()),
    };
    let inherited = match &cli.inherited {
        Some(path) => Some(InheritedDeclarations::from_json(&fs::read_to_string(path)?)?),
        None => None,
    };
    let source = ProgramSource::from_json(&fs::read_to_string(&cli.program)?)?;
    let mut tree = source.into_tree(inherited.as_ref())?;
    let code = compile(&mut tree, &options)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, code)?;
            info!(output = %path.display(), "Wrote module");
        }
        None => print!("{}", code),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AgentcError::Semantic(e)) => {
            eprintln!("{}: {}", cli.program.display(), e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Compilation failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
