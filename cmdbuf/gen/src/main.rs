//! Command Buffer Code Generator
//!
//! Generates the wire formats, client marshaling, service decoder and
//! validators of a command-buffer protocol from its definition.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cmdbuf_gen::driver::{GenerateOptions, build_protocol_records, generate, load_protocol};
use cmdbuf_gen::errors::{Diagnostics, GeneratorError};
use colored::Colorize;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command buffer code generator - turns protocol definitions into client and service code
#[derive(Parser, Debug)]
#[command(name = "cmdbuf-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Protocol to generate code for
    #[arg(short, long, default_value = "raster")]
    protocol: String,

    /// Output directory for generated code
    #[arg(short, long, default_value = "gpu/command_buffer")]
    output_dir: PathBuf,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Print the built function records as JSON and exit
    #[arg(long)]
    dump_records: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(diagnostics) => {
            for err in diagnostics.errors() {
                eprintln!("{} {}", "error:".red().bold(), err);
            }
            eprintln!("{}", format!("{} errors", diagnostics.len()).red());
            ExitCode::FAILURE
        }
    }
}

/// Sets up stderr logging. `RUST_LOG` takes precedence over `-v` flags.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,cmdbuf_gen=info".to_string(),
            2 => "info,cmdbuf_gen=debug".to_string(),
            _ => "debug,cmdbuf_gen=trace".to_string(),
        },
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), Diagnostics> {
    let protocol = load_protocol(&cli.protocol)?;

    if cli.dump_records {
        let (records, _) = build_protocol_records(&protocol)?;
        let json = serde_json::to_string_pretty(&records).map_err(GeneratorError::from)?;
        println!("{}", json);
        return Ok(());
    }

    let options = GenerateOptions::new(&cli.output_dir).dry_run(cli.dry_run);
    let report = generate(&protocol, &options)?;

    if !cli.dry_run {
        eprintln!(
            "{} {} files ({} commands) to {}",
            "Generated".green(),
            report.artifacts.len(),
            report.commands,
            cli.output_dir.display()
        );
    }
    Ok(())
}
