#![forbid(unsafe_code)]

mod commands;
mod exit_code;
mod output;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jceks_core::{Reporter, SilentReporter, StreamReporter};

use crate::commands::{completions, copy, list, show};

/// Show and copy secret keys stored in JCEKS keystores
#[derive(Parser)]
#[command(name = "jceks-tool")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Print a secret key
    jceks-tool show -k vault.jceks -p mpass -a db-secret -e epass

    # Same, reading both passwords from files
    jceks-tool show -k vault.jceks -f master.txt -a db-secret -n entry.txt

    # Copy a secret key into another keystore under new passwords
    jceks-tool copy -s vault.jceks -p mpass -a db-secret -e epass \\
                    -t target.jceks -o tpass -l db-secret -r tepass

    # List the entries of a keystore
    jceks-tool list -k vault.jceks -p mpass")]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress progress output (results and errors are still printed)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of a secret key entry
    Show(show::Args),

    /// Copy a secret key entry into another (or the same) keystore
    Copy(copy::Args),

    /// List the entries of a keystore without decrypting them
    List(list::Args),

    /// Generate shell completions
    Completions(completions::Args),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; everything else is a usage error
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(exit_code::USAGE_ERROR)
            } else {
                ExitCode::from(exit_code::SUCCESS)
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            // Errors are printed even with --quiet
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code::GENERAL_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let mut reporter: Box<dyn Reporter> = if cli.quiet {
        Box::new(SilentReporter)
    } else {
        Box::new(StreamReporter::new(io::stderr()))
    };

    match cli.command {
        Commands::Show(args) => show::execute(args, reporter.as_mut()),
        Commands::Copy(args) => copy::execute(args, reporter.as_mut()),
        Commands::List(args) => list::execute(args, reporter.as_mut()),
        Commands::Completions(args) => completions::execute(&args),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(io::stderr)
        .init();
}
