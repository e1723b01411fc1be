use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod console;
mod error;
mod formatters;

use error::CliError;
use formatters::FormatMode;

#[derive(Parser)]
#[command(name = "emv-reader")]
#[command(about = "EMV Reader - Discover and read payment applications on EMV cards")]
#[command(version)]
struct Args {
    /// Output format mode
    #[arg(short, long, value_enum, default_value_t = FormatMode::Human, global = true)]
    format: FormatMode,

    /// Terminal configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover applications through the payment system directory and read them
    Read {
        /// Read only this application (hex AID)
        #[arg(long)]
        aid: Option<String>,
        /// Use the contact PSE (1PAY.SYS.DDF01) instead of the PPSE
        #[arg(long)]
        contact: bool,
    },
    /// Select one application directly
    Select {
        /// Application identifier (hex)
        #[arg(long)]
        aid: String,
        /// Select only, for non-payment applications
        #[arg(long)]
        other: bool,
    },
    /// Wait for cards and read each one as it is tapped
    Watch,
    /// Run a payment session against a recorded trace
    Replay {
        /// Trace file of `>>` command and `<<` response hex lines
        file: PathBuf,
    },
    /// Decode TLV data offline
    Dump {
        /// TLV bytes (hex)
        hex: String,
        /// Resolve tags in the context of this application (hex AID)
        #[arg(long)]
        aid: Option<String>,
    },
    /// List the tags the registry knows
    Tags {
        /// Payment system scope to list (hex RID); global scope when omitted
        #[arg(long)]
        rid: Option<String>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing subscriber with environment-based filtering
    // Set RUST_LOG=debug for detailed logs, RUST_LOG=trace for very verbose
    // Default: info level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mode = args.format;
    let config = args.config.as_deref();

    match args.command {
        Command::Read { aid, contact } => commands::read::cmd_read(aid.as_deref(), contact, config, mode),
        Command::Select { aid, other } => commands::read::cmd_select(&aid, other, config, mode),
        Command::Watch => commands::watch::cmd_watch(config, mode),
        Command::Replay { file } => commands::read::cmd_replay(&file, config, mode),
        Command::Dump { hex, aid } => commands::dump::cmd_dump(&hex, aid.as_deref(), mode),
        Command::Tags { rid } => commands::tags::cmd_tags(rid.as_deref()),
    }
}
