pub mod audit;
pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "recova",
    about = "Recova operator CLI",
    long_about = "Inspect effective engine configuration, run deterministic smoke validation, \
                  and replay scripted borrower conversations through the engine.",
    after_help = "Examples:\n  recova config\n  recova smoke\n  recova simulate --file turns.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Run deterministic end-to-end engine checks with per-check timing")]
    Smoke,
    #[command(about = "Replay a scripted conversation file through the engine")]
    Simulate {
        #[arg(long, help = "Path to a JSON conversation script")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Smoke => commands::smoke::run(),
        Command::Simulate { file } => commands::simulate::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
