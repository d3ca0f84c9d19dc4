pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::size::SizeArgs;

#[derive(Debug, Parser)]
#[command(
    name = "meesaya",
    about = "MeeSaya operator CLI",
    long_about = "Operate MeeSaya migrations, catalog seeding, readiness checks, and offline sizing.",
    after_help = "Examples:\n  meesaya doctor --json\n  meesaya seed\n  meesaya size --watts 2000 --hours 4 --housing home"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the reference catalog and knowledge base (idempotent)")]
    Seed,
    #[command(about = "Validate config, Telegram and LLM secrets, DB connectivity and catalog seed")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Size a backup system for a load using the configured catalog")]
    Size {
        #[arg(long, help = "Continuous load in watts")]
        watts: f64,
        #[arg(long, help = "Backup window in hours")]
        hours: f64,
        #[arg(long, default_value = "home", help = "home, apartment, condo or flat")]
        housing: String,
        #[arg(long, help = "Grid-charged build without solar panels")]
        no_solar: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Size { watts, hours, housing, no_solar } => {
            commands::size::run(&SizeArgs { watts, hours, housing, no_solar })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
