pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use stocktalk_db::DEMO_ACCOUNT_ID;

#[derive(Debug, Parser)]
#[command(
    name = "stocktalk",
    about = "Stocktalk operator CLI",
    long_about = "Operate the Stocktalk inventory assistant: migrations, demo data, config \
                  inspection, readiness checks, and one-shot questions.",
    after_help = "Examples:\n  stocktalk doctor --json\n  stocktalk seed\n  \
                  stocktalk context \"what sold best this month?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace the demo account's inventory with the sample dataset")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, model settings, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show the intents and inventory context a message would produce")]
    Context {
        #[arg(help = "Message to classify")]
        message: String,
        #[arg(long, default_value = DEMO_ACCOUNT_ID, help = "Account whose inventory is read")]
        account: String,
    },
    #[command(about = "Ask the assistant a single question")]
    Ask {
        #[arg(help = "Question for the assistant")]
        message: String,
        #[arg(long, default_value = DEMO_ACCOUNT_ID, help = "Account whose inventory is read")]
        account: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Context { message, account } => commands::context::run(&account, &message),
        Command::Ask { message, account } => commands::ask::run(&account, &message),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
