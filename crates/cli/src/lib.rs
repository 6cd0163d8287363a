pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "showroom",
    about = "Showroom quotation operator CLI",
    long_about = "Operate the showroom quotation service: migrations, config inspection, readiness checks, quote history, and offline catalog/pricing helpers.",
    after_help = "Examples:\n  showroom doctor --json\n  showroom history list\n  showroom classify \"kohler 9272\"\n  showroom price quote.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, catalog index, and WhatsApp setup")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "List or delete stored quotations")]
    History(HistoryCommand),
    #[command(about = "Show whether a search query is routed as an exact or fuzzy lookup")]
    Classify {
        #[arg(help = "Search box text, e.g. `K-28362IN` or `wall hung toilet`")]
        query: String,
    },
    #[command(about = "Extract the listed price from raw catalog text")]
    ExtractPrice {
        #[arg(help = "Catalog text block")]
        text: String,
    },
    #[command(about = "Price a quotation JSON payload and print the cascade trace")]
    Price {
        #[arg(help = "Path to a quotation payload")]
        path: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    #[command(about = "List stored quotations, most recent first")]
    List,
    #[command(about = "Permanently delete a stored quotation")]
    Delete {
        #[arg(help = "Quotation record id")]
        id: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::History(HistoryCommand::List) => commands::history::list(),
        Command::History(HistoryCommand::Delete { id }) => commands::history::delete(&id),
        Command::Classify { query } => commands::classify::run(&query),
        Command::ExtractPrice { text } => commands::extract_price::run(&text),
        Command::Price { path } => commands::price::run(&path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
