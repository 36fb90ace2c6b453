pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "marea",
    about = "Marea operator CLI",
    long_about = "Operate the marea order-intake store: migrations, demo fixtures, budget inspection, and customer balances.",
    after_help = "Examples:\n  marea migrate\n  marea seed\n  marea show B-42\n  marea balance \"Delcy Rodriguez\" --bucket foreign"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo seafood catalog, exchange rate, and customer fixtures")]
    Seed,
    #[command(about = "Print one budget document as JSON")]
    Show {
        #[arg(help = "Budget id")]
        budget_id: String,
    },
    #[command(about = "Print a customer's outstanding balance per currency bucket")]
    Balance {
        #[arg(help = "Customer name (case-insensitive exact match)")]
        customer: String,
        #[arg(long, value_parser = ["local", "foreign", "both"], default_value = "both")]
        bucket: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Show { budget_id } => commands::show::run(&budget_id),
        Command::Balance { customer, bucket } => commands::balance::run(&customer, &bucket),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
