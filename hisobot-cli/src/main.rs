//! Hisobot CLI - family finances in a chat, driven from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{chat, digest, remind, report};

/// Hisobot - chat-driven family finance tracker
#[derive(Parser)]
#[command(name = "hisobot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session against the local ledger
    Chat {
        /// Chat id to speak as (defaults to the configured owner)
        #[arg(long)]
        chat_id: Option<String>,
    },

    /// Run the daily debt reminder sweep
    Remind {
        /// Sweep date in DD.MM.YYYY form (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push the weekly digest to every active owner
    Digest {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the transaction report
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chat { chat_id } => chat::run(chat_id),
        Commands::Remind { date, json } => remind::run(date.as_deref(), json),
        Commands::Digest { json } => digest::run(json),
        Commands::Report { json } => report::run(json),
    }
}
