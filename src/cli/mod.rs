use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::ExpenseService;
use crate::domain::{
    ParticipantInput, SplitMethod, UserId, compute_split, format_millis,
};
use crate::io::{Exporter, SheetKind};

/// Divvy - Shared Expense Ledger
#[derive(Parser)]
#[command(name = "divvy")]
#[command(about = "Split shared expenses and record who owes what")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, global = true, env = "DIVVY_DATABASE", default_value = "divvy.db")]
    pub database: String,

    /// Log filter (e.g. "info", "divvy=debug")
    #[arg(long, global = true, env = "DIVVY_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "DIVVY_BIND", default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, env = "DIVVY_PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Preview how an amount would be split, without touching the database
    Split {
        /// Total amount (e.g. "100" or "100.50")
        amount: String,

        /// Split method: equal, exact, percentage
        #[arg(short, long)]
        method: String,

        /// User ID of the expense creator
        #[arg(long)]
        creator: UserId,

        /// Participant as ID or ID=VALUE (repeatable)
        #[arg(short, long = "participant", required = true)]
        participants: Vec<String>,
    },

    /// Export a balance sheet to CSV
    Export {
        /// Sheet to export: individual, overall
        sheet: String,

        /// Only expenses on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                ExpenseService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve { bind, port } => {
                let service = ExpenseService::init(&self.database).await?;
                let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
                    .await
                    .with_context(|| format!("Failed to bind {}:{}", bind, port))?;
                crate::api::run_with_listener(service, listener).await?;
            }

            Commands::Split {
                amount,
                method,
                creator,
                participants,
            } => {
                run_split_command(&amount, &method, creator, &participants)?;
            }

            Commands::Export {
                sheet,
                date,
                output,
            } => {
                let service = ExpenseService::connect(&self.database).await?;
                run_export_command(&service, &sheet, date.as_deref(), output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

fn run_split_command(
    amount: &str,
    method: &str,
    creator: UserId,
    participants: &[String],
) -> Result<()> {
    let method = SplitMethod::from_str(method).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid split method '{}'. Valid methods: equal, exact, percentage",
            method
        )
    })?;

    let inputs = participants
        .iter()
        .map(|arg| parse_participant_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    let shares = compute_split(amount, method, creator, &inputs)?;

    println!("{:<12} {:>14}", "PARTICIPANT", "OWES");
    println!("{}", "-".repeat(27));
    for share in &shares {
        println!(
            "{:<12} {:>14}",
            share.participant_id,
            format_millis(share.amount)
        );
    }
    println!("{}", "-".repeat(27));
    println!(
        "{:<12} {:>14}",
        "TOTAL",
        format_millis(shares.iter().map(|s| s.amount).sum())
    );
    Ok(())
}

/// Parse `ID` or `ID=VALUE`.
fn parse_participant_arg(arg: &str) -> Result<ParticipantInput> {
    let (id, value) = match arg.split_once('=') {
        Some((id, value)) => (id, Some(value.trim().to_string())),
        None => (arg, None),
    };
    let id: UserId = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid participant ID: '{}'", id))?;
    Ok(ParticipantInput::new(id, value))
}

async fn run_export_command(
    service: &ExpenseService,
    sheet: &str,
    date: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    use std::fs::File;
    use std::io::{Write, stdout};

    let kind = SheetKind::from_str(sheet).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid sheet '{}'. Valid sheets: individual, overall",
            sheet
        )
    })?;

    let balance_sheet = service.balance_sheet(date).await?;

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = Exporter::new(&balance_sheet).export_csv(kind, writer)?;
    if let Some(path) = output {
        eprintln!("Exported {} rows to {}", count, path);
    }
    Ok(())
}
