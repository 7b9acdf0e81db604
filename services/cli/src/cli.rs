use crate::commands::{run_auth_login, run_auth_reset, run_onboarding, run_preview};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use onboard_buddy::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Onboard Buddy",
    about = "Welcome upcoming new hires by email, chat and calendar invite",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Notify every hire starting within the window (default command)
    Run(SourceArgs),
    /// List the hires a run would notify without sending anything
    Preview(PreviewArgs),
    /// Manage the cached Google authorization
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Run the browser consent flow (if needed) and cache the token
    Login,
    /// Delete the cached token so the next run asks for consent again
    Reset,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SourceArgs {
    /// Override the configured lookahead window (days)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) window_days: Option<i64>,
    /// Read the roster from a local CSV export instead of Google Sheets
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Evaluate the window from this date instead of today (YYYY-MM-DD, UTC)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(SourceArgs::default()));

    match command {
        Command::Run(args) => run_onboarding(args),
        Command::Preview(args) => run_preview(args),
        Command::Auth {
            command: AuthCommand::Login,
        } => run_auth_login(),
        Command::Auth {
            command: AuthCommand::Reset,
        } => run_auth_reset(),
    }
}
