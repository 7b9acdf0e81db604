use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use onboard_buddy::config::{AppConfig, GoogleAuthConfig, TelemetryConfig};
use onboard_buddy::error::AppError;
use onboard_buddy::google::{
    authorize, BrowserConsentFlow, FileTokenStore, GoogleApiClient, GoogleCalendarClient,
    GoogleSheetsClient, GoogleToken, TokenStore, SCOPES,
};
use onboard_buddy::telemetry;
use onboard_buddy::workflows::onboarding::{
    upcoming_hires, CalendarNotifier, CalendarOutcome, ChatNotifier, CsvRosterSource,
    EmailNotifier, HireRecord, HttpWebhookTransport, OnboardingWorkflow, RosterSource, RunReport,
    window_end,
};
use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::{PreviewArgs, SourceArgs};

fn load_config(source: &SourceArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(window_days) = source.window_days {
        config.sheet.window_days = window_days;
    }
    if let Some(path) = &source.roster_csv {
        config.sheet.id = Some(path.display().to_string());
    }

    Ok(config)
}

/// Token maintenance only needs the OAuth file locations and logging.
fn load_auth_config() -> Result<GoogleAuthConfig, AppError> {
    telemetry::init(&TelemetryConfig::load())?;
    Ok(GoogleAuthConfig::load())
}

fn google_token(google: &GoogleAuthConfig, runtime: &Arc<Runtime>) -> Result<GoogleToken, AppError> {
    let store = FileTokenStore::new(&google.token_path);
    let flow = BrowserConsentFlow::new(&google.credentials_path, runtime.clone());
    Ok(authorize(&store, &flow, SCOPES, Utc::now())?)
}

fn roster_source(source: &SourceArgs, api: Option<&GoogleApiClient>) -> Box<dyn RosterSource> {
    match (source.roster_csv.is_some(), api) {
        (false, Some(api)) => Box::new(GoogleSheetsClient::new(api.clone())),
        _ => Box::new(CsvRosterSource),
    }
}

pub(crate) fn run_onboarding(args: SourceArgs) -> Result<(), AppError> {
    let config = load_config(&args)?;
    config.sheet.require_id()?;

    let runtime = Arc::new(Runtime::new()?);
    let token = google_token(&config.google, &runtime)?;
    let api = GoogleApiClient::new(runtime.clone(), &token);

    let workflow = OnboardingWorkflow::new(
        config.sheet.clone(),
        roster_source(&args, Some(&api)),
        EmailNotifier::from_config(&config.mail),
        ChatNotifier::new(&config.chat, Box::new(HttpWebhookTransport::new(runtime.clone()))),
        CalendarNotifier::new(&config.calendar, Box::new(GoogleCalendarClient::new(api))),
    );

    let today = Utc::now().date_naive();
    info!(environment = ?config.environment, %today, "starting onboarding run");
    let report = workflow.run(today)?;
    render_run_report(&report);
    Ok(())
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let PreviewArgs { source, today } = args;
    let config = load_config(&source)?;
    config.sheet.require_id()?;

    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let roster = if source.roster_csv.is_some() {
        roster_source(&source, None)
    } else {
        let runtime = Arc::new(Runtime::new()?);
        let token = google_token(&config.google, &runtime)?;
        roster_source(&source, Some(&GoogleApiClient::new(runtime, &token)))
    };

    let (rows, hires) = upcoming_hires(roster.as_ref(), &config.sheet, today)?;
    render_preview(&config, rows, &hires, today);
    Ok(())
}

pub(crate) fn run_auth_login() -> Result<(), AppError> {
    let google = load_auth_config()?;
    let runtime = Arc::new(Runtime::new()?);
    let token = google_token(&google, &runtime)?;

    println!(
        "Authorized for {} scope(s); token cached at {}",
        token.scopes.len(),
        google.token_path.display()
    );
    Ok(())
}

pub(crate) fn run_auth_reset() -> Result<(), AppError> {
    let google = load_auth_config()?;
    let store = FileTokenStore::new(&google.token_path);
    store.delete()?;

    println!(
        "Removed cached token at {}; the next run will ask for consent",
        store.path().display()
    );
    Ok(())
}

fn render_run_report(report: &RunReport) {
    println!("Onboarding run");
    println!(
        "Rows fetched: {} | window: {} day(s) | hires processed: {}",
        report.rows_fetched,
        report.window_days,
        report.outcomes.len()
    );

    if report.outcomes.is_empty() {
        println!("Nothing to process.");
        return;
    }

    for outcome in &report.outcomes {
        let calendar = match &outcome.calendar {
            CalendarOutcome::Created { link: Some(link) } => link.clone(),
            CalendarOutcome::Created { link: None } => "created (no link returned)".to_string(),
            CalendarOutcome::Failed { reason } => format!("FAILED ({reason})"),
        };
        println!(
            "- {} <{}> starts {} | email={} chat={} | event: {}",
            outcome.hire.name,
            outcome.hire.email,
            outcome.hire.start_date,
            outcome.email_sent,
            outcome.chat_posted,
            calendar
        );
    }

    println!(
        "\n{}/{} hire(s) fully notified",
        report.fully_delivered(),
        report.outcomes.len()
    );
}

fn render_preview(config: &AppConfig, rows: usize, hires: &[HireRecord], today: NaiveDate) {
    println!("Onboarding preview (nothing will be sent)");
    let last_day = window_end(today, config.sheet.window_days)
        .map(|date| date.to_string())
        .unwrap_or_else(|| "open-ended".to_string());
    println!(
        "Window: {} -> {} ({} day(s)), {} row(s) read",
        today, last_day, config.sheet.window_days, rows
    );

    if hires.is_empty() {
        println!("\nUpcoming hires: none");
        return;
    }

    println!("\nUpcoming hires");
    for hire in hires {
        println!(
            "- {} | {} | {} | starts {} | manager {}",
            hire.name, hire.email, hire.department, hire.start_date, hire.manager
        );
    }
}
