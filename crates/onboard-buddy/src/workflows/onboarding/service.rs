use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info};

use super::calendar::CalendarNotifier;
use super::chat::ChatNotifier;
use super::domain::HireRecord;
use super::email::EmailNotifier;
use super::roster::{parse_upcoming_hires, RosterError, RosterSource};
use crate::config::{CalendarFailurePolicy, ConfigError, SheetConfig};
use crate::google::GoogleApiError;

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("orientation event for {hire} could not be created: {source}")]
    Calendar {
        hire: String,
        #[source]
        source: GoogleApiError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalendarOutcome {
    Created { link: Option<String> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HireOutcome {
    pub hire: HireRecord,
    pub email_sent: bool,
    pub chat_posted: bool,
    pub calendar: CalendarOutcome,
}

/// What a run touched. Partial failures live in the per-hire outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rows_fetched: usize,
    pub window_days: i64,
    pub outcomes: Vec<HireOutcome>,
}

impl RunReport {
    pub fn fully_delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| {
                outcome.email_sent
                    && outcome.chat_posted
                    && matches!(outcome.calendar, CalendarOutcome::Created { .. })
            })
            .count()
    }
}

/// Roster in, three notifications out per upcoming hire.
pub struct OnboardingWorkflow {
    sheet: SheetConfig,
    roster: Box<dyn RosterSource>,
    email: EmailNotifier,
    chat: ChatNotifier,
    calendar: CalendarNotifier,
}

impl OnboardingWorkflow {
    pub fn new(
        sheet: SheetConfig,
        roster: Box<dyn RosterSource>,
        email: EmailNotifier,
        chat: ChatNotifier,
        calendar: CalendarNotifier,
    ) -> Self {
        Self {
            sheet,
            roster,
            email,
            chat,
            calendar,
        }
    }

    /// Fetch and filter the roster without notifying anyone.
    pub fn upcoming_hires(&self, today: NaiveDate) -> Result<(usize, Vec<HireRecord>), OnboardingError> {
        upcoming_hires(self.roster.as_ref(), &self.sheet, today)
    }

    /// Notify every hire starting within the window, in roster order.
    ///
    /// Each hire gets email, then chat, then calendar. Email and chat
    /// failures are recorded and the run moves on; calendar failures follow
    /// the calendar's configured failure policy.
    pub fn run(&self, today: NaiveDate) -> Result<RunReport, OnboardingError> {
        let (rows_fetched, hires) = self.upcoming_hires(today)?;
        let mut report = RunReport {
            rows_fetched,
            window_days: self.sheet.window_days,
            outcomes: Vec::with_capacity(hires.len()),
        };

        if hires.is_empty() {
            info!("nothing to process");
            return Ok(report);
        }

        for hire in hires {
            let email_sent = self.email.notify(&hire);
            let chat_posted = self.chat.notify(&hire);
            let calendar = match self.calendar.notify(&hire) {
                Ok(link) => CalendarOutcome::Created { link },
                Err(source) => match self.calendar.failure_policy() {
                    CalendarFailurePolicy::Abort => {
                        error!(hire = %hire.name, error = %source, "orientation event failed; aborting run");
                        return Err(OnboardingError::Calendar {
                            hire: hire.name,
                            source,
                        });
                    }
                    CalendarFailurePolicy::Continue => {
                        error!(hire = %hire.name, error = %source, "orientation event failed");
                        CalendarOutcome::Failed {
                            reason: source.to_string(),
                        }
                    }
                },
            };

            let event_link = match &calendar {
                CalendarOutcome::Created { link } => link.as_deref().unwrap_or("(no link)"),
                CalendarOutcome::Failed { .. } => "(not created)",
            };
            info!(
                hire = %hire.name,
                email = email_sent,
                chat = chat_posted,
                event = %event_link,
                "hire processed"
            );

            report.outcomes.push(HireOutcome {
                hire,
                email_sent,
                chat_posted,
                calendar,
            });
        }

        Ok(report)
    }
}

/// Validate the source identifier, read the configured range and filter it.
/// Returns the raw row count alongside the hires.
pub fn upcoming_hires(
    roster: &dyn RosterSource,
    sheet: &SheetConfig,
    today: NaiveDate,
) -> Result<(usize, Vec<HireRecord>), OnboardingError> {
    let source_id = sheet.require_id()?;
    let range = sheet.range();

    let grid = roster.fetch_grid(source_id, &range)?;
    info!(rows = grid.len(), %range, "roster rows fetched");

    let hires = parse_upcoming_hires(&grid, sheet.window_days, today);
    info!(window_days = sheet.window_days, hires = hires.len(), "upcoming hires in window");
    Ok((grid.len(), hires))
}
