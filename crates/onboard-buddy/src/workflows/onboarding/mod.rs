//! New-hire onboarding: roster intake and the three welcome notifications.

pub mod calendar;
pub mod chat;
pub mod domain;
pub mod email;
pub mod roster;
pub mod service;

pub use calendar::{orientation_event, CalendarNotifier};
pub use chat::{ChatError, ChatMessage, ChatNotifier, HttpWebhookTransport, WebhookTransport};
pub use domain::HireRecord;
pub use email::{EmailNotifier, MailError, MailTransport, OutgoingEmail, SmtpMailTransport};
pub use roster::{
    parse_upcoming_hires, window_end, ColumnMap, CsvRosterSource, Grid, RosterError, RosterSource,
};
pub use service::{
    upcoming_hires, CalendarOutcome, HireOutcome, OnboardingError, OnboardingWorkflow, RunReport,
};
