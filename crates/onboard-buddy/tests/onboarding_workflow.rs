use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use onboard_buddy::config::{
    CalendarConfig, CalendarFailurePolicy, ChatConfig, ConfigError, SheetConfig,
};
use onboard_buddy::google::{CalendarGateway, CreatedEvent, EventRequest, GoogleApiError};
use onboard_buddy::workflows::onboarding::{
    CalendarNotifier, CalendarOutcome, ChatError, ChatMessage, ChatNotifier, EmailNotifier, Grid,
    MailError, MailTransport, OnboardingError, OnboardingWorkflow, OutgoingEmail, RosterError,
    RosterSource, WebhookTransport,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

fn in_days(days: i64) -> String {
    (today() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn grid(rows: &[[&str; 5]]) -> Grid {
    let mut grid = vec![vec![
        "Name".to_string(),
        "Email".to_string(),
        "Department".to_string(),
        "StartDate".to_string(),
        "Manager".to_string(),
    ]];
    grid.extend(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect()),
    );
    grid
}

#[derive(Clone, Default)]
struct FakeRoster {
    grid: Grid,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl RosterSource for FakeRoster {
    fn fetch_grid(&self, source_id: &str, range: &str) -> Result<Grid, RosterError> {
        self.requests
            .lock()
            .expect("roster mutex")
            .push((source_id.to_string(), range.to_string()));
        Ok(self.grid.clone())
    }
}

#[derive(Clone, Default)]
struct FakeMail {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail: bool,
}

impl MailTransport for FakeMail {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().expect("mail mutex").push(email.clone());
        if self.fail {
            Err(MailError::Smtp(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "relay refused connection",
            ))))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
struct FakeWebhook {
    posts: Arc<Mutex<Vec<ChatMessage>>>,
    fail: bool,
}

impl WebhookTransport for FakeWebhook {
    fn post(&self, _url: &str, message: &ChatMessage, _timeout: Duration) -> Result<(), ChatError> {
        self.posts.lock().expect("webhook mutex").push(message.clone());
        if self.fail {
            Err(ChatError::Rejected {
                status: 403,
                body: "invalid_token".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Default)]
struct FakeCalendar {
    events: Arc<Mutex<Vec<EventRequest>>>,
    fail_for: Option<String>,
}

impl CalendarGateway for FakeCalendar {
    fn insert_event(
        &self,
        _calendar_id: &str,
        event: &EventRequest,
    ) -> Result<CreatedEvent, GoogleApiError> {
        let invitee = event
            .attendees
            .first()
            .map(|attendee| attendee.email.clone())
            .unwrap_or_default();
        if self.fail_for.as_deref() == Some(invitee.as_str()) {
            return Err(GoogleApiError::ApiError {
                status: 403,
                message: "Forbidden".to_string(),
            });
        }

        let mut events = self.events.lock().expect("calendar mutex");
        events.push(event.clone());
        Ok(CreatedEvent {
            id: Some(format!("evt-{}", events.len())),
            html_link: Some(format!("https://calendar.example.com/evt-{}", events.len())),
        })
    }
}

struct Harness {
    roster: FakeRoster,
    mail: FakeMail,
    webhook: FakeWebhook,
    calendar: FakeCalendar,
}

impl Harness {
    fn new(grid: Grid) -> Self {
        Self {
            roster: FakeRoster {
                grid,
                ..FakeRoster::default()
            },
            mail: FakeMail::default(),
            webhook: FakeWebhook::default(),
            calendar: FakeCalendar::default(),
        }
    }

    fn workflow(&self, sheet_id: Option<&str>, policy: CalendarFailurePolicy) -> OnboardingWorkflow {
        let sheet = SheetConfig {
            id: sheet_id.map(str::to_string),
            tab: "SHEET1".to_string(),
            window_days: 7,
        };
        let chat = ChatConfig {
            webhook_url: Some("https://hooks.example.com/T000/B000".to_string()),
            timeout: Duration::from_secs(10),
        };
        let calendar = CalendarConfig {
            calendar_id: "primary".to_string(),
            timezone: chrono_tz::Asia::Kolkata,
            failure_policy: policy,
        };

        OnboardingWorkflow::new(
            sheet,
            Box::new(self.roster.clone()),
            EmailNotifier::new(Some("hr@example.com".to_string()), Box::new(self.mail.clone())),
            ChatNotifier::new(&chat, Box::new(self.webhook.clone())),
            CalendarNotifier::new(&calendar, Box::new(self.calendar.clone())),
        )
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.mail.sent.lock().expect("mail mutex").len(),
            self.webhook.posts.lock().expect("webhook mutex").len(),
            self.calendar.events.lock().expect("calendar mutex").len(),
        )
    }
}

#[test]
fn hire_inside_window_gets_all_three_notifications() {
    let start = in_days(2);
    let harness = Harness::new(grid(&[["Asha K", "a@x.com", "Engineering", start.as_str(), "R. Singh"]]));
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let report = workflow.run(today()).expect("run succeeds");

    assert_eq!(report.rows_fetched, 2);
    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.hire.name, "Asha K");
    assert!(outcome.email_sent);
    assert!(outcome.chat_posted);
    assert_eq!(
        outcome.calendar,
        CalendarOutcome::Created {
            link: Some("https://calendar.example.com/evt-1".to_string())
        }
    );
    assert_eq!(report.fully_delivered(), 1);
    assert_eq!(harness.counts(), (1, 1, 1));

    let requests = harness.roster.requests.lock().expect("roster mutex");
    assert_eq!(
        requests.as_slice(),
        &[("sheet-123".to_string(), "SHEET1!A:E".to_string())]
    );

    let sent = harness.mail.sent.lock().expect("mail mutex");
    assert_eq!(sent[0].to, "a@x.com");
    let events = harness.calendar.events.lock().expect("calendar mutex");
    assert_eq!(events[0].summary, "Day 1 Orientation: Asha K");
}

#[test]
fn hire_outside_window_triggers_nothing() {
    let start = in_days(10);
    let harness = Harness::new(grid(&[["Asha K", "a@x.com", "Engineering", start.as_str(), "R. Singh"]]));
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let report = workflow.run(today()).expect("run succeeds");

    assert!(report.outcomes.is_empty());
    assert_eq!(harness.counts(), (0, 0, 0));
}

#[test]
fn bad_dates_are_skipped_and_valid_rows_still_processed() {
    let first = in_days(1);
    let second = in_days(3);
    let harness = Harness::new(grid(&[
        ["Asha K", "a@x.com", "Engineering", first.as_str(), "R. Singh"],
        ["Broken", "b@x.com", "Sales", "not-a-date", "M. Rao"],
        ["Ravi P", "r@x.com", "Finance", second.as_str(), "S. Iyer"],
    ]));
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let report = workflow.run(today()).expect("run succeeds");

    let names: Vec<&str> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.hire.name.as_str())
        .collect();
    assert_eq!(names, vec!["Asha K", "Ravi P"]);
    assert_eq!(harness.counts(), (2, 2, 2));
}

#[test]
fn missing_sheet_id_stops_before_fetching() {
    let harness = Harness::new(grid(&[]));
    let workflow = harness.workflow(None, CalendarFailurePolicy::Continue);

    match workflow.run(today()) {
        Err(OnboardingError::Config(ConfigError::MissingSheetId)) => {}
        other => panic!("expected missing sheet id, got {other:?}"),
    }
    assert!(harness.roster.requests.lock().expect("roster mutex").is_empty());
    assert_eq!(harness.counts(), (0, 0, 0));
}

#[test]
fn email_and_chat_failures_do_not_stop_the_run() {
    let first = in_days(1);
    let second = in_days(2);
    let mut harness = Harness::new(grid(&[
        ["Asha K", "a@x.com", "Engineering", first.as_str(), "R. Singh"],
        ["Ravi P", "r@x.com", "Finance", second.as_str(), "S. Iyer"],
    ]));
    harness.mail.fail = true;
    harness.webhook.fail = true;
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let report = workflow.run(today()).expect("run succeeds");

    assert_eq!(report.outcomes.len(), 2);
    assert!(report
        .outcomes
        .iter()
        .all(|outcome| !outcome.email_sent && !outcome.chat_posted));
    assert!(report
        .outcomes
        .iter()
        .all(|outcome| matches!(outcome.calendar, CalendarOutcome::Created { .. })));
    assert_eq!(report.fully_delivered(), 0);
}

#[test]
fn calendar_failure_is_recorded_under_continue_policy() {
    let first = in_days(1);
    let second = in_days(2);
    let mut harness = Harness::new(grid(&[
        ["Asha K", "a@x.com", "Engineering", first.as_str(), "R. Singh"],
        ["Ravi P", "r@x.com", "Finance", second.as_str(), "S. Iyer"],
    ]));
    harness.calendar.fail_for = Some("a@x.com".to_string());
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let report = workflow.run(today()).expect("run continues");

    assert!(matches!(
        report.outcomes[0].calendar,
        CalendarOutcome::Failed { .. }
    ));
    assert!(matches!(
        report.outcomes[1].calendar,
        CalendarOutcome::Created { .. }
    ));
    assert_eq!(harness.counts(), (2, 2, 1));
}

#[test]
fn calendar_failure_halts_remaining_hires_under_abort_policy() {
    let first = in_days(1);
    let second = in_days(2);
    let mut harness = Harness::new(grid(&[
        ["Asha K", "a@x.com", "Engineering", first.as_str(), "R. Singh"],
        ["Ravi P", "r@x.com", "Finance", second.as_str(), "S. Iyer"],
    ]));
    harness.calendar.fail_for = Some("a@x.com".to_string());
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Abort);

    match workflow.run(today()) {
        Err(OnboardingError::Calendar { hire, .. }) => assert_eq!(hire, "Asha K"),
        other => panic!("expected calendar abort, got {other:?}"),
    }
    // Email and chat for the first hire already went out; the second hire is untouched.
    assert_eq!(harness.counts(), (1, 1, 0));
}

#[test]
fn rerunning_duplicates_every_notification() {
    let start = in_days(2);
    let harness = Harness::new(grid(&[["Asha K", "a@x.com", "Engineering", start.as_str(), "R. Singh"]]));
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    workflow.run(today()).expect("first run");
    workflow.run(today()).expect("second run");

    assert_eq!(harness.counts(), (2, 2, 2));
}

#[test]
fn preview_filters_without_notifying() {
    let soon = in_days(4);
    let later = in_days(30);
    let harness = Harness::new(grid(&[
        ["Asha K", "a@x.com", "Engineering", soon.as_str(), "R. Singh"],
        ["Later", "l@x.com", "Sales", later.as_str(), "M. Rao"],
    ]));
    let workflow = harness.workflow(Some("sheet-123"), CalendarFailurePolicy::Continue);

    let (rows, hires) = workflow.upcoming_hires(today()).expect("preview succeeds");

    assert_eq!(rows, 3);
    assert_eq!(hires.len(), 1);
    assert_eq!(hires[0].name, "Asha K");
    assert_eq!(harness.counts(), (0, 0, 0));
}
