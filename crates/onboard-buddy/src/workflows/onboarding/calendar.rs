use chrono::{Duration, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::info;

use super::domain::HireRecord;
use crate::config::{CalendarConfig, CalendarFailurePolicy};
use crate::google::{CalendarGateway, EventAttendee, EventRequest, EventTime, GoogleApiError};

const ORIENTATION_MINUTES: i64 = 30;
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn orientation_start() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}

/// Day 1 orientation event for `hire`: 10:00-10:30 local time on the start date.
pub fn orientation_event(hire: &HireRecord, timezone: Tz) -> EventRequest {
    let start = NaiveDateTime::new(hire.start_date, orientation_start());
    let end = start + Duration::minutes(ORIENTATION_MINUTES);
    let local = |at: NaiveDateTime| EventTime {
        date_time: at.format(LOCAL_TIME_FORMAT).to_string(),
        time_zone: timezone.name().to_string(),
    };

    EventRequest {
        summary: format!("Day 1 Orientation: {}", hire.name),
        description: format!(
            "Welcome {} to {}!\nManager: {}\nAgenda: HR paperwork, accounts, laptop, and intro.",
            hire.name, hire.department, hire.manager
        ),
        start: local(start),
        end: local(end),
        attendees: vec![EventAttendee {
            email: hire.email.clone(),
        }],
    }
}

/// Schedules the orientation on the configured calendar.
pub struct CalendarNotifier {
    calendar_id: String,
    timezone: Tz,
    failure_policy: CalendarFailurePolicy,
    gateway: Box<dyn CalendarGateway>,
}

impl CalendarNotifier {
    pub fn new(config: &CalendarConfig, gateway: Box<dyn CalendarGateway>) -> Self {
        Self {
            calendar_id: config.calendar_id.clone(),
            timezone: config.timezone,
            failure_policy: config.failure_policy,
            gateway,
        }
    }

    /// How the run should treat a failed insert.
    pub fn failure_policy(&self) -> CalendarFailurePolicy {
        self.failure_policy
    }

    /// Creates one event per call; calling twice creates two events and two
    /// invitations. Returns the event's web link when the provider sends one.
    pub fn notify(&self, hire: &HireRecord) -> Result<Option<String>, GoogleApiError> {
        let event = orientation_event(hire, self.timezone);
        let created = self.gateway.insert_event(&self.calendar_id, &event)?;
        info!(
            hire = %hire.name,
            calendar = %self.calendar_id,
            event_id = created.id.as_deref().unwrap_or("unknown"),
            "orientation event created"
        );
        Ok(created.html_link)
    }
}
