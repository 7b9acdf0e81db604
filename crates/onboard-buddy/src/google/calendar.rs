use serde::{Deserialize, Serialize};
use url::Url;

use super::{GoogleApiClient, GoogleApiError};

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Body of a Calendar v3 `events.insert` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<EventAttendee>,
}

/// Wall-clock time interpreted in `time_zone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub html_link: Option<String>,
}

pub trait CalendarGateway {
    /// Create the event and email every attendee an invitation.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> Result<CreatedEvent, GoogleApiError>;
}

#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    api: GoogleApiClient,
}

impl GoogleCalendarClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self { api }
    }
}

impl CalendarGateway for GoogleCalendarClient {
    fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> Result<CreatedEvent, GoogleApiError> {
        let url = events_url(calendar_id)?;
        self.api.post_json(url, event)
    }
}

fn events_url(calendar_id: &str) -> Result<Url, GoogleApiError> {
    let mut url = Url::parse(CALENDAR_API)?;
    url.path_segments_mut()
        .map_err(|_| GoogleApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .extend([calendar_id, "events"]);
    url.query_pairs_mut().append_pair("sendUpdates", "all");
    Ok(url)
}
