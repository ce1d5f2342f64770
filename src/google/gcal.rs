//! Google Calendar API v3 event insertion with Google Meet
//! conferencing.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Calendar API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected calendar response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConferenceSolutionKey {
    pub r#type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceDataRequest {
    pub create_request: CreateConferenceRequest,
}

/// Request body for `events.insert`. Optional text fields are left
/// out of the JSON entirely when unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<EventAttendee>,
    pub conference_data: ConferenceDataRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPoint {
    entry_point_type: String,
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventResponse {
    id: String,
    html_link: String,
    hangout_link: Option<String>,
    conference_data: Option<ConferenceData>,
}

/// The parts of a created event the assistant shows the user and
/// puts in confirmation emails.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub html_link: String,
    pub meet_link: Option<String>,
}

impl InsertEventResponse {
    fn into_record(self) -> EventRecord {
        // `hangoutLink` is the documented field but the video entry
        // point carries the same URI when it is absent
        let meet_link = self.hangout_link.or_else(|| {
            self.conference_data.and_then(|data| {
                data.entry_points
                    .into_iter()
                    .find(|e| e.entry_point_type == "video")
                    .map(|e| e.uri)
            })
        });
        EventRecord {
            id: self.id,
            html_link: self.html_link,
            meet_link,
        }
    }
}

/// Insert an event, asking Calendar to allocate conferencing data
/// (`conferenceDataVersion=1`).
pub async fn insert_event(
    client: &Client,
    api_hostname: &str,
    access_token: &str,
    calendar_id: &str,
    event: &NewEvent,
) -> Result<EventRecord, CalendarError> {
    let url = format!(
        "{}/calendar/v3/calendars/{}/events",
        api_hostname.trim_end_matches('/'),
        urlencoding::encode(calendar_id)
    );
    let res = client
        .post(&url)
        .bearer_auth(access_token)
        .query(&[("conferenceDataVersion", "1")])
        .json(event)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(CalendarError::Api {
            status: status.as_u16(),
            message: text,
        });
    }
    let created: InsertEventResponse = serde_json::from_str(&text)?;
    Ok(created.into_record())
}
