//! Turns a validated meeting request into a Google Calendar event with
//! a Meet link, then emails every attendee a confirmation.

use anyhow::Result;
use handlebars::Handlebars;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::ai::prompt::{self, CONFIRMATION_SUBJECT_PREFIX, Prompt};
use crate::ai::tools::MeetingRequest;
use crate::core::AppConfig;
use crate::google::Credentials;
use crate::google::gcal::{
    CalendarError, ConferenceDataRequest, ConferenceSolutionKey, CreateConferenceRequest,
    EventAttendee, EventDateTime, EventRecord, NewEvent, insert_event,
};
use crate::notify::{Delivery, MailNotifier};

/// A created event and what happened to each confirmation email.
#[derive(Debug, Clone)]
pub struct ScheduledMeeting {
    pub event: EventRecord,
    pub deliveries: Vec<Delivery>,
}

const NO_MEET_LINK: &str = "No Google Meet link available.";

pub struct EventCreator {
    client: Client,
    api_hostname: String,
    calendar_id: String,
    timezone: String,
    notifier: MailNotifier,
    templates: Handlebars<'static>,
}

/// Time-ordered and unique within the process so that Calendar never
/// reuses a conference allocated for an earlier request.
fn conference_request_id() -> String {
    format!("meet-{}", Uuid::now_v7().simple())
}

impl EventCreator {
    pub fn new(
        api_hostname: &str,
        calendar_id: &str,
        timezone: &str,
        notifier: MailNotifier,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_hostname: api_hostname.to_string(),
            calendar_id: calendar_id.to_string(),
            timezone: timezone.to_string(),
            notifier,
            templates: prompt::templates()?,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.calendar_api_hostname,
            &config.calendar_id,
            &config.timezone,
            MailNotifier::new(&config.gmail_api_hostname),
        )
    }

    /// Build the `events.insert` body. Each call gets a fresh
    /// conferencing request ID.
    pub fn build_event(&self, request: &MeetingRequest) -> NewEvent {
        NewEvent {
            summary: request.summary.clone(),
            location: request.location.clone(),
            description: request.description.clone(),
            start: EventDateTime {
                date_time: request.start_time.clone(),
                time_zone: self.timezone.clone(),
            },
            end: EventDateTime {
                date_time: request.end_time.clone(),
                time_zone: self.timezone.clone(),
            },
            attendees: request
                .attendees
                .iter()
                .map(|email| EventAttendee {
                    email: email.clone(),
                })
                .collect(),
            conference_data: ConferenceDataRequest {
                create_request: CreateConferenceRequest {
                    request_id: conference_request_id(),
                    conference_solution_key: ConferenceSolutionKey {
                        r#type: String::from("hangoutsMeet"),
                    },
                },
            },
        }
    }

    fn confirmation_body(&self, request: &MeetingRequest, event: &EventRecord) -> Result<String> {
        let body = self.templates.render(
            &Prompt::ConfirmationEmail.to_string(),
            &json!({
                "summary": request.summary,
                "location": request.location.as_deref().unwrap_or("Online"),
                "start_time": request.start_time,
                "end_time": request.end_time,
                "description": request
                    .description
                    .as_deref()
                    .unwrap_or("No description provided."),
                "event_link": event.html_link,
                "meet_link": event
                    .meet_link
                    .as_deref()
                    .unwrap_or(NO_MEET_LINK),
            }),
        )?;
        Ok(body)
    }

    /// Reply shown to the user once the event exists.
    pub fn created_message(&self, meeting: &ScheduledMeeting) -> Result<String> {
        let message = self.templates.render(
            &Prompt::MeetingCreated.to_string(),
            &json!({
                "event_link": meeting.event.html_link,
                "meet_link": meeting
                    .event
                    .meet_link
                    .as_deref()
                    .unwrap_or(NO_MEET_LINK),
            }),
        )?;
        Ok(message)
    }

    /// Create the event and notify attendees. Calendar failures are
    /// logged and returned without sending any mail. Mail failures
    /// never fail the call since the event already exists.
    pub async fn create(
        &self,
        request: &MeetingRequest,
        credentials: &Credentials,
    ) -> Result<ScheduledMeeting, CalendarError> {
        let new_event = self.build_event(request);
        tracing::debug!(
            "Creating event {} with conference request {}",
            new_event.summary,
            new_event.conference_data.create_request.request_id
        );

        let event = insert_event(
            &self.client,
            &self.api_hostname,
            credentials.access_token(),
            &self.calendar_id,
            &new_event,
        )
        .await
        .inspect_err(|e| tracing::error!("Calendar API error: {}", e))?;

        tracing::info!("Created event {} ({})", event.id, event.html_link);

        let deliveries = match self.confirmation_body(request, &event) {
            Ok(body) => {
                let subject = format!("{}{}", CONFIRMATION_SUBJECT_PREFIX, request.summary);
                self.notifier
                    .notify(&request.attendees, &subject, &body, credentials)
                    .await
            }
            Err(e) => {
                tracing::error!("Failed to render confirmation email: {}", e);
                Vec::new()
            }
        };

        Ok(ScheduledMeeting { event, deliveries })
    }
}
