//! Reusable messages using Handlebars for templating. Values in these
//! templates come from model output so the registry runs in strict
//! mode and only renders what is explicitly passed in.

use std::fmt;

use anyhow::Result;
use chrono::NaiveDate;
use handlebars::{Handlebars, no_escape};

#[derive(Debug)]
pub enum Prompt {
    ConfirmationEmail,
    MeetingCreated,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shown when the model neither calls the tool nor says anything.
pub const FALLBACK_CLARIFICATION: &str = "I'm not sure how to proceed. Could you clarify?";

pub const CALENDAR_FAILURE: &str = "Failed to create the meeting. Please check your details.";

pub const LOGIN_REQUIRED: &str = "Please log in with Google before scheduling a meeting.";

pub const CONFIRMATION_SUBJECT_PREFIX: &str = "Meeting Confirmation: ";

const CONFIRMATION_EMAIL_PROMPT: &str = r"You are invited to the meeting: {{summary}}

Location: {{location}}
Start: {{start_time}}
End: {{end_time}}
Description: {{description}}
Event: {{event_link}}
Google Meet: {{meet_link}}
";

const MEETING_CREATED_PROMPT: &str = r"Meeting created!

Event: {{event_link}}
Google Meet: {{meet_link}}";

/// Contextual fact sent alongside the transcript so relative dates
/// like "next Tuesday" resolve.
pub fn today_fact(today: NaiveDate) -> String {
    format!("Today is {}.", today.format("%A, %B %d, %Y"))
}

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Plain text output, not HTML
    registry.register_escape_fn(no_escape);
    registry.register_template_string(
        &Prompt::ConfirmationEmail.to_string(),
        CONFIRMATION_EMAIL_PROMPT,
    )?;
    registry.register_template_string(&Prompt::MeetingCreated.to_string(), MEETING_CREATED_PROMPT)?;
    Ok(registry)
}
