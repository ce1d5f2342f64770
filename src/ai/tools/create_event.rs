use std::fmt;

use serde::{Deserialize, Serialize};

use crate::openai::{Function, Parameters, Property, ToolType};

pub const CREATE_EVENT: &str = "create_event";

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CreateEventProps {
    pub summary: Property,
    pub location: Property,
    pub description: Property,
    pub start_time: Property,
    pub end_time: Property,
    pub attendees: Property,
}

/// The single action offered to the model. Serializes to the tool
/// definition expected by the chat completions API.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CreateEventTool {
    pub r#type: ToolType,
    pub function: Function<CreateEventProps>,
}

impl CreateEventTool {
    pub fn new() -> Self {
        let function = Function {
            name: String::from(CREATE_EVENT),
            description: String::from(
                "Creates a new event in Google Calendar with Google Meet and sends confirmation emails.",
            ),
            parameters: Parameters {
                r#type: String::from("object"),
                properties: CreateEventProps {
                    summary: Property::string("Title of the meeting."),
                    location: Property::string("Where the meeting takes place, if anywhere."),
                    description: Property::string("Agenda or notes for the meeting."),
                    start_time: Property::string(
                        "Start of the meeting as an ISO 8601 date-time without offset, e.g. 2024-06-11T15:00:00.",
                    )
                    .with_format("date-time"),
                    end_time: Property::string(
                        "End of the meeting as an ISO 8601 date-time without offset, e.g. 2024-06-11T16:00:00.",
                    )
                    .with_format("date-time"),
                    attendees: Property::array_of(
                        "Email addresses of everyone to invite.",
                        Property::string("Attendee email address.").with_format("email"),
                    ),
                },
                required: vec![
                    String::from("summary"),
                    String::from("start_time"),
                    String::from("end_time"),
                    String::from("attendees"),
                ],
                additional_properties: false,
            },
            // Strict mode requires every property to be required
            strict: false,
        };

        Self {
            r#type: ToolType::Function,
            function,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function.name
    }

    pub fn required_fields(&self) -> &[String] {
        &self.function.parameters.required
    }
}

impl Default for CreateEventTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Models occasionally send a single address, or a comma separated
/// string, where a list was asked for.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum Attendees {
    Many(Vec<String>),
    One(String),
}

impl From<Attendees> for Vec<String> {
    fn from(attendees: Attendees) -> Self {
        match attendees {
            Attendees::Many(list) => list,
            Attendees::One(s) => s.split(',').map(|p| p.to_string()).collect(),
        }
    }
}

fn deserialize_attendees<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let attendees = Option::<Attendees>::deserialize(deserializer)?;
    Ok(attendees.map(Vec::from))
}

/// Arguments of a `create_event` call exactly as the model proposed
/// them. Every field is optional until validated.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CreateEventArgs {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "deserialize_attendees")]
    pub attendees: Option<Vec<String>>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

impl CreateEventArgs {
    fn attendee_list(&self) -> Vec<String> {
        self.attendees
            .iter()
            .flatten()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(|a| a.to_string())
            .collect()
    }

    fn has_field(&self, name: &str) -> bool {
        match name {
            "summary" => non_blank(&self.summary).is_some(),
            "location" => non_blank(&self.location).is_some(),
            "description" => non_blank(&self.description).is_some(),
            "start_time" => non_blank(&self.start_time).is_some(),
            "end_time" => non_blank(&self.end_time).is_some(),
            "attendees" => !self.attendee_list().is_empty(),
            _ => false,
        }
    }

    /// Check the arguments against the tool's required fields. Absent,
    /// null, blank, and empty-list values all count as missing.
    pub fn validate(&self, tool: &CreateEventTool) -> Result<MeetingRequest, MissingFields> {
        let missing: Vec<String> = tool
            .required_fields()
            .iter()
            .filter(|name| !self.has_field(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(MissingFields(missing));
        }

        let required = |v: &Option<String>, name: &str| {
            non_blank(v).ok_or_else(|| MissingFields(vec![name.to_string()]))
        };

        Ok(MeetingRequest {
            summary: required(&self.summary, "summary")?,
            location: non_blank(&self.location),
            description: non_blank(&self.description),
            start_time: required(&self.start_time, "start_time")?,
            end_time: required(&self.end_time, "end_time")?,
            attendees: self.attendee_list(),
        })
    }
}

/// A `create_event` call that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRequest {
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub attendees: Vec<String>,
}

/// Required fields the model left out, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingFields(pub Vec<String>);

impl MissingFields {
    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "I need more information to schedule the meeting. Please provide: {}",
            self.0.join(", ")
        )
    }
}
