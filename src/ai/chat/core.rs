use anyhow::{Error, Result, anyhow};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use super::extract::{Extraction, IntentExtractor};
use super::models::Transcript;
use crate::ai::prompt::{CALENDAR_FAILURE, LOGIN_REQUIRED};
use crate::ai::tools::MeetingRequest;
use crate::calendar::{EventCreator, ScheduledMeeting};
use crate::core::AppConfig;
use crate::google::Credentials;
use crate::openai::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingLogin,
    AwaitingInput,
    Processing,
    Clarifying,
    AwaitingMissingFields,
    Confirmed,
    Failed,
}

/// What a single turn produced. Every variant carries the text shown
/// to the user, which is also what gets appended to the transcript.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    LoginRequired,
    Clarification(String),
    MissingFields {
        fields: Vec<String>,
        message: String,
    },
    Confirmed {
        meeting: ScheduledMeeting,
        message: String,
    },
    Failed(String),
    Error(String),
}

impl TurnOutcome {
    pub fn message(&self) -> &str {
        match self {
            TurnOutcome::LoginRequired => LOGIN_REQUIRED,
            TurnOutcome::Clarification(message)
            | TurnOutcome::Failed(message)
            | TurnOutcome::Error(message) => message,
            TurnOutcome::MissingFields { message, .. }
            | TurnOutcome::Confirmed { message, .. } => message,
        }
    }

    fn state(&self) -> SessionState {
        match self {
            TurnOutcome::LoginRequired => SessionState::AwaitingLogin,
            TurnOutcome::Clarification(_) => SessionState::Clarifying,
            TurnOutcome::MissingFields { .. } => SessionState::AwaitingMissingFields,
            TurnOutcome::Confirmed { .. } => SessionState::Confirmed,
            TurnOutcome::Failed(_) | TurnOutcome::Error(_) => SessionState::Failed,
        }
    }
}

/// One user's conversation with the scheduler. Created before login,
/// usable after `login`, and torn down with `logout`.
///
/// Use `SessionBuilder` to construct a valid `Session`.
pub struct Session {
    extractor: IntentExtractor,
    creator: EventCreator,
    transcript: Transcript,
    credentials: Option<Credentials>,
    state: SessionState,
    timezone: Tz,
    today: Option<NaiveDate>,
}

impl Session {
    pub fn builder(config: &AppConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn login(&mut self, credentials: Credentials) {
        if self.credentials.is_some() {
            tracing::info!("Replacing credentials for the current session");
        }
        self.credentials = Some(credentials);
        self.transition(SessionState::AwaitingInput);
    }

    /// Ends the session. The transcript and credentials go with it.
    pub fn logout(self) {
        tracing::info!(
            "Logged out, discarding {} transcript messages",
            self.transcript.len()
        );
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.timezone).date_naive())
    }

    async fn schedule(&self, request: &MeetingRequest) -> Result<TurnOutcome, Error> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(anyhow!("Not logged in with Google"))?;

        match self.creator.create(request, credentials).await {
            Ok(meeting) => {
                let message = self.creator.created_message(&meeting)?;
                Ok(TurnOutcome::Confirmed { meeting, message })
            }
            Err(_) => Ok(TurnOutcome::Failed(CALENDAR_FAILURE.to_string())),
        }
    }

    async fn process(&self) -> Result<TurnOutcome, Error> {
        let extraction = self.extractor.extract(&self.transcript, self.today()).await?;

        let invocation = match extraction {
            Extraction::Clarification(text) => return Ok(TurnOutcome::Clarification(text)),
            Extraction::Invocation(invocation) => invocation,
        };

        match self.extractor.validate(&invocation) {
            Ok(request) => self.schedule(&request).await,
            Err(missing) => {
                tracing::info!("Missing fields for {}: {:?}", invocation.name, missing.fields());
                Ok(TurnOutcome::MissingFields {
                    message: missing.to_string(),
                    fields: missing.0,
                })
            }
        }
    }

    /// Run one turn of the conversation. Never fails: errors become an
    /// `Error` outcome whose text is shown to the user. Before login the
    /// message is answered directly and not recorded.
    pub async fn handle_message(&mut self, text: &str) -> TurnOutcome {
        if self.credentials.is_none() {
            return TurnOutcome::LoginRequired;
        }

        self.transcript.push(Message::new(Role::User, text));
        self.transition(SessionState::Processing);

        let outcome = match self.process().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Turn failed: {:?}", e);
                TurnOutcome::Error(format!("Error: {}", e))
            }
        };

        self.transition(outcome.state());
        self.transcript
            .push(Message::new(Role::Assistant, outcome.message()));
        self.transition(SessionState::AwaitingInput);

        outcome
    }
}

pub struct SessionBuilder {
    config: AppConfig,
    today: Option<NaiveDate>,
}

impl SessionBuilder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            today: None,
        }
    }

    /// Pin the date given to the model instead of using the current
    /// date in the configured timezone.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn build(self) -> Result<Session> {
        Ok(Session {
            extractor: IntentExtractor::from_config(&self.config),
            creator: EventCreator::from_config(&self.config)?,
            transcript: Transcript::new_with_system_message(&self.config.system_message),
            credentials: None,
            state: SessionState::AwaitingLogin,
            timezone: self.config.tz()?,
            today: self.today,
        })
    }
}
