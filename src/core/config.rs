use std::env;

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;

pub const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are an AI meeting assistant that helps schedule meetings using Google Calendar and Gmail.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub system_message: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_refresh_token: Option<String>,
    pub google_oauth_hostname: String,
    pub calendar_api_hostname: String,
    pub gmail_api_hostname: String,
    pub calendar_id: String,
    /// IANA name sent as the `timeZone` of every event and used to
    /// resolve "today" for the model.
    pub timezone: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Missing env var {}", key))
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = required_var("OPENAI_API_KEY")?;
        let openai_api_hostname = var_or("SCHEDULER_LLM_HOST", "https://api.openai.com");
        let openai_model = var_or("SCHEDULER_LLM_MODEL", "gpt-4o");
        let system_message = var_or("SCHEDULER_SYSTEM_MESSAGE", DEFAULT_SYSTEM_MESSAGE);
        let google_client_id = required_var("SCHEDULER_GOOGLE_CLIENT_ID")?;
        let google_client_secret = required_var("SCHEDULER_GOOGLE_CLIENT_SECRET")?;
        let google_redirect_uri =
            var_or("SCHEDULER_GOOGLE_REDIRECT_URI", "urn:ietf:wg:oauth:2.0:oob");
        let google_refresh_token = env::var("SCHEDULER_GOOGLE_REFRESH_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let google_oauth_hostname = var_or("SCHEDULER_OAUTH_HOST", "https://oauth2.googleapis.com");
        let calendar_api_hostname =
            var_or("SCHEDULER_CALENDAR_HOST", "https://www.googleapis.com");
        let gmail_api_hostname = var_or("SCHEDULER_GMAIL_HOST", "https://gmail.googleapis.com");
        let calendar_id = var_or("SCHEDULER_CALENDAR_ID", "primary");
        let timezone = var_or("SCHEDULER_TIMEZONE", "Asia/Karachi");

        let config = Self {
            openai_model,
            openai_api_hostname,
            openai_api_key,
            system_message,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            google_refresh_token,
            google_oauth_hostname,
            calendar_api_hostname,
            gmail_api_hostname,
            calendar_id,
            timezone,
        };
        config.tz()?;

        Ok(config)
    }

    /// Parsed form of `timezone`.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone {}: {}", self.timezone, e))
    }
}
