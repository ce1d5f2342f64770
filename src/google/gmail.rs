//! Gmail API client for sending plain-text mail.

use anyhow::{Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

/// Encode a header value as an RFC 2047 encoded-word when it has
/// anything other than printable ASCII.
fn encode_header(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return value.to_string();
    }
    format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
}

/// Build an RFC 2822 plain-text message with the headers Gmail
/// requires for `messages.send`.
pub fn create_message(to: &str, subject: &str, body: &str) -> String {
    let to: String = to.chars().filter(|c| !c.is_control()).collect();
    format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        to.trim(),
        encode_header(subject),
        body
    )
}

/// Base64url encode a message for the `raw` field.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE.encode(message.as_bytes())
}

/// Send one message as the authenticated user.
pub async fn send_message(
    client: &Client,
    api_hostname: &str,
    access_token: &str,
    raw: &str,
) -> Result<SentMessage> {
    let url = format!(
        "{}/gmail/v1/users/me/messages/send",
        api_hostname.trim_end_matches('/')
    );
    let res = client
        .post(&url)
        .bearer_auth(access_token)
        .json(&SendRequest { raw })
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("Send failed: {} ({})", status, text);
    }
    let sent: SentMessage = serde_json::from_str(&text)?;
    Ok(sent)
}
