use std::fmt;

use anyhow::{Result, bail};
use reqwest::Client;
use serde::Deserialize;

/// Scopes needed to insert calendar events and send mail on behalf of
/// the user.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/gmail.send",
];

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Authorization handle shared by the calendar and mail clients for
/// the lifetime of a session. There is no refresh logic; a session
/// ends when the access token stops working.
#[derive(Clone)]
pub struct Credentials {
    access_token: String,
    refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: &str, refresh_token: Option<&str>) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(|t| t.to_string()),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl From<TokenResponse> for Credentials {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        }
    }
}

// Never print token material
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// URL the user opens in a browser to grant calendar and mail access.
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    let scope = SCOPES.join(" ");
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        AUTH_ENDPOINT,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope)
    )
}

async fn request_token(oauth_hostname: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
    let url = format!("{}/token", oauth_hostname.trim_end_matches('/'));
    let res = Client::new().post(&url).form(params).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("Token request failed: {} ({})", status, text);
    }
    let token: TokenResponse = serde_json::from_str(&text)?;
    match token.expires_in {
        Some(secs) => tracing::debug!("Received access token valid for {}s", secs),
        None => tracing::debug!("Received access token without an expiry"),
    }
    Ok(token)
}

pub async fn exchange_code_for_token(
    oauth_hostname: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    request_token(
        oauth_hostname,
        &[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ],
    )
    .await
}

pub async fn refresh_access_token(
    oauth_hostname: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let mut token = request_token(
        oauth_hostname,
        &[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await?;

    // Google only returns a refresh token on the first exchange
    if token.refresh_token.is_none() {
        token.refresh_token = Some(refresh_token.to_string());
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn it_builds_the_authorization_url() {
        let url = authorization_url("my-client", "urn:ietf:wg:oauth:2.0:oob");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(url.contains("auth%2Fcalendar%20https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.send"));
    }

    #[test]
    fn it_redacts_tokens_in_debug_output() {
        let creds = Credentials::new("ya29.secret", Some("1//refresh"));
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("ya29.secret"));
        assert!(!debug.contains("1//refresh"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn it_refreshes_an_access_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"}"#)
            .create_async()
            .await;

        let token = refresh_access_token(&server.url(), "client", "secret", "1//refresh")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(token.expires_in, Some(3599));

        let creds = Credentials::from(token);
        assert_eq!(creds.access_token(), "ya29.fresh");
        assert_eq!(creds.refresh_token(), Some("1//refresh"));
    }

    #[tokio::test]
    async fn it_fails_on_a_rejected_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let result = exchange_code_for_token(
            &server.url(),
            "client",
            "secret",
            "bad-code",
            "urn:ietf:wg:oauth:2.0:oob",
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid_grant"));
    }
}
