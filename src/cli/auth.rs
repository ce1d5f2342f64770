use anyhow::{Context, Result, anyhow};
use std::io::{self, Write};

use crate::core::AppConfig;
use crate::google::Credentials;
use crate::google::oauth::{authorization_url, exchange_code_for_token};

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_owned())
}

/// Interactive consent. Prints the authorization URL, reads back the
/// code Google shows and exchanges it for tokens.
pub async fn login(config: &AppConfig) -> Result<Credentials> {
    let auth_url = authorization_url(&config.google_client_id, &config.google_redirect_uri);
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        auth_url
    );
    let code = prompt_line("Paste the authorization code shown by Google here: ")?;
    if code.is_empty() {
        return Err(anyhow!("No authorization code entered"));
    }

    let token = exchange_code_for_token(
        &config.google_oauth_hostname,
        &config.google_client_id,
        &config.google_client_secret,
        &code,
        &config.google_redirect_uri,
    )
    .await?;

    Ok(Credentials::from(token))
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let credentials = login(config).await?;
    let refresh_token = credentials
        .refresh_token()
        .ok_or(anyhow!("No refresh token in response"))?;

    println!(
        "\nSet this in your environment to skip the consent screen next time:\n\nSCHEDULER_GOOGLE_REFRESH_TOKEN={}\n",
        refresh_token
    );

    Ok(())
}
