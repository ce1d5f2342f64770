use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::auth;
use crate::ai::chat::Session;
use crate::core::AppConfig;
use crate::google::Credentials;
use crate::google::oauth::refresh_access_token;

async fn credentials(config: &AppConfig) -> Result<Credentials> {
    match &config.google_refresh_token {
        Some(refresh_token) => {
            let token = refresh_access_token(
                &config.google_oauth_hostname,
                &config.google_client_id,
                &config.google_client_secret,
                refresh_token,
            )
            .await?;
            Ok(Credentials::from(token))
        }
        None => auth::login(config).await,
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new().map_err(|e| anyhow!("Editor failed: {}", e))?;

    let mut session = Session::builder(config).build()?;
    session.login(credentials(config).await?);
    tracing::info!("Logged in with Google");

    println!("Describe the meeting you want to schedule. Ctrl-D to quit.");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let outcome = session.handle_message(&line).await;
                println!("{}", outcome.message());
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    session.logout();

    Ok(())
}
