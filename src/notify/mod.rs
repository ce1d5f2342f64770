//! Best-effort confirmation mail. Every recipient is sent an
//! independent message; a failure for one never affects the others.

use reqwest::Client;
use tokio::task::JoinSet;

use crate::google::Credentials;
use crate::google::gmail::{create_message, encode_raw, send_message};

/// Outcome of sending to a single recipient. `Ok` holds the Gmail
/// message ID and `Err` the failure text.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: String,
    pub result: Result<String, String>,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone)]
pub struct MailNotifier {
    client: Client,
    api_hostname: String,
}

async fn send_confirmation(
    client: Client,
    api_hostname: String,
    access_token: String,
    recipient: String,
    subject: String,
    body: String,
) -> Delivery {
    let raw = encode_raw(&create_message(&recipient, &subject, &body));
    match send_message(&client, &api_hostname, &access_token, &raw).await {
        Ok(sent) => {
            tracing::info!("Confirmation email sent to {} (ID: {})", recipient, sent.id);
            Delivery {
                recipient,
                result: Ok(sent.id),
            }
        }
        Err(e) => {
            tracing::error!("Failed to send email to {}: {}", recipient, e);
            Delivery {
                recipient,
                result: Err(e.to_string()),
            }
        }
    }
}

/// Recipients whose send task never reported back, e.g. because it
/// panicked, still get a failed `Delivery`.
fn fill_unfinished(recipients: &[String], slots: Vec<Option<Delivery>>) -> Vec<Delivery> {
    recipients
        .iter()
        .zip(slots)
        .map(|(recipient, slot)| {
            slot.unwrap_or_else(|| Delivery {
                recipient: recipient.clone(),
                result: Err(String::from("Email task did not complete")),
            })
        })
        .collect()
}

impl MailNotifier {
    pub fn new(api_hostname: &str) -> Self {
        Self {
            client: Client::new(),
            api_hostname: api_hostname.to_string(),
        }
    }

    /// Send `subject` and `body` to each recipient concurrently.
    /// Returns one `Delivery` per recipient in the order given.
    pub async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        credentials: &Credentials,
    ) -> Vec<Delivery> {
        let mut tasks = JoinSet::new();
        for (idx, recipient) in recipients.iter().enumerate() {
            let send = send_confirmation(
                self.client.clone(),
                self.api_hostname.clone(),
                credentials.access_token().to_string(),
                recipient.clone(),
                subject.to_string(),
                body.to_string(),
            );
            tasks.spawn(async move { (idx, send.await) });
        }

        let mut slots: Vec<Option<Delivery>> = vec![None; recipients.len()];
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok((idx, delivery)) => slots[idx] = Some(delivery),
                Err(e) => tracing::error!("Email task failed: {}", e),
            }
        }

        fill_unfinished(recipients, slots)
    }
}
