//! Mail senders

use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;

use crate::error::{NotifyError, NotifyResult};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotifyResult<()>;
}

// ============================================================================
// HTTP mail API
// ============================================================================

#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Endpoint accepting `{from, to, subject, html}` JSON with bearer auth
    pub api_url: String,
    pub api_token: String,
    pub from_email: String,
    pub from_name: String,
    pub max_attempts: u32,
    /// Linear backoff step: attempt `n` waits `n * backoff` before retrying
    pub backoff: Duration,
    pub request_timeout: Duration,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            from_email: "hello@feed.local".to_string(),
            from_name: "Feed".to_string(),
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpMailer {
    client: reqwest::Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn send_once(&self, email: &OutgoingEmail) -> NotifyResult<()> {
        let payload = json!({
            "from": { "email": self.config.from_email, "name": self.config.from_name },
            "to": [{ "email": email.to }],
            "subject": email.subject,
            "html": email.html,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotifyResult<()> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.send_once(email).await {
                Ok(()) => {
                    tracing::info!(attempt, "email sent");
                    return Ok(());
                }
                Err(err) if err.is_transient() && attempt < self.config.max_attempts => {
                    tracing::warn!(attempt, error = %err, "email send failed, retrying");
                    tokio::time::sleep(self.config.backoff * attempt).await;
                }
                Err(err) if attempt > 1 => {
                    return Err(NotifyError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ============================================================================
// Logging mailer
// ============================================================================

/// Development mailer: logs each email and keeps it in an outbox
#[derive(Default)]
pub struct LogMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotifyResult<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "email (log mailer)");
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email.clone());
        }
        Ok(())
    }
}
