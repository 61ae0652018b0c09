//! Email delivery over an HTTP mail API
//!
//! Speaks the Resend-style JSON API: a single `POST` carrying
//! `from`, `to`, `subject`, `html` and `text`.

use crate::error::{RemoteError, Result};
use crate::traits::Mailer;
use crate::types::MailMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";

/// Mail API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Endpoint accepting the message JSON
    pub api_url: String,
    /// API key; read from `RESEND_API_KEY` when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MAIL_API_URL.to_string(),
            api_key: None,
        }
    }
}

/// Mailer backed by an HTTP mail API
pub struct HttpMailer {
    config: MailConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl HttpMailer {
    /// Create a new mailer
    pub fn new(mut config: MailConfig) -> Result<Self> {
        if config.api_key.is_none() {
            config.api_key = std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            RemoteError::ConfigurationError("RESEND_API_KEY is not set".to_string())
        })?;
        debug!(api_url = %config.api_url, key_len = api_key.len(), "mailer configured");

        Ok(Self {
            config,
            client: Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let body = SendBody {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let mut request = self.client.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        info!("mail sent");
        Ok(())
    }
}
