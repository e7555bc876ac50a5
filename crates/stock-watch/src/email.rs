//! End-of-session summary email

use crate::config::EmailConfig;
use crate::error::Result;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub const SUBJECT: &str = "📈 Daily Stock Summary";

const EMPTY_BODY: &str = "No quotes were recorded during this session.";

/// Sends the last cycle's summary over SMTP with STARTTLS
#[derive(Debug, Clone)]
pub struct SummaryMailer {
    config: EmailConfig,
}

impl SummaryMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn recipient(&self) -> &str {
        &self.config.to
    }

    /// Plain-text message, one summary line per row
    pub fn compose(&self, lines: &[String]) -> Result<Message> {
        let from: Mailbox = self.config.from.parse()?;
        let to: Mailbox = self.config.to.parse()?;

        let body = if lines.is_empty() {
            EMPTY_BODY.to_string()
        } else {
            lines.join("\n")
        };

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        Ok(message)
    }

    /// Compose and deliver. SMTP is blocking, so delivery runs off the runtime.
    pub async fn send(&self, lines: Vec<String>) -> Result<()> {
        let message = self.compose(&lines)?;
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let transport = SmtpTransport::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port)
                .credentials(Credentials::new(config.username, config.password))
                .build();
            transport.send(&message)?;
            Ok(())
        })
        .await??;

        tracing::info!(to = %self.config.to, "summary email sent");
        Ok(())
    }
}
