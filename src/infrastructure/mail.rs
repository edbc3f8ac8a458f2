//! Outbound mail providers.
//!
//! Every provider implements [`MailDispatcher`]; the one named by
//! `mail_provider` is built once at startup by [`build_dispatcher`] and shared
//! by all workers.

pub mod mailgun;
pub mod sendgrid;
pub mod smtp;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use config::ConfigError;
use derive_more::Display;
use zeroize::Zeroizing;

use crate::{
    entities::contact::OutboundMessage,
    settings::{AppConfig, MailProvider},
};

use mailgun::MailgunMailer;
use sendgrid::SendGridMailer;
use smtp::SmtpMailer;

pub type SharedDispatcher = Arc<dyn MailDispatcher>;

#[async_trait]
pub trait MailDispatcher: Send + Sync {
    fn provider(&self) -> MailProvider;

    /// Makes a single delivery attempt.
    async fn send(&self, message: &OutboundMessage) -> Result<DispatchReceipt, MailError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReceipt {
    pub provider: MailProvider,
    pub message_id: Option<String>,
}

#[derive(Debug, Display)]
pub enum MailError {
    #[display("Invalid message: {_0}")]
    InvalidMessage(String),

    #[display("Transport error: {_0}")]
    Transport(String),

    #[display("Provider rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[display("No response from mail provider within {}s", _0.as_secs())]
    Timeout(Duration),
}

impl std::error::Error for MailError {}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MailError::Transport(format!("request timed out: {err}"))
        } else {
            MailError::Transport(err.to_string())
        }
    }
}

/// Builds the configured provider. Missing credentials are a configuration error.
pub fn build_dispatcher(config: &AppConfig) -> Result<SharedDispatcher, ConfigError> {
    let timeout = Duration::from_secs(config.mail_timeout_secs);

    let dispatcher: SharedDispatcher = match config.mail_provider {
        MailProvider::Smtp => {
            let mailer = SmtpMailer::new(
                &config.smtp_host,
                config.smtp_port,
                &config.smtp_username,
                Zeroizing::new(config.smtp_password.clone()),
                timeout,
            )
            .map_err(|e| ConfigError::Message(format!("SMTP transport: {e}")))?;
            Arc::new(mailer)
        }
        MailProvider::SendGrid => {
            let mailer = SendGridMailer::new(
                Zeroizing::new(config.sendgrid_api_key.clone()),
                &config.sendgrid_api_base,
                timeout,
            )
            .map_err(|e| ConfigError::Message(format!("SendGrid client: {e}")))?;
            Arc::new(mailer)
        }
        MailProvider::Mailgun => {
            let mailer = MailgunMailer::new(
                Zeroizing::new(config.mailgun_api_key.clone()),
                &config.mailgun_domain,
                &config.mailgun_api_base,
                timeout,
            )
            .map_err(|e| ConfigError::Message(format!("Mailgun client: {e}")))?;
            Arc::new(mailer)
        }
    };

    tracing::info!(provider = %dispatcher.provider(), "Mail dispatcher ready");
    Ok(dispatcher)
}
