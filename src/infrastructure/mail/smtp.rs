use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use zeroize::Zeroizing;

use crate::{
    entities::contact::OutboundMessage,
    mail::{DispatchReceipt, MailDispatcher, MailError},
    settings::MailProvider,
};

/// Implicit-TLS submission port; every other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// SMTP relay (Gmail or any authenticated submission server).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let builder = if port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?;

        let credentials = Credentials::new(username.to_string(), password.to_string());
        let transport = builder
            .port(port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport })
    }

    /// Converts the outbound message into a MIME message; text and HTML go
    /// out as `multipart/alternative`.
    pub fn build_message(message: &OutboundMessage) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(message.sender())?)
            .to(parse_mailbox(message.recipient())?)
            .subject(message.subject());

        if let Some(reply_to) = message.reply_to() {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        let email = match message.html_body() {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body().to_string(),
                html.to_string(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text_body().to_string()),
        };

        email.map_err(|e| MailError::InvalidMessage(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidMessage(format!("{address}: {e}")))
}

#[async_trait]
impl MailDispatcher for SmtpMailer {
    fn provider(&self) -> MailProvider {
        MailProvider::Smtp
    }

    async fn send(&self, message: &OutboundMessage) -> Result<DispatchReceipt, MailError> {
        let email = Self::build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let reply = response.message().collect::<Vec<_>>().join(" ");

        Ok(DispatchReceipt {
            provider: MailProvider::Smtp,
            message_id: (!reply.is_empty()).then_some(reply),
        })
    }
}
