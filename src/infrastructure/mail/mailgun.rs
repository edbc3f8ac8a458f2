use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::{
    entities::contact::OutboundMessage,
    mail::{DispatchReceipt, MailDispatcher, MailError},
    settings::MailProvider,
};

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: Option<String>,
}

pub struct MailgunMailer {
    client: Client,
    api_key: Zeroizing<String>,
    endpoint: String,
}

impl MailgunMailer {
    pub fn new(
        api_key: Zeroizing<String>,
        domain: &str,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v3/{}/messages",
                api_base.trim_end_matches('/'),
                domain.trim_matches('/')
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Form fields for the `messages` endpoint.
    pub fn form_fields(message: &OutboundMessage) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("from", message.sender().to_string()),
            ("to", message.recipient().to_string()),
            ("subject", message.subject().to_string()),
            ("text", message.text_body().to_string()),
        ];

        if let Some(html) = message.html_body() {
            fields.push(("html", html.to_string()));
        }
        if let Some(reply_to) = message.reply_to() {
            fields.push(("h:Reply-To", reply_to.to_string()));
        }

        fields
    }
}

#[async_trait]
impl MailDispatcher for MailgunMailer {
    fn provider(&self) -> MailProvider {
        MailProvider::Mailgun
    }

    async fn send(&self, message: &OutboundMessage) -> Result<DispatchReceipt, MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(self.api_key.as_str()))
            .form(&Self::form_fields(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status: status.as_u16(), body });
        }

        // A 2xx without a parseable body still means the message was queued.
        let message_id = response
            .json::<MailgunResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        Ok(DispatchReceipt {
            provider: MailProvider::Mailgun,
            message_id,
        })
    }
}
