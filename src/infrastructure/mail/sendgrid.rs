use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use zeroize::Zeroizing;

use crate::{
    entities::contact::OutboundMessage,
    mail::{DispatchReceipt, MailDispatcher, MailError},
    settings::MailProvider,
};

pub struct SendGridMailer {
    client: Client,
    api_key: Zeroizing<String>,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(api_key: Zeroizing<String>, api_base: &str, timeout: Duration) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/mail/send", api_base.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// v3 `mail/send` body.
    pub fn payload(message: &OutboundMessage) -> Value {
        let mut content = vec![json!({ "type": "text/plain", "value": message.text_body() })];
        if let Some(html) = message.html_body() {
            content.push(json!({ "type": "text/html", "value": html }));
        }

        let mut body = json!({
            "personalizations": [{ "to": [{ "email": message.recipient() }] }],
            "from": { "email": message.sender() },
            "subject": message.subject(),
            "content": content,
        });

        if let Some(reply_to) = message.reply_to() {
            body["reply_to"] = json!({ "email": reply_to });
        }

        body
    }
}

#[async_trait]
impl MailDispatcher for SendGridMailer {
    fn provider(&self) -> MailProvider {
        MailProvider::SendGrid
    }

    async fn send(&self, message: &OutboundMessage) -> Result<DispatchReceipt, MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_str())
            .json(&Self::payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status: status.as_u16(), body });
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(DispatchReceipt {
            provider: MailProvider::SendGrid,
            message_id,
        })
    }
}
