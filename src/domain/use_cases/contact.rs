use std::time::Duration;

use tokio::time::timeout;

use crate::{
    constants::CONTACT_SUCCESS_MESSAGE,
    entities::contact::{ContactResponse, ContactSubmission, MailEnvelope, OutboundMessage},
    errors::AppError,
    mail::{MailError, SharedDispatcher},
    sanitize::sanitize,
    validation::validate,
};

pub struct ContactHandler {
    pub dispatcher: SharedDispatcher,
    envelope: MailEnvelope,
    dispatch_timeout: Duration,
}

impl ContactHandler {
    pub fn new(dispatcher: SharedDispatcher, envelope: MailEnvelope, dispatch_timeout: Duration) -> Self {
        ContactHandler {
            dispatcher,
            envelope,
            dispatch_timeout,
        }
    }

    /// Validates, sanitizes and relays one submission. A single delivery
    /// attempt is made and bounded by the dispatch timeout.
    pub async fn submit(&self, submission: ContactSubmission) -> Result<ContactResponse, AppError> {
        let valid = validate(submission)?;
        let sanitized = sanitize(valid);
        let message = OutboundMessage::compose(&sanitized, &self.envelope);

        let provider = self.dispatcher.provider();
        let result = match timeout(self.dispatch_timeout, self.dispatcher.send(&message)).await {
            Ok(result) => result,
            Err(_) => Err(MailError::Timeout(self.dispatch_timeout)),
        };

        let receipt = result.map_err(|e| {
            tracing::error!(%provider, error = %e, "Failed to dispatch contact message");
            AppError::from(e)
        })?;

        tracing::info!(
            %provider,
            message_id = receipt.message_id.as_deref().unwrap_or("-"),
            "Contact message dispatched"
        );

        Ok(ContactResponse {
            success: true,
            message: CONTACT_SUCCESS_MESSAGE.to_string(),
        })
    }
}
