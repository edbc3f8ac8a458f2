use serde::{Deserialize, Serialize};

use crate::{sanitize::escape_html, settings::AppConfig};

/// Raw contact-form body. Every field is optional on the wire so that a
/// missing field surfaces as a validation error instead of a JSON error.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactSubmission {
    pub fn new(name: &str, email: &str, subject: Option<&str>, message: &str) -> Self {
        ContactSubmission {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            subject: subject.map(str::to_string),
            message: Some(message.to_string()),
        }
    }
}

/// A submission whose required fields are present and well formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl ValidSubmission {
    pub(crate) fn new(name: String, email: String, subject: String, message: String) -> Self {
        ValidSubmission { name, email, subject, message }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn into_parts(self) -> (String, String, String, String) {
        (self.name, self.email, self.subject, self.message)
    }
}

/// Control-character free fields. Single-line fields never contain a newline;
/// the message keeps its line breaks. HTML renderings are derived on demand
/// from the same text so the two bodies cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl SanitizedSubmission {
    pub(crate) fn new(name: String, email: String, subject: String, message: String) -> Self {
        SanitizedSubmission { name, email, subject, message }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn text_message(&self) -> &str {
        &self.message
    }

    pub fn html_name(&self) -> String {
        escape_html(&self.name)
    }

    pub fn html_email(&self) -> String {
        escape_html(&self.email)
    }

    pub fn html_subject(&self) -> String {
        escape_html(&self.subject)
    }

    pub fn html_message(&self) -> String {
        escape_html(&self.message).replace('\n', "<br/>")
    }
}

impl From<&SanitizedSubmission> for ContactSubmission {
    fn from(sanitized: &SanitizedSubmission) -> Self {
        ContactSubmission::new(
            sanitized.name(),
            sanitized.email(),
            Some(sanitized.subject()),
            sanitized.text_message(),
        )
    }
}

/// Addressing shared by every outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailEnvelope {
    pub from: String,
    pub to: String,
    pub subject_prefix: String,
}

impl From<&AppConfig> for MailEnvelope {
    fn from(config: &AppConfig) -> Self {
        MailEnvelope {
            from: config.sender_address().to_string(),
            to: config.mail_to.trim().to_string(),
            subject_prefix: config.mail_subject_prefix.clone(),
        }
    }
}

/// Provider-agnostic message handed to a mail dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    from: String,
    to: String,
    reply_to: Option<String>,
    subject: String,
    text_body: String,
    html_body: Option<String>,
}

impl OutboundMessage {
    /// The only way to build a message: from a sanitized submission.
    pub fn compose(submission: &SanitizedSubmission, envelope: &MailEnvelope) -> Self {
        let text_body = format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            submission.name(),
            submission.email(),
            submission.text_message(),
        );

        let html_body = format!(
            "<p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Subject:</strong> {}</p>\
             <p><strong>Message:</strong><br/>{}</p>",
            submission.html_name(),
            submission.html_email(),
            submission.html_subject(),
            submission.html_message(),
        );

        OutboundMessage {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            reply_to: Some(submission.email().to_string()),
            subject: format!("{}{}", envelope.subject_prefix, submission.subject()),
            text_body,
            html_body: Some(html_body),
        }
    }

    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn text_body(&self) -> &str {
        &self.text_body
    }

    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}
