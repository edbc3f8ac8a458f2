use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Subject used when a submission leaves it out.
pub const DEFAULT_SUBJECT: &str = "Website Enquiry";

pub const MAX_NAME_LEN: u64 = 100;
pub const MAX_EMAIL_LEN: u64 = 254;
pub const MAX_SUBJECT_LEN: u64 = 200;
pub const MAX_MESSAGE_LEN: u64 = 5000;

pub const CONTACT_SUCCESS_MESSAGE: &str = "Email sent successfully!";
