use contact_relay::{
    constants::{DEFAULT_SUBJECT, MAX_MESSAGE_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN},
    entities::contact::{ContactSubmission, MailEnvelope, OutboundMessage},
    mail::smtp::SmtpMailer,
    sanitize::sanitize,
    validation::{is_blank, is_valid_email, validate, ValidationError},
};

fn submission() -> ContactSubmission {
    ContactSubmission::new("Jane Doe", "jane@example.com", Some("Hello"), "Hi there")
}

#[test]
fn accepts_complete_submission() {
    let valid = validate(submission()).unwrap();

    assert_eq!(valid.name(), "Jane Doe");
    assert_eq!(valid.email(), "jane@example.com");
    assert_eq!(valid.subject(), "Hello");
    assert_eq!(valid.message(), "Hi there");
}

#[test]
fn reports_every_missing_field() {
    let errors = validate(ContactSubmission::default()).unwrap_err();

    assert_eq!(
        errors,
        vec![
            ValidationError::MissingField("name"),
            ValidationError::MissingField("email"),
            ValidationError::MissingField("message"),
        ]
    );
}

#[test]
fn blank_and_control_only_values_are_missing() {
    let input = ContactSubmission {
        name: Some("  \t ".into()),
        message: Some("\u{0}\u{7}\r\n".into()),
        ..submission()
    };

    let errors = validate(input).unwrap_err();

    assert!(errors.contains(&ValidationError::MissingField("name")));
    assert!(errors.contains(&ValidationError::MissingField("message")));
}

#[test]
fn missing_or_blank_subject_falls_back_to_default() {
    for subject in [None, Some("   ")] {
        let input = ContactSubmission {
            subject: subject.map(str::to_string),
            ..submission()
        };
        let valid = validate(input).unwrap();
        assert_eq!(valid.subject(), DEFAULT_SUBJECT);
    }
}

#[test]
fn rejects_malformed_email() {
    for email in ["jane.example.com", "a.@example.com", ".a@example.com", "a..b@example.com"] {
        let input = ContactSubmission {
            email: Some(email.into()),
            ..submission()
        };

        let errors = validate(input).unwrap_err();

        assert_eq!(errors, vec![ValidationError::InvalidEmail], "{email}");
        assert_eq!(errors[0].field(), "email");
    }
}

#[test]
fn accepted_addresses_build_an_smtp_message() {
    let envelope = MailEnvelope {
        from: "relay@example.com".into(),
        to: "owner@example.com".into(),
        subject_prefix: "Contact Form: ".into(),
    };

    for email in ["a@b.co", "user+tag@example.com", "First.Last@Mail.Example.org", "o'brien@example.ie"] {
        let valid = validate(ContactSubmission::new("Jane", email, None, "Hi"))
            .unwrap_or_else(|e| panic!("{email} rejected: {e:?}"));
        let message = OutboundMessage::compose(&sanitize(valid), &envelope);

        assert!(SmtpMailer::build_message(&message).is_ok(), "{email}");
    }
}

#[test]
fn enforces_length_caps() {
    let input = ContactSubmission {
        name: Some("a".repeat(MAX_NAME_LEN as usize + 1)),
        subject: Some("s".repeat(MAX_SUBJECT_LEN as usize + 1)),
        message: Some("m".repeat(MAX_MESSAGE_LEN as usize + 1)),
        ..submission()
    };

    let errors = validate(input).unwrap_err();

    assert!(errors.contains(&ValidationError::TooLong { field: "name", max: MAX_NAME_LEN }));
    assert!(errors.contains(&ValidationError::TooLong { field: "subject", max: MAX_SUBJECT_LEN }));
    assert!(errors.contains(&ValidationError::TooLong { field: "message", max: MAX_MESSAGE_LEN }));
}

#[test]
fn values_at_the_cap_are_accepted() {
    let input = ContactSubmission {
        name: Some("a".repeat(MAX_NAME_LEN as usize)),
        message: Some("m".repeat(MAX_MESSAGE_LEN as usize)),
        ..submission()
    };

    assert!(validate(input).is_ok());
}

#[test]
fn error_messages_name_the_field() {
    assert_eq!(ValidationError::MissingField("name").to_string(), "name is required");
    assert_eq!(
        ValidationError::TooLong { field: "subject", max: 200 }.to_string(),
        "subject must be at most 200 characters"
    );
}

#[test]
fn email_shape() {
    for email in ["a@b.co", "user+tag@example.com", "first.last@mail.example.org", " jane@example.com "] {
        assert!(is_valid_email(email), "{email} should be valid");
    }

    for email in ["", "plain", "a@b", "a b@c.com", "a@@b.com", "@example.com", "jane@example.com\r\nBcc: x@y.z"] {
        assert!(!is_valid_email(email), "{email:?} should be invalid");
    }
}

#[test]
fn blank_detection() {
    assert!(is_blank(""));
    assert!(is_blank(" \t\n"));
    assert!(is_blank("\u{1b}"));
    assert!(!is_blank(" x "));
}
