use contact_relay::{
    entities::contact::{ContactSubmission, SanitizedSubmission},
    sanitize::{escape_html, normalize_email, sanitize, strip_control_chars},
    validation::validate,
};

fn clean(name: &str, email: &str, subject: Option<&str>, message: &str) -> SanitizedSubmission {
    let valid = validate(ContactSubmission::new(name, email, subject, message))
        .expect("submission should validate");
    sanitize(valid)
}

#[test]
fn single_line_fields_lose_line_breaks() {
    let s = clean("Jane\nDoe", "jane@example.com", Some("Hi\r\nthere\tfriend"), "Body");

    assert_eq!(s.name(), "Jane Doe");
    assert_eq!(s.subject(), "Hi  there friend");
}

#[test]
fn message_keeps_newlines_only() {
    let s = clean("Jane", "jane@example.com", None, "  line one\r\nline\u{0}two\u{7f}\n\tthree  ");

    assert_eq!(s.text_message(), "line one\nlinetwo\nthree");
}

#[test]
fn email_is_trimmed_and_lowercased() {
    let s = clean("Jane", "  Jane+Tag@Example.COM ", None, "Hi");

    assert_eq!(s.email(), "jane+tag@example.com");
    assert_eq!(normalize_email("ADMIN@Site.IO"), "admin@site.io");
}

#[test]
fn control_characters_are_stripped() {
    assert_eq!(strip_control_chars("a\u{0}b\u{1b}c\u{7f}", false), "abc");
    assert_eq!(strip_control_chars("a\nb\rc", false), "abc");
    assert_eq!(strip_control_chars("a\nb\rc", true), "a\nbc");
}

#[test]
fn html_escaping_covers_markup_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">'Tom & Jerry'</a>"#),
        "&lt;a href=&quot;x&quot;&gt;&#39;Tom &amp; Jerry&#39;&lt;/a&gt;"
    );
}

#[test]
fn html_escaping_is_idempotent() {
    let raw = "<b>Fish & Chips</b> \"R&D\" 'quoted' &copy;";
    let once = escape_html(raw);

    assert_eq!(escape_html(&once), once);
    assert!(once.contains("&amp;copy;"));
}

#[test]
fn html_message_converts_newlines() {
    let s = clean("Jane", "jane@example.com", None, "Hello\n<World>");

    assert_eq!(s.html_message(), "Hello<br/>&lt;World&gt;");
    assert_eq!(s.text_message(), "Hello\n<World>");
}

#[test]
fn sanitizing_twice_changes_nothing() {
    let inputs = [
        ("  Jane\t<Doe> ", "JANE@Example.com", Some("Re:\r\n&amp; stuff"), "a & b\r\n\n<c>\u{7}"),
        ("O'Brien", "o.brien+x@example.ie", None, "plain"),
    ];

    for (name, email, subject, message) in inputs {
        let once = clean(name, email, subject, message);
        let twice = sanitize(validate(ContactSubmission::from(&once)).unwrap());
        assert_eq!(once, twice);
    }
}
