use crate::entities::contact::{SanitizedSubmission, ValidSubmission};

/// Entities produced by [`escape_html`]. An `&` that already starts one of
/// these is kept as is, so escaping twice changes nothing.
const HTML_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

/// Cleans every field of a validated submission.
///
/// - control characters (below 0x20, plus DEL) are removed; the message keeps `\n`,
///   single-line fields turn line breaks and tabs into spaces
/// - surrounding whitespace is trimmed
/// - the email is lowercased as a whole; `+tag` sub-addressing is kept
pub fn sanitize(submission: ValidSubmission) -> SanitizedSubmission {
    let (name, email, subject, message) = submission.into_parts();

    SanitizedSubmission::new(
        single_line(&name),
        normalize_email(&email),
        single_line(&subject),
        multi_line(&message),
    )
}

pub fn strip_control_chars(input: &str, keep_newlines: bool) -> String {
    input
        .chars()
        .filter(|&c| (keep_newlines && c == '\n') || !is_stripped(c))
        .collect()
}

pub fn normalize_email(email: &str) -> String {
    strip_control_chars(email, false).trim().to_lowercase()
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for (idx, c) in input.char_indices() {
        match c {
            '&' if HTML_ENTITIES.iter().any(|e| input[idx..].starts_with(e)) => escaped.push('&'),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

fn is_stripped(c: char) -> bool {
    c < '\u{20}' || c == '\u{7f}'
}

fn single_line(input: &str) -> String {
    let flattened: String = input
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect();
    strip_control_chars(&flattened, false).trim().to_string()
}

fn multi_line(input: &str) -> String {
    strip_control_chars(input, true).trim().to_string()
}
