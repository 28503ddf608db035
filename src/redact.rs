/// Redaction utilities for logging
///
/// Masks account names, inverter serials and session cookies so logs can be
/// shared without leaking credentials.

/// Redact an inverter serial number, keeping only the last 4 characters visible.
/// Example: "ABC1234567" -> "******4567"
pub fn serial_number(serial: &str) -> String {
    let chars: Vec<char> = serial.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    if chars.len() <= 4 {
        // Too short to meaningfully redact
        return "*".repeat(chars.len());
    }

    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Redact an account name. Email addresses keep their domain.
/// Example: "user@example.com" -> "u***@example.com", "installer" -> "i***"
pub fn username(name: &str) -> String {
    let (local, domain) = match name.find('@') {
        Some(at_pos) => name.split_at(at_pos),
        None => (name, ""),
    };

    let mut chars = local.chars();
    match (chars.next(), chars.next()) {
        (None, _) => name.to_string(),
        (Some(_), None) => format!("*{}", domain),
        (Some(first), Some(_)) => format!("{}***{}", first, domain),
    }
}

/// Redact a `Cookie` header value, keeping cookie names and masking values.
/// Example: "JSESSIONID=abc; SERVERID=x;" -> "JSESSIONID=***; SERVERID=***;"
pub fn cookie_header(header: &str) -> String {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) => format!("{}=***;", name),
            None => "***;".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
