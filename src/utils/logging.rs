// Logging utilities
// Structured logging with JSON and human-readable formats, plus masking for
// personal identifiers (phone numbers, BVN/NIN, account numbers) so they
// never land in log files verbatim.

use log::Level;
use serde_json::json;

/// Mask a phone number: keep the last 4 digits only.
pub fn mask_phone(phone: &str) -> String {
    let s = phone.trim();
    if s.len() <= 4 {
        return "***".to_string();
    }
    format!("*******{}", &s[s.len() - 4..])
}

/// Mask a BVN/NIN/account number: keep the last 3 digits only.
pub fn mask_identity_number(value: &str) -> String {
    let s = value.trim();
    if s.len() <= 3 {
        return "***".to_string();
    }
    format!("********{}", &s[s.len() - 3..])
}

/// Mask an email address: first character of the local part plus the domain.
pub fn mask_email(email: &str) -> String {
    let s = email.trim();
    match s.split_once('@') {
        // First char, not first byte: local parts may start multibyte.
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{}***@{}", first, domain),
            None => "***".to_string(),
        },
        _ => "***".to_string(),
    }
}

/// Extract `[PHASE: ...]` / `[STEP: ...]` markers from a log message.
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let mut phase = None;
    let mut step = None;
    let mut cleaned_message = message.to_string();

    if let Some(start) = message.find("[PHASE:") {
        if let Some(end) = message[start..].find(']') {
            let phase_str = &message[start + 7..start + end].trim();
            phase = Some(phase_str.to_string());
            cleaned_message = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
        }
    }

    if let Some(start) = cleaned_message.find("[STEP:") {
        if let Some(end) = cleaned_message[start..].find(']') {
            let step_str = &cleaned_message[start + 6..start + end].trim();
            step = Some(step_str.to_string());
            cleaned_message = format!(
                "{} {}",
                &cleaned_message[..start],
                &cleaned_message[start + end + 1..]
            )
            .trim()
            .to_string();
        }
    }

    (phase, step, cleaned_message)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry for human-readable output
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}
