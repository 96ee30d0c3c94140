//! Clipboard content enrichment

use crate::dom::element::truncate;
use crate::event::{ClipboardDataType, ClipboardPayload};

const PREVIEW_CHARS: usize = 50;

/// Truncate content and fill preview, type, length and line count
pub fn enrich(payload: &mut ClipboardPayload, max_chars: usize) {
    let original_length = payload.content.chars().count();

    payload.data_type = classify(&payload.content);
    payload.preview = preview(&payload.content);
    payload.length = original_length;
    payload.lines = payload.content.lines().count().max(1);

    if original_length > max_chars {
        payload.content = payload.content.chars().take(max_chars).collect();
    }
}

/// First line (or the first 50 chars) with a `...` suffix when shortened
pub fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    match content.split_once('\n') {
        Some((first_line, _)) if first_line.chars().count() <= PREVIEW_CHARS => format!("{}...", first_line),
        Some((first_line, _)) => format!("{}...", first_line.chars().take(PREVIEW_CHARS).collect::<String>()),
        None => format!("{}...", content.chars().take(PREVIEW_CHARS).collect::<String>()),
    }
}

/// Coarse data type of copied text
pub fn classify(content: &str) -> ClipboardDataType {
    let trimmed = content.trim();

    if is_email(trimmed) {
        return ClipboardDataType::Email;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.") {
        return ClipboardDataType::Url;
    }
    if is_date(trimmed) {
        return ClipboardDataType::Date;
    }
    if is_phone(trimmed) {
        return ClipboardDataType::Phone;
    }
    if is_number(trimmed) {
        return ClipboardDataType::Number;
    }
    if content.contains('\t') {
        return ClipboardDataType::Tabular;
    }
    if content.contains('\n') {
        return ClipboardDataType::Multiline;
    }
    ClipboardDataType::Text
}

fn is_email(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    match text.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Three numeric parts split by `/` or `-`
fn is_date(text: &str) -> bool {
    if text.len() >= 20 || !(text.contains('/') || text.contains('-')) {
        return false;
    }
    let parts: Vec<&str> = text.split(['/', '-']).collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.trim().is_empty() && p.trim().chars().all(|c| c.is_ascii_digit()))
}

/// 7-15 digits written with phone punctuation; bare digit runs count as numbers
fn is_phone(text: &str) -> bool {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' ');
    if text.is_empty() || !text.chars().all(allowed) {
        return false;
    }
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    let has_separator = text.chars().any(|c| matches!(c, '+' | '-' | '(' | ')' | ' '));
    (7..=15).contains(&digits) && has_separator
}

fn is_number(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '$')).collect();
    let cleaned = cleaned.trim();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Shortened content for names and comments
pub fn label(payload: &ClipboardPayload) -> String {
    if payload.preview.is_empty() {
        truncate(&payload.content, PREVIEW_CHARS)
    } else {
        payload.preview.clone()
    }
}
