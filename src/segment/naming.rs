//! Human-readable labels for events and sub-steps

use crate::dom::element::truncate;
use crate::event::{clipboard, file_op, Event, EventPayload};

/// Shown instead of values typed into password fields
pub const MASK: &str = "********";

const MAX_VALUE_CHARS: usize = 40;

/// Whether typed text must not appear in names or generated code
pub fn is_secret(event: &Event) -> bool {
    match event.payload() {
        EventPayload::TypedText(p) => p.element.as_ref().is_some_and(|e| e.is_password()),
        _ => false,
    }
}

/// Key combination such as `ctrl+shift+Tab`
pub fn key_combo(key: &str, modifiers: &crate::event::Modifiers) -> String {
    let mut parts = modifiers.names();
    parts.push(key);
    parts.join("+")
}

/// Short description of a single event
pub fn event_label(event: &Event) -> String {
    match event.payload() {
        EventPayload::Click(p) => match &p.element {
            Some(element) => format!("Click {}", element.describe()),
            None => format!("Click at ({}, {})", p.x.round() as i64, p.y.round() as i64),
        },
        EventPayload::TypedText(p) => {
            if is_secret(event) {
                format!("Type \"{}\"", MASK)
            } else {
                format!("Type \"{}\"", truncate(&p.text, MAX_VALUE_CHARS))
            }
        }
        EventPayload::Navigation(p) => format!("Navigate to {}", p.url),
        EventPayload::Keystroke(p) => format!("Press {}", key_combo(&p.key, &p.modifiers)),
        EventPayload::ClipboardCopy(p) => format!("Copy {}", p.data_type),
        EventPayload::FileOp(p) => {
            let name = if p.file_name.is_empty() { p.effective_path() } else { p.file_name.as_str() };
            format!("{} file {}", file_op::verb(p.op), name)
        }
    }
}

/// Name for a group of events: the first meaningful event, keystrokes only as a last resort
pub fn step_name(events: &[&Event]) -> String {
    events
        .iter()
        .find(|e| !matches!(e.payload(), EventPayload::Keystroke(_)))
        .or_else(|| events.first())
        .map(|e| event_label(e))
        .unwrap_or_else(|| "Empty step".to_string())
}

/// Clipboard preview used in comments
pub fn clipboard_preview(event: &Event) -> Option<String> {
    match event.payload() {
        EventPayload::ClipboardCopy(p) => Some(clipboard::label(p)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSnapshot;
    use crate::event::Modifiers;

    #[test]
    fn test_labels() {
        let click = Event::click(1, 10.0, 20.0, Some(ElementSnapshot::new("button").with_text("Save")));
        assert_eq!(event_label(&click), "Click \"Save\"");

        let bare = Event::click(1, 10.4, 20.6, None);
        assert_eq!(event_label(&bare), "Click at (10, 21)");

        let nav = Event::navigation(1, "https://example.com");
        assert_eq!(event_label(&nav), "Navigate to https://example.com");

        let key = Event::keystroke(1, "s", Modifiers { ctrl: true, ..Default::default() });
        assert_eq!(event_label(&key), "Press ctrl+s");
    }

    #[test]
    fn test_password_masked() {
        let field = ElementSnapshot::new("input").with_attribute("type", "password");
        let typed = Event::typed_text(1, "hunter2", Some(field));
        assert!(is_secret(&typed));
        assert_eq!(event_label(&typed), "Type \"********\"");
    }

    #[test]
    fn test_step_name_skips_keystrokes() {
        let enter = Event::keystroke(1, "Enter", Modifiers::default());
        let typed = Event::typed_text(2, "Acme Corp", None);
        assert_eq!(step_name(&[&enter, &typed]), "Type \"Acme Corp\"");
        assert_eq!(step_name(&[&enter]), "Press Enter");
        assert_eq!(step_name(&[]), "Empty step");
    }
}
