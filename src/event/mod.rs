//! Normalized interaction events
//!
//! Every capture source (OS hooks, the browser worker, the file and clipboard monitors)
//! produces the same closed [`Event`] union. Events are immutable once normalized and are
//! ordered by timestamp, ties broken by arrival.

pub mod buffer;
pub mod clipboard;
pub mod correlate;
pub mod file_op;
pub mod normalizer;

pub use buffer::EventBuffer;
pub use correlate::{AppType, DataFlow};
pub use file_op::{FileFilter, FileLocation};
pub use normalizer::{AppIdentity, DropReason, Normalized, Normalizer, OwnProcessFilter};

use crate::dom::ElementSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which producer delivered an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    System,
    Browser,
    Auxiliary,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Browser => write!(f, "browser"),
            Self::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// Foreground application state when the event happened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set application name
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Builder method: set page URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method: set window title
    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.application.is_none() && self.url.is_none() && self.window_title.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys held during a keystroke
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.ctrl || self.meta || self.alt || self.shift
    }

    /// Ctrl on Windows/Linux, Cmd on macOS
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Held modifiers in hotkey order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.ctrl {
            names.push("ctrl");
        }
        if self.meta {
            names.push("meta");
        }
        if self.alt {
            names.push("alt");
        }
        if self.shift {
            names.push("shift");
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickPayload {
    pub x: f64,
    pub y: f64,

    #[serde(default)]
    pub button: MouseButton,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokePayload {
    pub key: String,

    #[serde(default)]
    pub modifiers: Modifiers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedTextPayload {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPayload {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Coarse classification of copied text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardDataType {
    Email,
    Phone,
    Url,
    Number,
    Date,
    Tabular,
    Multiline,
    #[default]
    Text,
}

impl fmt::Display for ClipboardDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Number => "number",
            Self::Date => "date",
            Self::Tabular => "tabular",
            Self::Multiline => "multiline",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardPayload {
    pub content: String,

    /// Filled by the normalizer
    #[serde(default)]
    pub preview: String,

    #[serde(default)]
    pub data_type: ClipboardDataType,

    /// Character count of the original content, before truncation
    #[serde(default)]
    pub length: usize,

    #[serde(default)]
    pub lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOpKind {
    Created,
    Modified,
    Moved,
    Deleted,
}

impl fmt::Display for FileOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOpPayload {
    pub op: FileOpKind,
    pub path: String,

    /// Destination of a move; required for `moved`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_path: Option<String>,

    #[serde(default)]
    pub file_name: String,

    #[serde(default)]
    pub extension: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default)]
    pub location: FileLocation,
}

impl FileOpPayload {
    /// Path the operation left the file at
    pub fn effective_path(&self) -> &str {
        self.dest_path.as_deref().unwrap_or(&self.path)
    }
}

/// Kind-specific event data, tagged by `kind` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Click(ClickPayload),
    Keystroke(KeystrokePayload),
    TypedText(TypedTextPayload),
    Navigation(NavigationPayload),
    ClipboardCopy(ClipboardPayload),
    FileOp(FileOpPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Keystroke,
    TypedText,
    Navigation,
    ClipboardCopy,
    FileOp,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Click => "click",
            Self::Keystroke => "keystroke",
            Self::TypedText => "typed_text",
            Self::Navigation => "navigation",
            Self::ClipboardCopy => "clipboard_copy",
            Self::FileOp => "file_op",
        };
        f.write_str(name)
    }
}

/// A normalized interaction event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Milliseconds since the Unix epoch
    pub(crate) timestamp: u64,

    pub(crate) origin: Origin,

    #[serde(default, skip_serializing_if = "EventContext::is_empty")]
    pub(crate) context: EventContext,

    #[serde(flatten)]
    pub(crate) payload: EventPayload,
}

impl Event {
    pub fn new(timestamp: u64, origin: Origin, payload: EventPayload) -> Self {
        Self {
            timestamp,
            origin,
            context: EventContext::default(),
            payload,
        }
    }

    /// Builder method: attach foreground context
    pub fn with_context(mut self, context: EventContext) -> Self {
        self.context = context;
        self
    }

    pub fn click(timestamp: u64, x: f64, y: f64, element: Option<ElementSnapshot>) -> Self {
        Self::new(
            timestamp,
            Origin::Browser,
            EventPayload::Click(ClickPayload {
                x,
                y,
                button: MouseButton::Left,
                element,
            }),
        )
    }

    pub fn keystroke(timestamp: u64, key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::new(
            timestamp,
            Origin::Browser,
            EventPayload::Keystroke(KeystrokePayload {
                key: key.into(),
                modifiers,
                element: None,
            }),
        )
    }

    pub fn typed_text(timestamp: u64, text: impl Into<String>, element: Option<ElementSnapshot>) -> Self {
        Self::new(
            timestamp,
            Origin::Browser,
            EventPayload::TypedText(TypedTextPayload {
                text: text.into(),
                element,
            }),
        )
    }

    pub fn navigation(timestamp: u64, url: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            Origin::Browser,
            EventPayload::Navigation(NavigationPayload {
                url: url.into(),
                title: None,
            }),
        )
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::Click(_) => EventKind::Click,
            EventPayload::Keystroke(_) => EventKind::Keystroke,
            EventPayload::TypedText(_) => EventKind::TypedText,
            EventPayload::Navigation(_) => EventKind::Navigation,
            EventPayload::ClipboardCopy(_) => EventKind::ClipboardCopy,
            EventPayload::FileOp(_) => EventKind::FileOp,
        }
    }

    /// DOM snapshot carried by browser-side interactions
    pub fn element(&self) -> Option<&ElementSnapshot> {
        match &self.payload {
            EventPayload::Click(p) => p.element.as_ref(),
            EventPayload::Keystroke(p) => p.element.as_ref(),
            EventPayload::TypedText(p) => p.element.as_ref(),
            _ => None,
        }
    }

    /// URL the event belongs to; a navigation belongs to its target
    pub fn page_url(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Navigation(p) => Some(p.url.as_str()),
            _ => self.context.url.as_deref(),
        }
    }

    /// Enter-like key without command modifiers
    pub fn is_submit_key(&self) -> bool {
        match &self.payload {
            EventPayload::Keystroke(p) => {
                matches!(p.key.as_str(), "Enter" | "Return" | "NumpadEnter") && !p.modifiers.command()
            }
            _ => false,
        }
    }

    /// Ctrl+V / Cmd+V
    pub fn is_paste(&self) -> bool {
        match &self.payload {
            EventPayload::Keystroke(p) => p.key.eq_ignore_ascii_case("v") && p.modifiers.command(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_click_with_element() {
        let raw = json!({
            "kind": "click",
            "timestamp": 1000,
            "origin": "browser",
            "context": {"application": "Chrome", "url": "https://app.example.com"},
            "x": 12.0,
            "y": 30,
            "element": {"tag": "button", "id": "save"}
        });

        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.kind(), EventKind::Click);
        assert_eq!(event.timestamp(), 1000);
        assert_eq!(event.origin(), Origin::Browser);
        assert_eq!(event.page_url(), Some("https://app.example.com"));
        assert_eq!(event.element().unwrap().non_empty_id(), Some("save"));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let raw = json!({"kind": "scroll", "timestamp": 1, "origin": "system"});
        assert!(serde_json::from_value::<Event>(raw).is_err());
    }

    #[test]
    fn test_serialize_shape() {
        let event = Event::typed_text(5, "Acme Corp", None)
            .with_context(EventContext::new().with_url("https://crm.example.com"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "typed_text");
        assert_eq!(json["text"], "Acme Corp");
        assert_eq!(json["context"]["url"], "https://crm.example.com");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_key_predicates() {
        assert!(Event::keystroke(1, "Enter", Modifiers::default()).is_submit_key());
        let ctrl = Modifiers { ctrl: true, ..Default::default() };
        assert!(!Event::keystroke(1, "Enter", ctrl).is_submit_key());
        assert!(Event::keystroke(1, "v", ctrl).is_paste());
        assert!(!Event::keystroke(1, "v", Modifiers::default()).is_paste());
    }

    #[test]
    fn test_navigation_page_url_is_target() {
        let event = Event::navigation(1, "https://b.example.com")
            .with_context(EventContext::new().with_url("https://a.example.com"));
        assert_eq!(event.page_url(), Some("https://b.example.com"));
    }

    #[test]
    fn test_modifier_names() {
        let mods = Modifiers { ctrl: true, shift: true, ..Default::default() };
        assert_eq!(mods.names(), vec!["ctrl", "shift"]);
        assert!(mods.any());
    }
}
