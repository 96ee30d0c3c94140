use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::event::{clipboard, file_op, Event, EventContext, EventPayload, FileFilter, FileOpKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decides whether an event was produced by the capture tool's own UI
pub trait AppIdentity: Send + Sync {
    fn is_own_process(&self, context: &EventContext) -> bool;
}

/// Application names and URL prefixes that identify the capture tool itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnProcessFilter {
    pub app_names: Vec<String>,
    pub url_prefixes: Vec<String>,
}

impl Default for OwnProcessFilter {
    fn default() -> Self {
        Self {
            app_names: vec!["Process Capture".to_string()],
            url_prefixes: Vec::new(),
        }
    }
}

impl OwnProcessFilter {
    /// Builder method: add an application name
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_names.push(name.into());
        self
    }

    /// Builder method: add a URL prefix
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefixes.push(prefix.into());
        self
    }
}

/// Lowercase alphanumerics only, so "Process-Capture.app" matches "process capture"
fn normalize_app_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl AppIdentity for OwnProcessFilter {
    fn is_own_process(&self, context: &EventContext) -> bool {
        if let Some(app) = context.application.as_deref() {
            let app = normalize_app_name(app);
            let matched = !app.is_empty()
                && self
                    .app_names
                    .iter()
                    .map(|n| normalize_app_name(n))
                    .any(|n| !n.is_empty() && app.starts_with(&n));
            if matched {
                return true;
            }
        }
        match context.url.as_deref() {
            Some(url) => self.url_prefixes.iter().any(|p| !p.is_empty() && url.starts_with(p.as_str())),
            None => false,
        }
    }
}

/// Why an otherwise valid event was not recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    OwnProcess,
    IgnoredPath(String),
    IrrelevantModification(String),
    DuplicateClipboard,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnProcess => write!(f, "event came from the capture tool itself"),
            Self::IgnoredPath(fragment) => write!(f, "path matches ignored fragment '{}'", fragment),
            Self::IrrelevantModification(ext) => write!(f, "modification of '{}' file is not tracked", ext),
            Self::DuplicateClipboard => write!(f, "clipboard content unchanged"),
        }
    }
}

/// Result of normalizing one raw event
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Event(Event),
    Dropped(DropReason),
}

/// Converts raw JSON from any capture source into [`Event`]s
pub struct Normalizer {
    identity: Box<dyn AppIdentity>,
    file_filter: FileFilter,
    clipboard_max_chars: usize,
    last_clipboard: Option<String>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("file_filter", &self.file_filter)
            .field("clipboard_max_chars", &self.clipboard_max_chars)
            .finish_non_exhaustive()
    }
}

impl Normalizer {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            identity: Box::new(config.own_process.clone()),
            file_filter: config.file_filter.clone(),
            clipboard_max_chars: config.clipboard_max_chars,
            last_clipboard: None,
        }
    }

    /// Builder method: replace the own-process predicate
    pub fn with_identity(mut self, identity: impl AppIdentity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Decode, validate, filter and enrich one raw event
    ///
    /// Own-process events are dropped before decoding, so malformed events from the
    /// capture tool's UI are never reported.
    pub fn normalize(&mut self, raw: &Value) -> Result<Normalized> {
        if let Some(context) = raw.get("context") {
            if let Ok(context) = serde_json::from_value::<EventContext>(context.clone()) {
                if self.identity.is_own_process(&context) {
                    return Ok(Normalized::Dropped(DropReason::OwnProcess));
                }
            }
        }

        let event: Event =
            serde_json::from_value(raw.clone()).map_err(|e| CaptureError::MalformedEvent(e.to_string()))?;
        self.normalize_event(event)
    }

    /// Validate, filter and enrich an already decoded event
    pub fn normalize_event(&mut self, mut event: Event) -> Result<Normalized> {
        if self.identity.is_own_process(&event.context) {
            return Ok(Normalized::Dropped(DropReason::OwnProcess));
        }
        validate(&event)?;

        match &mut event.payload {
            EventPayload::ClipboardCopy(payload) => {
                if self.last_clipboard.as_deref() == Some(payload.content.as_str()) {
                    return Ok(Normalized::Dropped(DropReason::DuplicateClipboard));
                }
                self.last_clipboard = Some(payload.content.clone());
                clipboard::enrich(payload, self.clipboard_max_chars);
            }
            EventPayload::FileOp(payload) => {
                if let Some(fragment) = self.file_filter.ignored_fragment(&payload.path) {
                    return Ok(Normalized::Dropped(DropReason::IgnoredPath(fragment.to_string())));
                }
                file_op::enrich(payload);
                if payload.op == FileOpKind::Modified
                    && !self.file_filter.is_relevant_modification(&payload.extension)
                {
                    return Ok(Normalized::Dropped(DropReason::IrrelevantModification(
                        payload.extension.clone(),
                    )));
                }
            }
            _ => {}
        }

        Ok(Normalized::Event(event))
    }

    /// Forget the last clipboard content
    pub fn reset(&mut self) {
        self.last_clipboard = None;
    }
}

fn validate(event: &Event) -> Result<()> {
    let malformed = |msg: &str| Err(CaptureError::MalformedEvent(format!("{} event: {}", event.kind(), msg)));

    match &event.payload {
        EventPayload::Click(p) if !(p.x.is_finite() && p.y.is_finite()) => malformed("non-finite coordinates"),
        EventPayload::Keystroke(p) if p.key.trim().is_empty() => malformed("empty key"),
        EventPayload::Navigation(p) if p.url.trim().is_empty() => malformed("empty url"),
        EventPayload::FileOp(p) if p.path.trim().is_empty() => malformed("empty path"),
        EventPayload::FileOp(p)
            if p.op == FileOpKind::Moved && p.dest_path.as_deref().is_none_or(|d| d.trim().is_empty()) =>
        {
            malformed("move without destination")
        }
        _ => Ok(()),
    }
}
