//! Cross-application copy/paste correlation
//!
//! Links each paste keystroke with the clipboard copy that preceded it, so a workflow can
//! describe data moving from one application into another.

use crate::event::{ClipboardDataType, Event, EventContext, EventPayload};
use serde::{Deserialize, Serialize};
use std::fmt;

const TITLE_SUFFIXES: [&str; 8] = [
    " - Excel",
    " - Word",
    " - PowerPoint",
    " - Google Chrome",
    " - Mozilla Firefox",
    " - Safari",
    " \u{2014} ",
    " \u{2013} ",
];

/// Broad application category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    Spreadsheet,
    Document,
    Presentation,
    WebApplication,
    CodeEditor,
    Unknown,
}

impl AppType {
    /// Infer from an application name
    pub fn infer(application: Option<&str>) -> Self {
        let Some(name) = application else {
            return Self::Unknown;
        };
        let name = name.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

        if has(&["excel", "sheets", "numbers"]) {
            Self::Spreadsheet
        } else if has(&["word", "docs", "pages"]) {
            Self::Document
        } else if has(&["powerpoint", "slides", "keynote"]) {
            Self::Presentation
        } else if has(&["chrome", "safari", "firefox", "edge"]) {
            Self::WebApplication
        } else if has(&["code", "sublime", "atom"]) {
            Self::CodeEditor
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spreadsheet => "spreadsheet",
            Self::Document => "document",
            Self::Presentation => "presentation",
            Self::WebApplication => "web_application",
            Self::CodeEditor => "code_editor",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One end of a data flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEndpoint {
    pub event_index: usize,
    pub timestamp: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    pub app_type: AppType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

/// Clipboard content copied in one place and pasted in another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlow {
    pub source: FlowEndpoint,
    pub destination: FlowEndpoint,
    pub data_type: ClipboardDataType,
    pub preview: String,
    pub transformation: String,
}

impl DataFlow {
    pub fn is_cross_application(&self) -> bool {
        self.source.application != self.destination.application
    }
}

/// Pair every paste with the most recent earlier copy
pub fn data_flows(events: &[Event]) -> Vec<DataFlow> {
    let mut flows = Vec::new();
    let mut last_copy: Option<usize> = None;

    for (index, event) in events.iter().enumerate() {
        if matches!(event.payload(), EventPayload::ClipboardCopy(_)) {
            last_copy = Some(index);
            continue;
        }
        if !event.is_paste() {
            continue;
        }
        let Some(copy_index) = last_copy else {
            log::debug!("Paste at {} has no preceding copy", event.timestamp());
            continue;
        };
        let copy = &events[copy_index];
        let EventPayload::ClipboardCopy(clip) = copy.payload() else {
            continue;
        };

        let source = endpoint(copy_index, copy);
        let destination = endpoint(index, event);
        let transformation = transformation(source.app_type, destination.app_type).to_string();

        flows.push(DataFlow {
            source,
            destination,
            data_type: clip.data_type,
            preview: clip.preview.clone(),
            transformation,
        });
    }

    flows
}

fn endpoint(index: usize, event: &Event) -> FlowEndpoint {
    let context = event.context();
    FlowEndpoint {
        event_index: index,
        timestamp: event.timestamp(),
        application: context.application.clone(),
        app_type: AppType::infer(context.application.as_deref()),
        document: document_name(context),
    }
}

/// Document name from a window title such as "Book1.xlsx - Excel"
pub fn document_name(context: &EventContext) -> Option<String> {
    let title = context.window_title.as_deref()?.trim();
    if title.is_empty() {
        return None;
    }
    let name = TITLE_SUFFIXES
        .iter()
        .find_map(|suffix| title.split_once(suffix).map(|(head, _)| head))
        .unwrap_or(title);
    Some(name.trim().to_string())
}

/// How data changes shape between application categories
pub fn transformation(from: AppType, to: AppType) -> &'static str {
    use AppType::*;
    match (from, to) {
        (Spreadsheet, Document) => "table_to_text",
        (Spreadsheet, Presentation) => "data_to_slide",
        (Spreadsheet, WebApplication) => "data_to_form",
        (Document, Spreadsheet) => "text_to_cells",
        (Document, Presentation) => "text_to_slide",
        (Document, WebApplication) => "text_to_form",
        (WebApplication, Spreadsheet) => "web_to_data",
        (WebApplication, Document) => "web_to_text",
        _ => "direct_paste",
    }
}
