//! Step segmentation
//!
//! Partitions the ordered events of one recording window into [`SubStep`]s. A new
//! sub-step starts at the first event, when the page URL changes, after a pause longer
//! than the configured threshold, and after a submit keystroke that followed typed text.
//! When the URL context is unknown on either side the segmenter does not split.

pub mod naming;

pub use naming::{event_label, step_name};

use crate::config::CaptureConfig;
use crate::dom::{SelectorResolver, SelectorSet};
use crate::error::CaptureError;
use crate::event::{Event, EventPayload};
use serde::{Deserialize, Serialize};

/// A coherent group of consecutive events within a recording window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStep {
    pub id: String,
    pub name: String,

    /// Indices into the window's event array, ascending and contiguous
    pub event_indices: Vec<usize>,

    pub start_time: u64,
    pub duration_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_selector: Option<SelectorSet>,
}

impl SubStep {
    /// Events of this sub-step from the window they were segmented from
    pub fn events<'a>(&'a self, window: &'a [Event]) -> impl Iterator<Item = &'a Event> + 'a {
        self.event_indices.iter().filter_map(move |&i| window.get(i))
    }
}

/// Sub-step under construction
struct OpenStep {
    indices: Vec<usize>,
    url: Option<String>,
    closed_by_submit: bool,
}

impl OpenStep {
    fn start(index: usize, event: &Event) -> Self {
        Self {
            indices: vec![index],
            url: event.page_url().map(normalize_url),
            closed_by_submit: false,
        }
    }
}

/// Forward-pass segmenter
#[derive(Debug, Clone)]
pub struct Segmenter {
    pause_threshold_ms: u64,
    resolver: SelectorResolver,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(&CaptureConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            pause_threshold_ms: config.pause_threshold_ms,
            resolver: SelectorResolver::new(),
        }
    }

    /// Builder method: override pause threshold
    pub fn with_pause_threshold(mut self, ms: u64) -> Self {
        self.pause_threshold_ms = ms;
        self
    }

    pub fn pause_threshold_ms(&self) -> u64 {
        self.pause_threshold_ms
    }

    /// Partition `events` (timestamp ordered) into sub-steps
    pub fn segment(&self, events: &[Event]) -> Vec<SubStep> {
        let mut steps = Vec::new();
        let mut open: Option<OpenStep> = None;

        for (index, event) in events.iter().enumerate() {
            let Some(mut current) = open.take() else {
                open = Some(OpenStep::start(index, event));
                continue;
            };

            if self.is_boundary(&mut current, &events[index - 1], event) {
                steps.push(self.close(current, events, steps.len() + 1));
                current = OpenStep::start(index, event);
            } else {
                current.indices.push(index);
            }

            let previous_was_typing = current
                .indices
                .len()
                .checked_sub(2)
                .map(|i| matches!(events[current.indices[i]].payload(), EventPayload::TypedText(_)))
                .unwrap_or(false);
            if event.is_submit_key() && previous_was_typing {
                log::debug!("Submit keystroke at {} closes the current sub-step", event.timestamp());
                current.closed_by_submit = true;
            }

            open = Some(current);
        }

        if let Some(current) = open {
            steps.push(self.close(current, events, steps.len() + 1));
        }
        steps
    }

    /// Decide whether `event` opens a new sub-step; records newly learned URL context
    fn is_boundary(&self, current: &mut OpenStep, previous: &Event, event: &Event) -> bool {
        if current.closed_by_submit {
            return true;
        }

        let gap = event.timestamp().saturating_sub(previous.timestamp());
        if gap > self.pause_threshold_ms {
            log::debug!("Pause of {}ms exceeds {}ms threshold", gap, self.pause_threshold_ms);
            return true;
        }

        match (current.url.as_deref(), event.page_url().map(normalize_url)) {
            (Some(known), Some(url)) if known != url => {
                log::debug!("URL context changed from {} to {}", known, url);
                true
            }
            (None, Some(url)) => {
                let err = CaptureError::SegmentationAmbiguous(format!(
                    "sub-step had no URL context before {}, keeping events together",
                    url
                ));
                log::debug!("{}", err);
                current.url = Some(url);
                false
            }
            _ => false,
        }
    }

    fn close(&self, step: OpenStep, events: &[Event], ordinal: usize) -> SubStep {
        let members: Vec<&Event> = step.indices.iter().map(|&i| &events[i]).collect();
        let start_time = members.first().map(|e| e.timestamp()).unwrap_or_default();
        let end_time = members.last().map(|e| e.timestamp()).unwrap_or(start_time);
        let primary_selector = members
            .iter()
            .find_map(|e| e.element())
            .map(|element| self.resolver.resolve(element));

        SubStep {
            id: format!("step-{}", ordinal),
            name: step_name(&members),
            event_indices: step.indices,
            start_time,
            duration_ms: end_time.saturating_sub(start_time),
            primary_selector,
        }
    }
}

/// Fragments and a trailing slash do not change the page
fn normalize_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}
