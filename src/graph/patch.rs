//! Typed deep-merge updates for nodes
//!
//! Object-valued fields (`action`, `context`) merge field by field. Every other field,
//! including collections (`branches`, `subSteps`, `rawEvents`), replaces the old value.
//! Absent fields leave the node untouched.

use crate::dom::ElementSnapshot;
use crate::event::{Event, EventContext};
use crate::graph::node::{ActionKind, Branch, Node, NodeAction, NodeType};
use crate::segment::SubStep;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<bool>,
}

impl ActionPatch {
    fn merge_into(self, action: &mut NodeAction) {
        if let Some(kind) = self.kind {
            action.kind = kind;
        }
        if let Some(description) = self.description {
            action.description = description;
        }
        if let Some(timestamp) = self.timestamp {
            action.timestamp = timestamp;
        }
        if let Some(value) = self.value {
            action.value = Some(value);
        }
        if let Some(submit) = self.submit {
            action.submit = submit;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
}

impl ContextPatch {
    fn merge_into(self, context: &mut EventContext) {
        if self.application.is_some() {
            context.application = self.application;
        }
        if self.url.is_some() {
            context.url = self.url;
        }
        if self.window_title.is_some() {
            context.window_title = self.window_title;
        }
    }
}

/// Partial node update
///
/// `element` takes a bare snapshot; the graph re-resolves its selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodePatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Branch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_steps: Option<Vec<SubStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_events: Option<Vec<Event>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_setup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl NodePatch {
    /// Builder method: patch the action description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.action.get_or_insert_with(ActionPatch::default).description = Some(description.into());
        self
    }

    /// Builder method: patch the action value
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.action.get_or_insert_with(ActionPatch::default).value = Some(value.into());
        self
    }

    /// Builder method: patch the URL context
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.context.get_or_insert_with(ContextPatch::default).url = Some(url.into());
        self
    }

    /// Builder method: replace the branch list
    pub fn branches(mut self, branches: Vec<Branch>) -> Self {
        self.branches = Some(branches);
        self
    }

    /// Builder method: set the session-setup flag
    pub fn session_setup(mut self, session_setup: bool) -> Self {
        self.session_setup = Some(session_setup);
        self
    }

    /// Apply every field except `element` and `branches`, which need graph context
    pub(crate) fn merge_scalars(self, node: &mut Node) -> (Option<ElementSnapshot>, Option<Vec<Branch>>) {
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(action) = self.action {
            action.merge_into(&mut node.action);
        }
        if let Some(context) = self.context {
            context.merge_into(&mut node.context);
        }
        if let Some(sub_steps) = self.sub_steps {
            node.sub_steps = sub_steps;
        }
        if let Some(raw_events) = self.raw_events {
            node.raw_events = raw_events;
        }
        if let Some(important) = self.important {
            node.set_important(important);
        }
        if let Some(session_setup) = self.session_setup {
            node.session_setup = session_setup;
        }
        if let Some(intent) = self.intent {
            node.intent = Some(intent);
        }
        (self.element, self.branches)
    }
}
