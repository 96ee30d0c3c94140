use crate::dom::{ElementSnapshot, SelectorSet};
use crate::event::{Event, EventContext};
use crate::segment::SubStep;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// A captured step, synthesized from its action and selector
    Action,
    /// A branch point; its outgoing edges mirror `branches`
    Decision,
    /// Setup work such as signing in or opening a file
    Preparation,
    /// A step the user flagged as important; replayed event by event
    MarkedAction,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Action => "action",
            Self::Decision => "decision",
            Self::Preparation => "preparation",
            Self::MarkedAction => "marked_action",
        };
        f.write_str(name)
    }
}

/// Node lifecycle; locking is tracked separately
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Recording,
    Closed,
    Exported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Fill,
    PressKey,
    Navigate,
    Assert,
    Wait,
    CopyData,
    FileOperation,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Click => "click",
            Self::Fill => "fill",
            Self::PressKey => "press_key",
            Self::Navigate => "navigate",
            Self::Assert => "assert",
            Self::Wait => "wait",
            Self::CopyData => "copy_data",
            Self::FileOperation => "file_operation",
        };
        f.write_str(name)
    }
}

/// What a node does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAction {
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: u64,

    /// Typed text, key, URL, expected text or wait duration depending on `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Followed by a submit keystroke
    #[serde(default)]
    pub submit: bool,
}

impl NodeAction {
    pub fn new(kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            timestamp: 0,
            value: None,
            submit: false,
        }
    }

    /// Builder method: set value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set timestamp
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder method: mark as submitted
    pub fn submitted(mut self, submit: bool) -> Self {
        self.submit = submit;
        self
    }
}

/// The element a node acts on, with its resolved locators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedElement {
    pub snapshot: ElementSnapshot,
    pub selectors: SelectorSet,
}

/// One outgoing path of a Decision node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub condition: String,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
}

impl Branch {
    pub fn new(condition: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            condition: condition.into(),
            label: label.into(),
            next_node_id: None,
        }
    }

    /// Builder method: set the target node
    pub fn to(mut self, node_id: impl Into<String>) -> Self {
        self.next_node_id = Some(node_id.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.next_node_id.is_none()
    }
}

/// One step of a captured process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Creation order, starting at 1
    pub step: u32,

    pub action: NodeAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<CapturedElement>,

    #[serde(default)]
    pub context: EventContext,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_steps: Vec<SubStep>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_events: Vec<Event>,

    #[serde(default)]
    pub important: bool,

    /// Authentication or session preparation; skipped when a session state is restored
    #[serde(default)]
    pub session_setup: bool,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub state: NodeState,

    /// Intent the user gave when the recording window opened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl Node {
    pub fn is_decision(&self) -> bool {
        self.node_type == NodeType::Decision
    }

    /// Selector set of the node's element, if any
    pub fn selectors(&self) -> Option<&SelectorSet> {
        self.element.as_ref().map(|e| &e.selectors)
    }

    /// Branch leading to `node_id`
    pub fn branch_to(&self, node_id: &str) -> Option<&Branch> {
        self.branches
            .iter()
            .find(|b| b.next_node_id.as_deref() == Some(node_id))
    }

    /// Set the important flag; plain actions flip to and from marked actions with it
    pub fn set_important(&mut self, important: bool) {
        self.important = important;
        self.node_type = match (self.node_type, important) {
            (NodeType::Action, true) => NodeType::MarkedAction,
            (NodeType::MarkedAction, false) => NodeType::Action,
            (other, _) => other,
        };
    }
}

/// Everything needed to create a node; the graph assigns step and defaults the id
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub node_type: NodeType,
    pub action: NodeAction,
    pub element: Option<CapturedElement>,
    pub context: EventContext,
    pub branches: Vec<Branch>,
    pub sub_steps: Vec<SubStep>,
    pub raw_events: Vec<Event>,
    pub session_setup: bool,
    pub intent: Option<String>,
}

impl NodeSpec {
    pub fn new(node_type: NodeType, action: NodeAction) -> Self {
        Self {
            id: None,
            node_type,
            action,
            element: None,
            context: EventContext::default(),
            branches: Vec::new(),
            sub_steps: Vec::new(),
            raw_events: Vec::new(),
            session_setup: false,
            intent: None,
        }
    }

    /// Action node
    pub fn action(kind: ActionKind, description: impl Into<String>) -> Self {
        Self::new(NodeType::Action, NodeAction::new(kind, description))
    }

    /// Decision node; its action is an assertion of the deciding condition
    pub fn decision(description: impl Into<String>) -> Self {
        Self::new(NodeType::Decision, NodeAction::new(ActionKind::Assert, description))
    }

    /// Builder method: set id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set element and selectors
    pub fn with_element(mut self, snapshot: ElementSnapshot, selectors: SelectorSet) -> Self {
        self.element = Some(CapturedElement { snapshot, selectors });
        self
    }

    /// Builder method: set context
    pub fn with_context(mut self, context: EventContext) -> Self {
        self.context = context;
        self
    }

    /// Builder method: add a branch
    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Builder method: set sub-steps
    pub fn with_sub_steps(mut self, sub_steps: Vec<SubStep>) -> Self {
        self.sub_steps = sub_steps;
        self
    }

    /// Builder method: set raw events
    pub fn with_raw_events(mut self, events: Vec<Event>) -> Self {
        self.raw_events = events;
        self
    }

    /// Builder method: flag as session setup
    pub fn session_setup(mut self, session_setup: bool) -> Self {
        self.session_setup = session_setup;
        self
    }

    /// Builder method: set intent
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Builder method: replace the action
    pub fn with_action(mut self, action: NodeAction) -> Self {
        self.action = action;
        self
    }
}
