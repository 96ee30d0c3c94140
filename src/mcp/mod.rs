//! MCP (Model Context Protocol) server for process capture
//!
//! Every engine command is exposed as a tool. Structured inputs (events, node patches,
//! element snapshots, session state) are passed as JSON objects in the same shape the
//! intake and persisted documents use.

pub mod handler;
pub use handler::CaptureServer;

use crate::dom::{resolve_selectors, ElementSnapshot};
use crate::engine::intake::stamp_origin;
use crate::engine::FinalizeMode;
use crate::error::CaptureError;
use crate::event::Origin;
use crate::graph::{ActionKind, Branch, EdgeKind, NodeAction, NodePatch, NodeSpec, NodeType, SessionState};
use crate::synth::{SynthesisOptions, TargetFormat, WebDialect};
use rmcp::{
    tool_router, tool,
    ErrorData as McpError,
    model::{CallToolResult, Content},
    handler::server::wrapper::Parameters,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Begin recording window parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BeginWindowParams {
    /// What the user is about to do, used as the step description
    #[serde(default)]
    pub intent: Option<String>,
}

/// Ingest event parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IngestEventParams {
    /// Raw event object: kind, timestamp, context and the kind's payload fields
    pub event: Value,
    /// Origin used when the event has none: system, browser or auxiliary (default: browser)
    #[serde(default)]
    pub origin: Option<String>,
}

/// Finalize recording window parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinalizeWindowParams {
    /// quick (create the step), extend (keep recording) or review (preview sub-steps)
    #[serde(default = "default_mode")]
    pub mode: FinalizeMode,
}

/// Node id parameter
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeIdParams {
    pub node_id: String,
}

/// Mark node parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarkNodeParams {
    pub node_id: String,
    /// Flag or unflag the node as important (default: true)
    #[serde(default = "default_true")]
    pub important: bool,
}

/// Update node parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNodeParams {
    pub node_id: String,
    /// Partial node; objects merge field by field, everything else replaces
    pub patch: Value,
}

/// Add node parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddNodeParams {
    /// action, decision, preparation or marked_action (default: action)
    #[serde(default)]
    pub node_type: Option<String>,
    /// click, fill, press_key, navigate, assert, wait, copy_data or file_operation
    #[serde(default)]
    pub kind: Option<String>,
    pub description: String,
    /// Typed text, key, URL or expected text depending on the kind
    #[serde(default)]
    pub value: Option<String>,
    /// Authentication step to skip when a session state is available
    #[serde(default)]
    pub session_setup: bool,
    /// Branch conditions of a decision node
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Add branch parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddBranchParams {
    pub decision_id: String,
    pub condition: String,
    #[serde(default)]
    pub label: String,
    /// Existing node the branch leads to
    #[serde(default)]
    pub next_node_id: Option<String>,
}

/// Add edge parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddEdgeParams {
    pub from: String,
    pub to: String,
    /// normal, branch, loop or error (default: normal)
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Export parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportParams {
    pub format: TargetFormat,
    /// Web automation flavour (default: playwright)
    #[serde(default)]
    pub dialect: Option<WebDialect>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Selector resolution parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResolveSelectorParams {
    /// Element snapshot: tag, id, classList, attributes, text, boundingBox, shadowPath, ancestors
    pub element: Value,
}

/// Session state parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionStateParams {
    /// Cookies, origins and metadata; omit to remove the stored state
    #[serde(default)]
    pub state: Option<Value>,
}

fn default_true() -> bool {
    true
}

fn default_mode() -> FinalizeMode {
    FinalizeMode::Quick
}

/// Caller mistakes become invalid-params errors, everything else is internal
fn to_mcp_error(err: CaptureError) -> McpError {
    match err {
        CaptureError::NodeNotFound(_)
        | CaptureError::DanglingReference(_)
        | CaptureError::DuplicateNode(_)
        | CaptureError::NodeLocked(_)
        | CaptureError::InvalidOperation(_)
        | CaptureError::NoActiveWindow
        | CaptureError::WindowAlreadyOpen(_)
        | CaptureError::UnsupportedFormat(_)
        | CaptureError::InvalidGraph(_)
        | CaptureError::MalformedEvent(_) => McpError::invalid_params(err.to_string(), None),
        _ => McpError::internal_error(err.to_string(), None),
    }
}

fn parse<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|e| McpError::invalid_params(format!("Invalid {}: {}", what, e), None))
}

/// Snake-case tag such as `marked_action` into its enum
fn parse_tag<T: DeserializeOwned>(what: &str, tag: &str) -> Result<T, McpError> {
    parse(what, Value::String(tag.trim().to_lowercase()))
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl CaptureServer {
    /// Open a recording window
    #[tool(description = "Start buffering captured events for a new process step")]
    fn begin_recording_window(
        &self,
        params: Parameters<BeginWindowParams>,
    ) -> Result<CallToolResult, McpError> {
        self.engine()?
            .begin_recording_window(params.0.intent)
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text("Recording window opened")]))
    }

    /// Feed one captured event
    #[tool(description = "Ingest one captured event (click, keystroke, typed_text, navigation, clipboard_copy, file_op)")]
    fn ingest_event(
        &self,
        params: Parameters<IngestEventParams>,
    ) -> Result<CallToolResult, McpError> {
        let origin: Origin = match params.0.origin.as_deref() {
            Some(origin) => parse_tag("origin", origin)?,
            None => Origin::Browser,
        };
        let mut raw = params.0.event;
        stamp_origin(&mut raw, origin);

        let outcome = self.engine()?.ingest_event(&raw).map_err(to_mcp_error)?;
        json_result(&outcome)
    }

    /// Close, extend or review the open window
    #[tool(description = "Finalize the open recording window: quick creates the step, extend keeps recording, review previews the sub-steps")]
    fn finalize_recording_window(
        &self,
        params: Parameters<FinalizeWindowParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .engine()?
            .finalize_recording_window(params.0.mode)
            .map_err(to_mcp_error)?;
        json_result(&outcome)
    }

    #[tool(description = "Discard the open recording window and its buffered events")]
    fn cancel_recording_window(&self) -> Result<CallToolResult, McpError> {
        let discarded = self.engine()?.cancel_recording_window().map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Recording window cancelled, {} event(s) discarded",
            discarded
        ))]))
    }

    #[tool(description = "Flag a step as important so it is replayed event by event")]
    fn mark_node(
        &self,
        params: Parameters<MarkNodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let node = self
            .engine()?
            .mark_node(&params.0.node_id, params.0.important)
            .map_err(to_mcp_error)?;
        json_result(&node)
    }

    #[tool(description = "Merge a partial update into a step")]
    fn update_node(
        &self,
        params: Parameters<UpdateNodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let patch: NodePatch = parse("patch", params.0.patch)?;
        let node = self
            .engine()?
            .update_node(&params.0.node_id, patch)
            .map_err(to_mcp_error)?;
        json_result(&node)
    }

    /// Add a node that was not recorded
    #[tool(description = "Add a step by hand, e.g. a decision point or a session preparation, after the current step")]
    fn add_node(
        &self,
        params: Parameters<AddNodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let node_type: NodeType = match params.node_type.as_deref() {
            Some(tag) => parse_tag("node type", tag)?,
            None => NodeType::Action,
        };
        let kind: ActionKind = match (params.kind.as_deref(), node_type) {
            (Some(tag), _) => parse_tag("action kind", tag)?,
            (None, NodeType::Decision) => ActionKind::Assert,
            (None, _) => ActionKind::Wait,
        };

        let mut action = NodeAction::new(kind, params.description);
        action.value = params.value;
        let mut spec = NodeSpec::new(node_type, action).session_setup(params.session_setup);
        for condition in params.conditions {
            spec = spec.with_branch(Branch::new(condition, ""));
        }

        let node = self.engine()?.add_node(spec).map_err(to_mcp_error)?;
        json_result(&node)
    }

    #[tool(description = "Append a branch to a decision step")]
    fn add_branch(
        &self,
        params: Parameters<AddBranchParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let branch = self
            .engine()?
            .add_branch(
                &params.decision_id,
                &params.condition,
                &params.label,
                params.next_node_id.as_deref(),
            )
            .map_err(to_mcp_error)?;
        json_result(&branch)
    }

    #[tool(description = "Connect two existing steps")]
    fn add_edge(
        &self,
        params: Parameters<AddEdgeParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let kind: EdgeKind = match params.kind.as_deref() {
            Some(tag) => parse_tag("edge kind", tag)?,
            None => EdgeKind::Normal,
        };
        let edge = self
            .engine()?
            .connect(&params.from, &params.to, kind, params.condition)
            .map_err(to_mcp_error)?;
        json_result(&edge)
    }

    #[tool(description = "Delete a step and every edge touching it")]
    fn delete_node(
        &self,
        params: Parameters<NodeIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let node = self.engine()?.delete_node(&params.0.node_id).map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted step {}: {}",
            node.step, node.action.description
        ))]))
    }

    #[tool(description = "Choose the step that the next recorded step follows")]
    fn set_current_node(
        &self,
        params: Parameters<NodeIdParams>,
    ) -> Result<CallToolResult, McpError> {
        self.engine()?
            .set_current(Some(&params.0.node_id))
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text("Current step updated")]))
    }

    /// Generate code or documentation
    #[tool(description = "Export the captured process as web automation, desktop automation, documentation or a diagram")]
    fn export_graph(
        &self,
        params: Parameters<ExportParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut options = SynthesisOptions::default();
        if let Some(dialect) = params.dialect {
            options = options.web_dialect(dialect);
        }
        if let Some(title) = params.title {
            options = options.title(title);
        }

        let artifact = self
            .engine()?
            .export_graph(params.format, &options)
            .map_err(to_mcp_error)?;

        let mut content = vec![Content::text(artifact.content)];
        if !artifact.warnings.is_empty() {
            content.push(Content::text(format!("Warnings:\n- {}", artifact.warnings.join("\n- "))));
        }
        Ok(CallToolResult::success(content))
    }

    #[tool(description = "Remove every captured step")]
    fn clear_graph(&self) -> Result<CallToolResult, McpError> {
        self.engine()?.clear_graph();
        Ok(CallToolResult::success(vec![Content::text("Graph cleared")]))
    }

    #[tool(description = "Return the process graph as its persisted JSON document")]
    fn get_graph(&self) -> Result<CallToolResult, McpError> {
        let json = self.engine()?.save().map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Rank locator strategies for an element snapshot")]
    fn resolve_selector(
        &self,
        params: Parameters<ResolveSelectorParams>,
    ) -> Result<CallToolResult, McpError> {
        let element: ElementSnapshot = parse("element", params.0.element)?;
        json_result(&resolve_selectors(&element))
    }

    #[tool(description = "Store a captured session state so sign-in steps are skipped in generated code")]
    fn set_session_state(
        &self,
        params: Parameters<SessionStateParams>,
    ) -> Result<CallToolResult, McpError> {
        let state: Option<SessionState> = match params.0.state {
            Some(value) => Some(parse("session state", value)?),
            None => None,
        };
        let message = match &state {
            Some(state) => format!("Session state stored ({} cookie(s))", state.cookie_count()),
            None => "Session state removed".to_string(),
        };
        self.engine()?.set_session_state(state);
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(result: &CallToolResult) -> String {
        serde_json::to_value(&result.content).unwrap()[0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_record_and_export_through_tools() {
        let server = CaptureServer::default();
        server
            .begin_recording_window(Parameters(BeginWindowParams {
                intent: Some("Open dashboard".to_string()),
            }))
            .unwrap();
        let result = server
            .ingest_event(Parameters(IngestEventParams {
                event: json!({"kind": "navigation", "timestamp": 1, "url": "https://app.example.com"}),
                origin: None,
            }))
            .unwrap();
        assert!(text(&result).contains("\"outcome\": \"buffered\""));

        let result = server
            .finalize_recording_window(Parameters(FinalizeWindowParams { mode: FinalizeMode::Quick }))
            .unwrap();
        assert!(text(&result).contains("\"outcome\": \"created\""));

        let result = server
            .export_graph(Parameters(ExportParams {
                format: TargetFormat::Diagram,
                dialect: None,
                title: Some("Dashboard".to_string()),
            }))
            .unwrap();
        assert!(text(&result).contains("flowchart TD"));
    }

    #[test]
    fn test_invalid_inputs_are_reported() {
        let server = CaptureServer::default();
        assert!(server
            .mark_node(Parameters(MarkNodeParams {
                node_id: "missing".to_string(),
                important: true,
            }))
            .is_err());
        assert!(server
            .add_node(Parameters(AddNodeParams {
                node_type: Some("subprocess".to_string()),
                kind: None,
                description: "x".to_string(),
                value: None,
                session_setup: false,
                conditions: Vec::new(),
            }))
            .is_err());
        assert!(server
            .resolve_selector(Parameters(ResolveSelectorParams { element: json!({"id": 1}) }))
            .is_err());
    }

    #[test]
    fn test_add_decision_node() {
        let server = CaptureServer::default();
        let result = server
            .add_node(Parameters(AddNodeParams {
                node_type: Some("Decision".to_string()),
                kind: None,
                description: "Order in stock?".to_string(),
                value: None,
                session_setup: false,
                conditions: vec!["yes".to_string(), "no".to_string()],
            }))
            .unwrap();
        let node: Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(node["type"], "decision");
        assert_eq!(node["action"]["kind"], "assert");
        assert_eq!(node["branches"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_selector_tool() {
        let server = CaptureServer::default();
        let result = server
            .resolve_selector(Parameters(ResolveSelectorParams {
                element: json!({"tag": "button", "attributes": {"data-testid": "save"}}),
            }))
            .unwrap();
        let set: Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(set["candidates"][0]["strategy"], "data_attr");
    }
}
