use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Normal,
    Branch,
    Loop,
    Error,
}

/// Directed control-flow link between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,

    #[serde(default)]
    pub kind: EdgeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            id: format!("edge-{}", uuid::Uuid::new_v4()),
            from: from.into(),
            to: to.into(),
            kind,
            condition: None,
        }
    }

    /// Builder method: set condition
    pub fn with_condition(mut self, condition: Option<String>) -> Self {
        self.condition = condition;
        self
    }

    /// Whether the edge touches `node_id`
    pub fn is_incident(&self, node_id: &str) -> bool {
        self.from == node_id || self.to == node_id
    }
}
