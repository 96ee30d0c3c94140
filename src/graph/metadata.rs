use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Captured browser session, passed through untouched into generated code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<Value>,

    #[serde(default)]
    pub origins: Vec<OriginStorage>,

    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginStorage {
    pub origin: String,

    #[serde(default = "empty_list")]
    pub local_storage: Value,

    #[serde(default = "empty_list")]
    pub session_storage: Value,
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl SessionState {
    /// Playwright `storageState` document (cookies and origins only)
    pub fn storage_state(&self) -> Value {
        serde_json::json!({
            "cookies": self.cookies,
            "origins": self.origins,
        })
    }

    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }
}

/// Graph-level information persisted alongside nodes and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub name: String,

    /// Milliseconds since the Unix epoch
    pub created_at: u64,
    pub updated_at: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<SessionState>,
}

impl GraphMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            name: name.into(),
            created_at: now,
            updated_at: now,
            session_state: None,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self::new("Untitled process")
    }
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_shape() {
        let state: SessionState = serde_json::from_value(serde_json::json!({
            "cookies": [{"name": "sid", "value": "abc", "domain": ".example.com"}],
            "origins": [{"origin": "https://example.com", "localStorage": [{"name": "k", "value": "v"}]}],
            "metadata": {"capturedAt": "2024-05-01T10:00:00Z", "domain": "example.com"}
        }))
        .unwrap();

        assert_eq!(state.cookie_count(), 1);
        assert_eq!(state.origins[0].origin, "https://example.com");
        let storage = state.storage_state();
        assert_eq!(storage["cookies"][0]["name"], "sid");
        assert_eq!(storage["origins"][0]["localStorage"][0]["value"], "v");
        assert!(storage.get("metadata").is_none());
    }
}
