use crate::error::Result;
use crate::event::{FileFilter, OwnProcessFilter};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capture pipeline configuration
///
/// The timing thresholds are empirical defaults; tune them per environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Gap between two events that starts a new sub-step (ms)
    pub pause_threshold_ms: u64,

    /// Soft timeout of a recording window, measured from its first event (ms)
    pub window_duration_ms: u64,

    /// Bounded intake queue size
    pub intake_capacity: usize,

    /// Events kept in the session-wide chronological buffer
    pub session_buffer_capacity: usize,

    /// Clipboard content beyond this many characters is truncated
    pub clipboard_max_chars: usize,

    /// Reopen a recording window automatically after a soft timeout
    pub continuous: bool,

    pub own_process: OwnProcessFilter,

    pub file_filter: FileFilter,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pause_threshold_ms: 3000,
            window_duration_ms: 30_000,
            intake_capacity: 1024,
            session_buffer_capacity: 10_000,
            clipboard_max_chars: 1000,
            continuous: false,
            own_process: OwnProcessFilter::default(),
            file_filter: FileFilter::default(),
        }
    }
}

impl CaptureConfig {
    /// Create config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        log::debug!("Loaded capture config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Set pause threshold
    pub fn pause_threshold_ms(mut self, ms: u64) -> Self {
        self.pause_threshold_ms = ms;
        self
    }

    /// Set recording window duration
    pub fn window_duration_ms(mut self, ms: u64) -> Self {
        self.window_duration_ms = ms;
        self
    }

    /// Set intake queue capacity
    pub fn intake_capacity(mut self, capacity: usize) -> Self {
        self.intake_capacity = capacity.max(1);
        self
    }

    /// Set session buffer capacity
    pub fn session_buffer_capacity(mut self, capacity: usize) -> Self {
        self.session_buffer_capacity = capacity;
        self
    }

    /// Set clipboard truncation length
    pub fn clipboard_max_chars(mut self, chars: usize) -> Self {
        self.clipboard_max_chars = chars;
        self
    }

    /// Enable or disable continuous recording
    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Set the own-process filter
    pub fn own_process(mut self, filter: OwnProcessFilter) -> Self {
        self.own_process = filter;
        self
    }

    /// Set the file event filter
    pub fn file_filter(mut self, filter: FileFilter) -> Self {
        self.file_filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.pause_threshold_ms, 3000);
        assert_eq!(config.window_duration_ms, 30_000);
        assert_eq!(config.clipboard_max_chars, 1000);
        assert!(!config.continuous);
    }

    #[test]
    fn test_builder() {
        let config = CaptureConfig::new().pause_threshold_ms(500).continuous(true).intake_capacity(0);
        assert_eq!(config.pause_threshold_ms, 500);
        assert!(config.continuous);
        assert_eq!(config.intake_capacity, 1);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pauseThresholdMs": 1200, "ownProcess": {{"appNames": ["Recorder"]}}}}"#).unwrap();

        let config = CaptureConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pause_threshold_ms, 1200);
        assert_eq!(config.window_duration_ms, 30_000);
        assert_eq!(config.own_process.app_names, vec!["Recorder"]);
        assert!(config.own_process.url_prefixes.is_empty());
    }

    #[test]
    fn test_from_file_missing() {
        assert!(CaptureConfig::from_file("/nonexistent/capture.json").is_err());
    }
}
