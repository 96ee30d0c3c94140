use thiserror::Error;

/// Errors produced by the capture pipeline
///
/// Only `DanglingReference`, `NodeNotFound` and the other graph-state variants abort an
/// operation. `MalformedEvent`, `NoStableSelector`, `SegmentationAmbiguous` and
/// `SynthesisPartialFailure` are reported through logs and outcome values; capture and
/// synthesis continue past them.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A raw event could not be decoded or failed validation
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// An edge or branch referenced a node that does not exist
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    /// The addressed node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node with the requested id already exists
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// The node was explicitly locked and can no longer be updated
    #[error("Node is locked: {0}")]
    NodeLocked(String),

    /// The operation is not valid for the node's type or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Only coordinate or structural fallbacks could be derived for an element
    #[error("No stable selector: {0}")]
    NoStableSelector(String),

    /// Boundary heuristics could not decide; the segmenter kept the events together
    #[error("Ambiguous segmentation: {0}")]
    SegmentationAmbiguous(String),

    /// Code for a single node could not be generated
    #[error("Synthesis failed for node '{node}': {reason}")]
    SynthesisPartialFailure { node: String, reason: String },

    /// A command required an open recording window
    #[error("No recording window is open")]
    NoActiveWindow,

    /// A recording window is already open
    #[error("Recording window '{0}' is already open")]
    WindowAlreadyOpen(String),

    /// Unknown export format tag
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A persisted graph violated a structural invariant
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// The engine's intake queue is gone
    #[error("Intake channel closed")]
    ChannelClosed,

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading configuration or event streams failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;
