//! Process graph model
//!
//! Nodes live in an id-keyed arena and edges reference them by id, so cycles created by
//! loops and retry branches are plain id pairs. This module includes:
//! - Node / NodeSpec: captured steps, decisions and preparation work
//! - Edge: control flow between nodes
//! - NodePatch: typed deep-merge updates
//! - ProcessGraph: the arena with its invariants and JSON persistence
//! - topological_order: stable linearization used by synthesis

pub mod edge;
pub mod metadata;
pub mod node;
pub mod patch;
pub mod process;
pub mod topo;

pub use edge::{Edge, EdgeKind};
pub use metadata::{GraphMetadata, OriginStorage, SessionMetadata, SessionState};
pub use node::{ActionKind, Branch, CapturedElement, Node, NodeAction, NodeSpec, NodeState, NodeType};
pub use patch::{ActionPatch, ContextPatch, NodePatch};
pub use process::ProcessGraph;
pub use topo::topological_order;
