use thiserror::Error;

use crate::domain::utils::id::NodeId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write statistics CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to build internal domain model: {0}")]
    ModelConstructionError(String),

    #[error("Topology operation failed: {0}")]
    Topology(#[from] TopologyError),

    /// Commit disagreed with the feasibility check. Never a normal rejection path.
    #[error("Engine invariant violated: {0}")]
    InvariantViolation(String),
}

/// Failures of a single mutation on the topology graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Node {0} does not exist in the topology")]
    UnknownNode(NodeId),

    #[error("No edge {from} -> {to} in the topology")]
    UnknownEdge { from: NodeId, to: NodeId },

    #[error("Edge {from} -> {to} is already defined")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("Edge {from} -> {to}: requested {requested} Kbps, residual {residual} Kbps")]
    InsufficientBandwidth { from: NodeId, to: NodeId, requested: u64, residual: u64 },

    #[error("Node {node}: requested {requested} cores, residual {residual} cores")]
    InsufficientCpu { node: NodeId, requested: u32, residual: u32 },

    #[error("Releasing {amount} on {resource} would exceed its total capacity")]
    ExcessRelease { resource: String, amount: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
