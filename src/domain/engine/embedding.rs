use std::fmt;

use thiserror::Error;

use crate::domain::cost::CostBreakdown;
use crate::domain::utils::id::{MiddleboxId, NodeId};

/// One middlebox instance placed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub middlebox: MiddleboxId,
    pub node: NodeId,
    pub cores: u32,
}

/// Where the path of an embedding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// A re-validated path cache entry.
    Cache,
    /// The shared cost-aware shortest path table.
    CostTable,
    /// A cost-aware search restricted to edges with enough residual bandwidth for the request.
    ConstrainedSearch,
    /// The lowest-delay path over edges with enough residual bandwidth for the request.
    DelaySearch,
}

/// The committed assignment of a traffic request to a path and middlebox hosts.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub arrival_time: u64,
    pub path: Vec<NodeId>,
    pub placements: Vec<Placement>,

    /// Bandwidth reserved on every edge of `path`, in Kbps.
    pub bandwidth: u64,

    /// Edge delays plus processing delays of the placed middleboxes, in ms.
    pub delay: u64,

    pub cost: CostBreakdown,
    pub path_source: PathSource,
}

impl Embedding {
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Why a request was not admitted. Rejections are per request and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Delay-only shortest path takes {shortest} ms, SLA allows {max_delay} ms")]
    DelayInfeasible { shortest: u64, max_delay: u64 },

    #[error("No path offers {requested} Kbps of residual bandwidth")]
    InsufficientBandwidth { requested: u64 },

    #[error("No node on the path has {cores} free cores for middlebox {middlebox}")]
    InsufficientCpu { middlebox: MiddleboxId, cores: u32 },

    #[error("Node {to} is not reachable from node {from}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("Node {0} does not exist in the topology")]
    UnknownNode(NodeId),

    #[error("Middlebox {0} does not exist in the catalog")]
    UnknownMiddlebox(MiddleboxId),
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::DelayInfeasible { .. } => RejectionKind::DelayInfeasible,
            Rejection::InsufficientBandwidth { .. } => RejectionKind::InsufficientBandwidth,
            Rejection::InsufficientCpu { .. } => RejectionKind::InsufficientCpu,
            Rejection::NoPath { .. } => RejectionKind::NoPath,
            Rejection::UnknownNode(_) | Rejection::UnknownMiddlebox(_) => RejectionKind::InvalidRequest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectionKind {
    DelayInfeasible,
    InsufficientBandwidth,
    InsufficientCpu,
    NoPath,
    InvalidRequest,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectionKind::DelayInfeasible => "DelayInfeasible",
            RejectionKind::InsufficientBandwidth => "InsufficientBandwidth",
            RejectionKind::InsufficientCpu => "InsufficientCpu",
            RejectionKind::NoPath => "NoPath",
            RejectionKind::InvalidRequest => "InvalidRequest",
        };
        write!(f, "{}", name)
    }
}

/// Result of processing one traffic request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Embedding),
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        match self {
            Outcome::Accepted(embedding) => Some(embedding),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }
}
