use std::collections::HashSet;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, TopologyError};

/// A physical node able to host middlebox instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub num_cores: u32,
    pub residual_cores: u32,
}

impl Node {
    pub fn new(id: NodeId, num_cores: u32) -> Self {
        Self { id, num_cores, residual_cores: num_cores }
    }

    pub fn used_cores(&self) -> u32 {
        self.num_cores - self.residual_cores
    }
}

/// Directed adjacency record. The target is an index into the node arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEndpoint {
    pub target: NodeId,

    /// Capacity in Kbps.
    pub bandwidth: u64,

    /// Unreserved capacity in Kbps, always `<= bandwidth`.
    pub residual_bandwidth: u64,

    /// Propagation delay in milliseconds.
    pub delay: u64,
}

impl EdgeEndpoint {
    pub fn new(target: NodeId, bandwidth: u64, delay: u64) -> Self {
        Self { target, bandwidth, residual_bandwidth: bandwidth, delay }
    }
}

/// Models the physical network as an adjacency list over a node arena.
///
/// Node ids are dense indices `0..num_nodes()`. Every lookup is bounds checked;
/// an out-of-range id yields `None` or `TopologyError::UnknownNode`.
///
/// The only mutations are reservations and releases of residual capacity. A
/// failed reservation leaves the graph untouched.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,

    /// Outgoing edges, indexed by source node.
    adjacency: Vec<Vec<EdgeEndpoint>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, num_cores: u32) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(id, num_cores));
        self.adjacency.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, bandwidth: u64, delay: u64) -> Result<(), TopologyError> {
        self.node(to).ok_or(TopologyError::UnknownNode(to))?;

        if self.edge(from, to).is_some() {
            return Err(TopologyError::DuplicateEdge { from, to });
        }

        let edges = self.adjacency.get_mut(from.index()).ok_or(TopologyError::UnknownNode(from))?;
        edges.push(EdgeEndpoint::new(to, bandwidth, delay));
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    /// Outgoing edges of `id`; empty for an unknown node.
    pub fn edges(&self, id: NodeId) -> &[EdgeEndpoint] {
        self.adjacency.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges as `(source, endpoint)` pairs.
    pub fn all_edges(&self) -> impl Iterator<Item = (NodeId, &EdgeEndpoint)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(source, edges)| edges.iter().map(move |edge| (NodeId::new(source), edge)))
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&EdgeEndpoint> {
        self.edges(from).iter().find(|edge| edge.target == to)
    }

    fn edge_mut(&mut self, from: NodeId, to: NodeId) -> Result<&mut EdgeEndpoint, TopologyError> {
        if !self.contains(to) {
            return Err(TopologyError::UnknownNode(to));
        }

        self.adjacency
            .get_mut(from.index())
            .ok_or(TopologyError::UnknownNode(from))?
            .iter_mut()
            .find(|edge| edge.target == to)
            .ok_or(TopologyError::UnknownEdge { from, to })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TopologyError> {
        self.nodes.get_mut(id.index()).ok_or(TopologyError::UnknownNode(id))
    }

    pub fn reserve_bandwidth(&mut self, from: NodeId, to: NodeId, amount: u64) -> Result<(), TopologyError> {
        let edge = self.edge_mut(from, to)?;

        if amount > edge.residual_bandwidth {
            return Err(TopologyError::InsufficientBandwidth { from, to, requested: amount, residual: edge.residual_bandwidth });
        }

        edge.residual_bandwidth -= amount;
        Ok(())
    }

    pub fn release_bandwidth(&mut self, from: NodeId, to: NodeId, amount: u64) -> Result<(), TopologyError> {
        let edge = self.edge_mut(from, to)?;

        if edge.residual_bandwidth + amount > edge.bandwidth {
            return Err(TopologyError::ExcessRelease { resource: format!("edge {} -> {}", from, to), amount });
        }

        edge.residual_bandwidth += amount;
        Ok(())
    }

    pub fn reserve_cores(&mut self, id: NodeId, amount: u32) -> Result<(), TopologyError> {
        let node = self.node_mut(id)?;

        if amount > node.residual_cores {
            return Err(TopologyError::InsufficientCpu { node: id, requested: amount, residual: node.residual_cores });
        }

        node.residual_cores -= amount;
        Ok(())
    }

    pub fn release_cores(&mut self, id: NodeId, amount: u32) -> Result<(), TopologyError> {
        let node = self.node_mut(id)?;

        if node.residual_cores + amount > node.num_cores {
            return Err(TopologyError::ExcessRelease { resource: format!("node {}", id), amount: u64::from(amount) });
        }

        node.residual_cores += amount;
        Ok(())
    }

    /// Sum of edge delays along `path`, or `None` if two consecutive nodes are not adjacent.
    pub fn path_delay(&self, path: &[NodeId]) -> Option<u64> {
        path.windows(2).map(|hop| self.edge(hop[0], hop[1]).map(|edge| edge.delay)).sum()
    }

    /// Smallest residual bandwidth along `path`. A single-node path has no bottleneck.
    pub fn path_bottleneck(&self, path: &[NodeId]) -> Option<u64> {
        path.windows(2).map(|hop| self.edge(hop[0], hop[1]).map(|edge| edge.residual_bandwidth)).try_fold(u64::MAX, |acc, bw| bw.map(|bw| acc.min(bw)))
    }

    /// Mean share of reserved bandwidth over all edges with nonzero capacity.
    pub fn bandwidth_utilization(&self) -> f64 {
        let shares: Vec<f64> = self
            .all_edges()
            .filter(|(_, edge)| edge.bandwidth > 0)
            .map(|(_, edge)| (edge.bandwidth - edge.residual_bandwidth) as f64 / edge.bandwidth as f64)
            .collect();

        if shares.is_empty() { 0.0 } else { shares.iter().sum::<f64>() / shares.len() as f64 }
    }

    /// Share of reserved cores over all nodes.
    pub fn core_utilization(&self) -> f64 {
        let total: u64 = self.nodes.iter().map(|node| u64::from(node.num_cores)).sum();
        let used: u64 = self.nodes.iter().map(|node| u64::from(node.used_cores())).sum();

        if total == 0 { 0.0 } else { used as f64 / total as f64 }
    }
}

impl TryFrom<&ScenarioDto> for Topology {
    type Error = Error;

    /// Node ids in the DTO must form the dense range `0..nodes.len()`, in any order.
    fn try_from(dto: &ScenarioDto) -> Result<Self, Self::Error> {
        let mut cores: Vec<Option<u32>> = vec![None; dto.nodes.len()];

        for node in &dto.nodes {
            let slot = cores.get_mut(node.id).ok_or_else(|| {
                Error::ModelConstructionError(format!("Node id {} is outside the dense range 0..{}", node.id, dto.nodes.len()))
            })?;

            if slot.replace(node.num_cores).is_some() {
                return Err(Error::ModelConstructionError(format!("Node id {} is defined twice", node.id)));
            }
        }

        let mut topology = Topology::new();
        for num_cores in cores.into_iter().flatten() {
            topology.add_node(num_cores);
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for edge in &dto.edges {
            let mut directions = vec![(edge.source, edge.target)];
            if edge.bidirectional {
                directions.push((edge.target, edge.source));
            }

            for (from, to) in directions {
                if !seen.insert((from, to)) {
                    log::warn!("DuplicateEdge: {} -> {} is defined more than once, keeping the first definition", from, to);
                    continue;
                }

                topology
                    .add_edge(NodeId::new(from), NodeId::new(to), edge.bandwidth, edge.delay)
                    .map_err(|e| Error::ModelConstructionError(format!("Invalid edge {} -> {}: {}", from, to, e)))?;
            }
        }

        if topology.num_edges() == 0 {
            log::info!("Empty network: the topology contains {} nodes but no edges.", topology.num_nodes());
        }

        Ok(topology)
    }
}
