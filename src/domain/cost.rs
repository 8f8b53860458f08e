use crate::domain::catalog::middlebox::Middlebox;
use crate::domain::topology::graph::{EdgeEndpoint, Topology};

/// Bits per second in one Kbps.
const BITS_PER_KBPS: f64 = 1000.0;

/// The two global cost coefficients of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostCoefficients {
    /// Cost per reserved CPU core.
    pub per_core_cost: f64,

    /// Cost per bit transmitted over one hop.
    pub per_bit_transit_cost: f64,
}

impl CostCoefficients {
    pub fn new(per_core_cost: f64, per_bit_transit_cost: f64) -> Self {
        Self { per_core_cost, per_bit_transit_cost }
    }

    /// Routing weight of an edge for the cost-aware shortest path tables.
    ///
    /// One hop of transit plus the per-core cost scaled by how occupied the
    /// target node already is. Nodes without cores add no occupancy term.
    pub fn edge_weight(&self, topology: &Topology, edge: &EdgeEndpoint) -> f64 {
        let occupancy = match topology.node(edge.target) {
            Some(node) if node.num_cores > 0 => f64::from(node.used_cores()) / f64::from(node.num_cores),
            _ => 0.0,
        };

        self.per_bit_transit_cost + self.per_core_cost * occupancy
    }

    /// Cost of running one instance of `middlebox`.
    pub fn deployment_cost(&self, middlebox: &Middlebox) -> f64 {
        self.per_core_cost * f64::from(middlebox.cpu_requirement) + middlebox.deployment_cost
    }

    /// Cost of carrying `bandwidth` Kbps over `hops` edges.
    pub fn transit_cost(&self, bandwidth: u64, hops: usize) -> f64 {
        self.per_bit_transit_cost * bandwidth as f64 * BITS_PER_KBPS * hops as f64
    }
}

/// Penalty for exceeding the delay guarantee: `delay_penalty * max(0, actual - max)`.
pub fn delay_penalty(delay_penalty: f64, actual_delay: u64, max_delay: u64) -> f64 {
    delay_penalty * actual_delay.saturating_sub(max_delay) as f64
}

/// Cost of one embedding, split by origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub deployment: f64,
    pub transit: f64,
    pub penalty: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.deployment + self.transit + self.penalty
    }
}
