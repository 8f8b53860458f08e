use crate::domain::cost::CostCoefficients;
use crate::domain::topology::graph::{EdgeEndpoint, Topology};
use crate::domain::utils::id::NodeId;

/// Tolerance under which two floating point path costs are considered equal.
const COST_EPSILON: f64 = 1e-9;

/// A weight usable in the all-pairs relaxation.
pub trait PathWeight: Copy + PartialOrd {
    const ZERO: Self;

    /// Sum of two weights, `None` if it cannot be represented.
    fn checked_sum(self, other: Self) -> Option<Self>;

    fn ties(self, other: Self) -> bool;

    fn improves(self, other: Self) -> bool {
        self < other && !self.ties(other)
    }
}

impl PathWeight for u64 {
    const ZERO: Self = 0;

    fn checked_sum(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }

    fn ties(self, other: Self) -> bool {
        self == other
    }
}

impl PathWeight for f64 {
    const ZERO: Self = 0.0;

    fn checked_sum(self, other: Self) -> Option<Self> {
        Some(self + other).filter(|sum| sum.is_finite())
    }

    fn ties(self, other: Self) -> bool {
        (self - other).abs() <= COST_EPSILON
    }
}

/// Dense all-pairs distance table with hop counts and predecessor links.
///
/// `dist[i][j]` is `None` when `j` is unreachable from `i`. `hops[i][j]` is the
/// edge count of the chosen path and `pre[i][j]` the node preceding `j` on it.
#[derive(Debug, Clone)]
pub struct AllPairs<W> {
    dist: Vec<Vec<Option<W>>>,
    hops: Vec<Vec<usize>>,
    pre: Vec<Vec<Option<NodeId>>>,
}

impl<W: PathWeight> AllPairs<W> {
    /// Floyd-Warshall over the edges accepted by `weight`, O(V^3).
    ///
    /// Paths are ordered by (weight, hop count, predecessor index). Every edge
    /// adds one hop, so zero-weight cycles can never close a predecessor loop.
    pub fn compute<F>(topology: &Topology, mut weight: F) -> Self
    where
        F: FnMut(NodeId, &EdgeEndpoint) -> Option<W>,
    {
        let n = topology.num_nodes();
        let mut dist: Vec<Vec<Option<W>>> = vec![vec![None; n]; n];
        let mut hops: Vec<Vec<usize>> = vec![vec![0; n]; n];
        let mut pre: Vec<Vec<Option<NodeId>>> = vec![vec![None; n]; n];

        for i in 0..n {
            dist[i][i] = Some(W::ZERO);
        }

        for (source, edge) in topology.all_edges() {
            let (i, j) = (source.index(), edge.target.index());
            if i == j {
                continue;
            }
            if let Some(w) = weight(source, edge) {
                dist[i][j] = Some(w);
                hops[i][j] = 1;
                pre[i][j] = Some(source);
            }
        }

        for k in 0..n {
            for i in 0..n {
                if i == k {
                    continue;
                }
                let Some(ik) = dist[i][k] else { continue };

                for j in 0..n {
                    if j == i || j == k {
                        continue;
                    }
                    let Some(kj) = dist[k][j] else { continue };
                    let Some(candidate) = ik.checked_sum(kj) else { continue };
                    let candidate_hops = hops[i][k] + hops[k][j];

                    match dist[i][j] {
                        Some(current) if !candidate.improves(current) => {
                            if !candidate.ties(current) {
                                continue;
                            }

                            // Equal weight: keep the stored distance, prefer fewer hops, then the lower predecessor.
                            let shorter = candidate_hops < hops[i][j];
                            let lower = candidate_hops == hops[i][j] && pre[k][j] < pre[i][j];
                            if shorter || lower {
                                hops[i][j] = candidate_hops;
                                pre[i][j] = pre[k][j];
                            }
                        }
                        _ => {
                            dist[i][j] = Some(candidate);
                            hops[i][j] = candidate_hops;
                            pre[i][j] = pre[k][j];
                        }
                    }
                }
            }
        }

        Self { dist, hops, pre }
    }

    pub fn size(&self) -> usize {
        self.dist.len()
    }

    pub fn distance(&self, source: NodeId, destination: NodeId) -> Option<W> {
        *self.dist.get(source.index())?.get(destination.index())?
    }

    /// Edge count of the chosen path, `None` when unreachable.
    pub fn hop_count(&self, source: NodeId, destination: NodeId) -> Option<usize> {
        self.distance(source, destination)?;
        Some(self.hops[source.index()][destination.index()])
    }

    pub fn predecessor(&self, source: NodeId, destination: NodeId) -> Option<NodeId> {
        *self.pre.get(source.index())?.get(destination.index())?
    }

    /// Rebuilds the node sequence `source ..= destination` from the predecessor table.
    pub fn path(&self, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        self.distance(source, destination)?;

        let mut path = vec![destination];
        let mut current = destination;

        while current != source {
            if path.len() > self.size() {
                log::error!("Predecessor table for {} -> {} contains a cycle", source, destination);
                return None;
            }
            current = self.predecessor(source, current)?;
            path.push(current);
        }

        path.reverse();
        Some(path)
    }
}

/// Delay-only shortest paths (`shortest_path`, `sp_pre`).
///
/// The engine keeps one static instance over every edge, computed once per
/// topology, to decide whether a delay SLA can be met at all. A constrained
/// instance only uses edges that can still carry a given bandwidth.
#[derive(Debug, Clone)]
pub struct DelayMatrix {
    table: AllPairs<u64>,
}

impl DelayMatrix {
    pub fn compute(topology: &Topology) -> Self {
        Self { table: AllPairs::compute(topology, |_, edge| Some(edge.delay)) }
    }

    pub fn compute_constrained(topology: &Topology, min_residual: u64) -> Self {
        Self { table: AllPairs::compute(topology, |_, edge| (edge.residual_bandwidth >= min_residual).then_some(edge.delay)) }
    }

    pub fn shortest_delay(&self, source: NodeId, destination: NodeId) -> Option<u64> {
        self.table.distance(source, destination)
    }

    pub fn hop_count(&self, source: NodeId, destination: NodeId) -> Option<usize> {
        self.table.hop_count(source, destination)
    }

    pub fn path(&self, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        self.table.path(source, destination)
    }
}

/// Cost-aware shortest paths (`cost`, `pre`) over the residual graph.
///
/// Only edges whose residual bandwidth reaches `min_residual` take part. The
/// table is recomputed lazily: commits mark it stale and the next `refresh`
/// rebuilds it.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    table: AllPairs<f64>,
    min_residual: u64,
    stale: bool,
}

impl CostMatrix {
    pub fn compute(topology: &Topology, coefficients: &CostCoefficients, min_residual: u64) -> Self {
        let table = AllPairs::compute(topology, |_, edge| {
            (edge.residual_bandwidth >= min_residual && edge.residual_bandwidth > 0).then(|| coefficients.edge_weight(topology, edge))
        });

        Self { table, min_residual, stale: false }
    }

    /// Shared table over every edge with any residual bandwidth left.
    pub fn compute_residual(topology: &Topology, coefficients: &CostCoefficients) -> Self {
        Self::compute(topology, coefficients, 1)
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn refresh(&mut self, topology: &Topology, coefficients: &CostCoefficients) {
        if self.stale {
            log::debug!("Recomputing cost matrix over {} nodes", topology.num_nodes());
            *self = Self::compute(topology, coefficients, self.min_residual);
        }
    }

    pub fn cost(&self, source: NodeId, destination: NodeId) -> Option<f64> {
        self.table.distance(source, destination)
    }

    pub fn hop_count(&self, source: NodeId, destination: NodeId) -> Option<usize> {
        self.table.hop_count(source, destination)
    }

    pub fn path(&self, source: NodeId, destination: NodeId) -> Option<Vec<NodeId>> {
        self.table.path(source, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(i: usize) -> NodeId {
        NodeId::new(i)
    }

    /// 0 -> 1 -> 3 and 0 -> 2 -> 3, both with total delay 4, plus a slow direct edge 0 -> 3.
    fn diamond() -> Topology {
        let mut topology = Topology::new();
        for _ in 0..4 {
            topology.add_node(8);
        }
        topology.add_edge(node(0), node(2), 1000, 2).unwrap();
        topology.add_edge(node(0), node(1), 1000, 2).unwrap();
        topology.add_edge(node(1), node(3), 1000, 2).unwrap();
        topology.add_edge(node(2), node(3), 1000, 2).unwrap();
        topology.add_edge(node(0), node(3), 1000, 9).unwrap();
        topology
    }

    #[test]
    fn test_delay_matrix_prefers_lowest_predecessor_on_ties() {
        let matrix = DelayMatrix::compute(&diamond());

        assert_eq!(matrix.shortest_delay(node(0), node(3)), Some(4));
        assert_eq!(matrix.path(node(0), node(3)), Some(vec![node(0), node(1), node(3)]));
    }

    #[test]
    fn test_unreachable_pairs_have_no_path() {
        let matrix = DelayMatrix::compute(&diamond());

        assert_eq!(matrix.shortest_delay(node(3), node(0)), None);
        assert_eq!(matrix.path(node(3), node(0)), None);
        assert_eq!(matrix.path(node(2), node(2)), Some(vec![node(2)]));
    }

    #[test]
    fn test_cost_matrix_skips_edges_below_threshold() {
        let mut topology = diamond();
        topology.reserve_bandwidth(node(0), node(1), 1000).unwrap();
        topology.reserve_bandwidth(node(2), node(3), 600).unwrap();

        let coefficients = CostCoefficients::new(0.0, 1.0);

        let shared = CostMatrix::compute_residual(&topology, &coefficients);
        assert_eq!(shared.path(node(0), node(3)), Some(vec![node(0), node(3)]));
        assert_eq!(shared.cost(node(0), node(3)), Some(1.0));

        let constrained = CostMatrix::compute(&topology, &coefficients, 500);
        assert_eq!(constrained.path(node(0), node(3)), Some(vec![node(0), node(3)]));

        let only_direct = CostMatrix::compute(&topology, &coefficients, 1001);
        assert_eq!(only_direct.path(node(0), node(3)), None);
    }

    #[test]
    fn test_cost_matrix_refresh_only_when_stale() {
        let mut topology = diamond();
        let coefficients = CostCoefficients::new(0.0, 1.0);
        let mut matrix = CostMatrix::compute_residual(&topology, &coefficients);

        topology.reserve_bandwidth(node(0), node(3), 1000).unwrap();
        matrix.refresh(&topology, &coefficients);
        assert_eq!(matrix.cost(node(0), node(3)), Some(1.0), "fresh table must not be recomputed");

        matrix.mark_stale();
        matrix.refresh(&topology, &coefficients);
        assert!(!matrix.is_stale());
        assert_eq!(matrix.cost(node(0), node(3)), Some(2.0));
        assert_eq!(matrix.path(node(0), node(3)), Some(vec![node(0), node(1), node(3)]));
    }

    /// Bidirectional ring 0 - 1 - 2 - 3 - 0.
    fn ring() -> Topology {
        let mut topology = Topology::new();
        for _ in 0..4 {
            topology.add_node(4);
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            topology.add_edge(node(a), node(b), 1000, 1).unwrap();
            topology.add_edge(node(b), node(a), 1000, 1).unwrap();
        }
        topology
    }

    #[test]
    fn test_zero_weight_cycles_keep_paths_reconstructable() {
        // Idle nodes and no transit cost make every edge weigh nothing.
        let coefficients = CostCoefficients::new(1.0, 0.0);
        let matrix = CostMatrix::compute_residual(&ring(), &coefficients);

        for i in 0..4 {
            for j in 0..4 {
                let path = matrix.path(node(i), node(j)).unwrap_or_else(|| panic!("no path {} -> {}", i, j));
                let hops = matrix.hop_count(node(i), node(j)).unwrap();

                assert_eq!(path.first(), Some(&node(i)));
                assert_eq!(path.last(), Some(&node(j)));
                assert_eq!(path.len(), hops + 1, "path {} -> {} is not the one counted", i, j);
                assert!(hops <= 2, "{} -> {} takes {} hops on a 4-ring", i, j, hops);
                assert_eq!(matrix.cost(node(i), node(j)), Some(0.0));
            }
        }

        assert_eq!(matrix.path(node(0), node(2)), Some(vec![node(0), node(1), node(2)]));
        assert_eq!(matrix.path(node(2), node(0)), Some(vec![node(2), node(1), node(0)]));
    }

    #[test]
    fn test_zero_weight_mesh_prefers_direct_edges() {
        let mut topology = Topology::new();
        for _ in 0..4 {
            topology.add_node(2);
        }
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    topology.add_edge(node(a), node(b), 1000, 1).unwrap();
                }
            }
        }

        let matrix = CostMatrix::compute_residual(&topology, &CostCoefficients::new(0.0, 0.0));

        for a in 0..4 {
            for b in (0..4).filter(|&b| b != a) {
                assert_eq!(matrix.path(node(a), node(b)), Some(vec![node(a), node(b)]));
            }
        }
    }

    #[test]
    fn test_overflowing_delays_are_skipped() {
        let mut topology = Topology::new();
        for _ in 0..3 {
            topology.add_node(0);
        }
        topology.add_edge(node(0), node(1), 10, u64::MAX).unwrap();
        topology.add_edge(node(1), node(2), 10, 1).unwrap();

        let matrix = DelayMatrix::compute(&topology);

        assert_eq!(matrix.shortest_delay(node(0), node(1)), Some(u64::MAX));
        assert_eq!(matrix.shortest_delay(node(0), node(2)), None);
    }

    #[test]
    fn test_equal_cost_tie_keeps_stored_distance() {
        // Two three-hop routes to 6: 0 -> 1 -> 3 -> 6 is found first, 0 -> 4 -> 2 -> 6 ends on a lower predecessor.
        let mut topology = Topology::new();
        for _ in 0..7 {
            topology.add_node(0);
        }
        for (a, b) in [(0, 1), (1, 3), (3, 6), (0, 4), (4, 2), (2, 6)] {
            topology.add_edge(node(a), node(b), 10, 1).unwrap();
        }

        let table = AllPairs::compute(&topology, |source, edge| {
            Some(if (source.index(), edge.target.index()) == (2, 6) { 1.0 + 5e-10 } else { 1.0 })
        });

        assert_eq!(table.path(node(0), node(6)), Some(vec![node(0), node(4), node(2), node(6)]));
        assert_eq!(table.distance(node(0), node(6)), Some(3.0));
        assert_eq!(table.hop_count(node(0), node(6)), Some(3));
    }

    #[test]
    fn test_constrained_delay_matrix_skips_thin_edges() {
        let mut topology = diamond();
        topology.reserve_bandwidth(node(1), node(3), 900).unwrap();

        let matrix = DelayMatrix::compute_constrained(&topology, 200);

        assert_eq!(matrix.path(node(0), node(3)), Some(vec![node(0), node(2), node(3)]));
        assert_eq!(matrix.hop_count(node(0), node(3)), Some(2));
    }
}
