use std::collections::HashMap;

use crate::domain::catalog::Catalog;
use crate::domain::catalog::traffic_request::TrafficRequest;
use crate::domain::cost::{CostBreakdown, CostCoefficients, delay_penalty};
use crate::domain::engine::embedding::{Embedding, Outcome, PathSource, Placement, Rejection};
use crate::domain::statistics::statistics::{SolutionStatistics, StatisticsTracker};
use crate::domain::topology::graph::Topology;
use crate::domain::topology::matrix::{CostMatrix, DelayMatrix};
use crate::domain::topology::path_cache::PathCache;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result, TopologyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Try the last successfully used path of a (source, destination) pair first.
    pub use_path_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { use_path_cache: true }
    }
}

/// Admission control and placement for traffic requests.
///
/// The engine is the single owner and writer of the simulation state:
/// * **Topology**: residual bandwidth per edge and residual cores per node.
/// * **Matrices**: static delay-only shortest paths and the lazily refreshed cost table.
/// * **Path cache**: last used path per (source, destination) pair.
/// * **Statistics**: one record per processed request.
///
/// Each call to [`EmbeddingEngine::embed`] resolves one request completely. Capacity
/// is only reserved once path and placement are known to be feasible, so a
/// rejection never changes residual state.
#[derive(Debug)]
pub struct EmbeddingEngine {
    topology: Topology,
    catalog: Catalog,
    coefficients: CostCoefficients,
    config: EngineConfig,
    delays: DelayMatrix,
    costs: CostMatrix,
    path_cache: PathCache,
    statistics: StatisticsTracker,
}

impl EmbeddingEngine {
    pub fn new(topology: Topology, catalog: Catalog, coefficients: CostCoefficients, config: EngineConfig) -> Self {
        let delays = DelayMatrix::compute(&topology);
        let costs = CostMatrix::compute_residual(&topology, &coefficients);

        log::debug!(
            "EmbeddingEngine: {} nodes, {} edges, {} middlebox types, path cache {}",
            topology.num_nodes(),
            topology.num_edges(),
            catalog.middleboxes().len(),
            if config.use_path_cache { "enabled" } else { "disabled" }
        );

        Self { topology, catalog, coefficients, config, delays, costs, path_cache: PathCache::new(), statistics: StatisticsTracker::new() }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn delay_matrix(&self) -> &DelayMatrix {
        &self.delays
    }

    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.costs
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn statistics(&self) -> &SolutionStatistics {
        self.statistics.statistics()
    }

    pub fn statistics_tracker(&self) -> &StatisticsTracker {
        &self.statistics
    }

    pub fn start_run(&mut self) {
        self.statistics.start_run();
    }

    pub fn finish_run(&mut self) {
        self.statistics.finish_run();
    }

    /// Checks the delay SLA against the static delay-only shortest path.
    ///
    /// Returns the shortest achievable delay. Never touches residual state.
    pub fn check_delay_feasibility(&self, request: &TrafficRequest) -> std::result::Result<u64, Rejection> {
        match self.delays.shortest_delay(request.source, request.destination) {
            None => Err(Rejection::NoPath { from: request.source, to: request.destination }),
            Some(shortest) if shortest > request.max_delay => Err(Rejection::DelayInfeasible { shortest, max_delay: request.max_delay }),
            Some(shortest) => Ok(shortest),
        }
    }

    /// Decides one request and, on acceptance, reserves its resources.
    ///
    /// Rejections are returned as `Ok(Outcome::Rejected(..))`. An `Err` means the
    /// commit step found less capacity than the feasibility check promised, which
    /// leaves the engine's bookkeeping untrustworthy.
    pub fn embed(&mut self, request: &TrafficRequest) -> Result<Outcome> {
        log::debug!("Processing request at {}: {}", request.arrival_time, request);

        match self.plan(request) {
            Ok(embedding) => {
                self.commit(&embedding)?;
                self.statistics.record_accepted(embedding.arrival_time, embedding.cost.total());

                log::info!(
                    "Accepted request at {}: path {:?}, {} middleboxes, delay {} ms, cost {:.4}",
                    request.arrival_time,
                    embedding.path.iter().map(NodeId::index).collect::<Vec<_>>(),
                    embedding.placements.len(),
                    embedding.delay,
                    embedding.cost.total()
                );

                Ok(Outcome::Accepted(embedding))
            }
            Err(rejection) => {
                log::info!("Rejected request at {}: {}", request.arrival_time, rejection);
                self.statistics.record_rejected(rejection.kind());

                Ok(Outcome::Rejected(rejection))
            }
        }
    }

    /// Returns the bandwidth and cores of a previously committed embedding.
    pub fn release(&mut self, embedding: &Embedding) -> Result<()> {
        for hop in embedding.path.windows(2) {
            self.topology.release_bandwidth(hop[0], hop[1], embedding.bandwidth)?;
        }

        for placement in &embedding.placements {
            self.topology.release_cores(placement.node, placement.cores)?;
        }

        self.costs.mark_stale();
        log::debug!("Released embedding of request at {}", embedding.arrival_time);
        Ok(())
    }

    /// Feasibility and cost of `request` against the current residual state.
    fn plan(&mut self, request: &TrafficRequest) -> std::result::Result<Embedding, Rejection> {
        self.validate_request(request)?;

        let shortest = self.check_delay_feasibility(request)?;
        log::debug!("Delay pre-check passed: {} ms <= {} ms", shortest, request.max_delay);

        let (path, path_source) = self.find_path(request)?;
        let placements = self.place_middleboxes(request, &path)?;

        Ok(self.build_embedding(request, path, placements, path_source))
    }

    fn validate_request(&self, request: &TrafficRequest) -> std::result::Result<(), Rejection> {
        for node in [request.source, request.destination] {
            if !self.topology.contains(node) {
                return Err(Rejection::UnknownNode(node));
            }
        }

        if let Some(&unknown) = request.middlebox_sequence.iter().find(|id| self.catalog.middlebox(**id).is_none()) {
            return Err(Rejection::UnknownMiddlebox(unknown));
        }

        Ok(())
    }

    /// Cached path first, then the shared cost table, then searches restricted to
    /// edges that can carry the request. A candidate must carry the bandwidth and
    /// meet the delay SLA on its edges. Only when no path can do both is the
    /// fastest path that still carries the bandwidth taken as a penalized detour.
    fn find_path(&mut self, request: &TrafficRequest) -> std::result::Result<(Vec<NodeId>, PathSource), Rejection> {
        let (source, destination) = (request.source, request.destination);

        if self.config.use_path_cache {
            if let Some(cached) = self.path_cache.lookup(source, destination).map(<[NodeId]>::to_vec) {
                if self.is_path_valid(&cached, request) {
                    log::debug!("PathCache hit {} -> {}", source, destination);
                    return Ok((cached, PathSource::Cache));
                }

                log::warn!("PathCache entry {} -> {} can no longer carry the request at {}, searching again", source, destination, request.arrival_time);
                self.path_cache.invalidate(source, destination);
            }
        }

        self.costs.refresh(&self.topology, &self.coefficients);

        if let Some(path) = self.costs.path(source, destination) {
            if self.is_path_valid(&path, request) {
                return Ok((path, PathSource::CostTable));
            }
        }

        log::debug!(
            "Shared cost table path {} -> {} cannot carry {} Kbps within {} ms, running constrained search",
            source,
            destination,
            request.min_bandwidth,
            request.max_delay
        );

        let cheapest = CostMatrix::compute(&self.topology, &self.coefficients, request.min_bandwidth)
            .path(source, destination)
            .ok_or(Rejection::InsufficientBandwidth { requested: request.min_bandwidth })?;

        if self.meets_delay(&cheapest, request.max_delay) {
            return Ok((cheapest, PathSource::ConstrainedSearch));
        }

        let fastest = DelayMatrix::compute_constrained(&self.topology, request.min_bandwidth).path(source, destination).unwrap_or(cheapest);

        if !self.meets_delay(&fastest, request.max_delay) {
            log::debug!("No path {} -> {} carries {} Kbps within {} ms, taking the fastest detour", source, destination, request.min_bandwidth, request.max_delay);
        }

        Ok((fastest, PathSource::DelaySearch))
    }

    fn is_path_valid(&self, path: &[NodeId], request: &TrafficRequest) -> bool {
        if path.first() != Some(&request.source) || path.last() != Some(&request.destination) {
            return false;
        }

        self.meets_delay(path, request.max_delay) && self.has_bandwidth(path, request.min_bandwidth)
    }

    fn meets_delay(&self, path: &[NodeId], max_delay: u64) -> bool {
        self.topology.path_delay(path).is_some_and(|delay| delay <= max_delay)
    }

    fn has_bandwidth(&self, path: &[NodeId], bandwidth: u64) -> bool {
        self.topology.path_bottleneck(path).is_some_and(|bottleneck| bottleneck >= bandwidth)
    }

    /// First-feasible placement: each middlebox goes on the first node, at or after
    /// the previous middlebox's position on the path, with enough residual cores.
    fn place_middleboxes(&self, request: &TrafficRequest, path: &[NodeId]) -> std::result::Result<Vec<Placement>, Rejection> {
        let mut pending: HashMap<NodeId, u32> = HashMap::new();
        let mut placements = Vec::with_capacity(request.middlebox_sequence.len());
        let mut position = 0;

        for &middlebox_id in &request.middlebox_sequence {
            let middlebox = self.catalog.middlebox(middlebox_id).ok_or(Rejection::UnknownMiddlebox(middlebox_id))?;
            let cores = middlebox.cpu_requirement;

            let host = path.iter().enumerate().skip(position).find(|(_, node_id)| {
                let residual = self.topology.node(**node_id).map_or(0, |node| node.residual_cores);
                let reserved = pending.get(*node_id).copied().unwrap_or(0);
                residual.saturating_sub(reserved) >= cores
            });

            let Some((index, &node)) = host else {
                return Err(Rejection::InsufficientCpu { middlebox: middlebox_id, cores });
            };

            log::debug!("Placing middlebox '{}' on node {} (path position {})", middlebox.name, node, index);

            *pending.entry(node).or_insert(0) += cores;
            position = index;
            placements.push(Placement { middlebox: middlebox_id, node, cores });
        }

        Ok(placements)
    }

    fn build_embedding(&self, request: &TrafficRequest, path: Vec<NodeId>, placements: Vec<Placement>, path_source: PathSource) -> Embedding {
        let mut cost = CostBreakdown::default();
        let mut processing_delay = 0;

        for placement in &placements {
            if let Some(middlebox) = self.catalog.middlebox(placement.middlebox) {
                cost.deployment += self.coefficients.deployment_cost(middlebox);
                processing_delay += middlebox.processing_delay;
            }
        }

        let hops = path.len().saturating_sub(1);
        let delay = self.topology.path_delay(&path).unwrap_or(0) + processing_delay;

        cost.transit = self.coefficients.transit_cost(request.min_bandwidth, hops);
        cost.penalty = delay_penalty(request.delay_penalty, delay, request.max_delay);

        if cost.penalty > 0.0 {
            log::debug!("Request at {} exceeds its delay SLA: {} ms > {} ms", request.arrival_time, delay, request.max_delay);
        }

        Embedding { arrival_time: request.arrival_time, path, placements, bandwidth: request.min_bandwidth, delay, cost, path_source }
    }

    /// Reserves everything `embedding` needs. Any shortfall here is an invariant
    /// violation; partial reservations are rolled back before reporting it.
    fn commit(&mut self, embedding: &Embedding) -> Result<()> {
        let mut reserved_hops: Vec<(NodeId, NodeId)> = Vec::with_capacity(embedding.hops());

        for hop in embedding.path.windows(2) {
            if let Err(e) = self.topology.reserve_bandwidth(hop[0], hop[1], embedding.bandwidth) {
                self.rollback(&reserved_hops, &[], embedding.bandwidth);
                return Err(invariant_violation(embedding, e));
            }
            reserved_hops.push((hop[0], hop[1]));
        }

        for (index, placement) in embedding.placements.iter().enumerate() {
            if let Err(e) = self.topology.reserve_cores(placement.node, placement.cores) {
                self.rollback(&reserved_hops, &embedding.placements[..index], embedding.bandwidth);
                return Err(invariant_violation(embedding, e));
            }
        }

        self.costs.mark_stale();

        if let (true, Some(&source), Some(&destination)) = (self.config.use_path_cache, embedding.path.first(), embedding.path.last()) {
            self.path_cache.store(source, destination, embedding.path.clone());
        }

        Ok(())
    }

    fn rollback(&mut self, hops: &[(NodeId, NodeId)], placements: &[Placement], bandwidth: u64) {
        for &(from, to) in hops {
            if let Err(e) = self.topology.release_bandwidth(from, to, bandwidth) {
                log::error!("Rollback failed: {}", e);
            }
        }

        for placement in placements {
            if let Err(e) = self.topology.release_cores(placement.node, placement.cores) {
                log::error!("Rollback failed: {}", e);
            }
        }
    }
}

fn invariant_violation(embedding: &Embedding, cause: TopologyError) -> Error {
    log::error!("Commit of request at {} disagrees with its feasibility check: {}", embedding.arrival_time, cause);
    Error::InvariantViolation(format!("request at {}: {}", embedding.arrival_time, cause))
}
