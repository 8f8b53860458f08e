use crate::api::scenario_dto::ScenarioDto;
use crate::domain::catalog::Catalog;
use crate::domain::catalog::middlebox::Middlebox;
use crate::domain::catalog::traffic_class::TrafficClass;
use crate::domain::catalog::traffic_request::TrafficRequest;
use crate::domain::cost::CostCoefficients;
use crate::domain::engine::embedding::{Embedding, Outcome};
use crate::domain::engine::engine::{EmbeddingEngine, EngineConfig};
use crate::domain::statistics::statistics::SolutionStatistics;
use crate::domain::topology::graph::Topology;
use crate::error::{Error, Result};

/// Feeds a stream of traffic requests through an [`EmbeddingEngine`].
///
/// Requests are processed in nondecreasing arrival time; requests with equal
/// arrival time keep their input order.
#[derive(Debug)]
pub struct Simulation {
    engine: EmbeddingEngine,
    requests: Vec<TrafficRequest>,
    embeddings: Vec<Embedding>,
}

impl Simulation {
    pub fn new(engine: EmbeddingEngine, mut requests: Vec<TrafficRequest>) -> Self {
        requests.sort_by_key(|request| request.arrival_time);
        Self { engine, requests, embeddings: Vec::new() }
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.engine
    }

    pub fn pending_requests(&self) -> &[TrafficRequest] {
        &self.requests
    }

    /// Accepted embeddings, in processing order.
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Processes every pending request and returns the run statistics.
    pub fn run(&mut self) -> Result<&SolutionStatistics> {
        let requests = std::mem::take(&mut self.requests);
        log::info!("Starting run with {} traffic requests", requests.len());

        self.engine.start_run();

        for request in &requests {
            if let Outcome::Accepted(embedding) = self.engine.embed(request)? {
                self.embeddings.push(embedding);
            }
        }

        self.engine.finish_run();
        self.log_summary();

        Ok(self.engine.statistics())
    }

    pub fn log_summary(&self) {
        let stats = self.engine.statistics();
        let topology = self.engine.topology();

        log::info!(
            "Summary: processed {}, accepted {}, rejected {} (acceptance {:.2}%), total cost {:.4}",
            stats.processed(),
            stats.num_accepted,
            stats.num_rejected,
            stats.acceptance_ratio() * 100.0,
            stats.total_cost()
        );

        for (kind, count) in &stats.rejections {
            log::info!("  rejected as {}: {}", kind, count);
        }

        log::info!(
            "Utilization: bandwidth {:.2}%, cores {:.2}%",
            topology.bandwidth_utilization() * 100.0,
            topology.core_utilization() * 100.0
        );
    }
}

impl TryFrom<ScenarioDto> for Simulation {
    type Error = Error;

    fn try_from(dto: ScenarioDto) -> std::result::Result<Self, Self::Error> {
        let topology = Topology::try_from(&dto)?;

        let ScenarioDto { per_core_cost, per_bit_transit_cost, engine, middleboxes, traffic_classes, traffic_requests, .. } = dto;

        let catalog = Catalog::new(
            middleboxes.into_iter().map(Middlebox::from).collect(),
            traffic_classes.into_iter().map(TrafficClass::from).collect(),
        );

        let requests =
            traffic_requests.into_iter().map(|request| TrafficRequest::from_dto(request, &catalog)).collect::<Result<Vec<TrafficRequest>>>()?;

        let coefficients = CostCoefficients::new(per_core_cost, per_bit_transit_cost);
        let config = EngineConfig { use_path_cache: engine.use_path_cache };

        Ok(Simulation::new(EmbeddingEngine::new(topology, catalog, coefficients, config), requests))
    }
}
