use std::fmt;

use crate::api::scenario_dto::TrafficRequestDto;
use crate::domain::catalog::Catalog;
use crate::domain::catalog::traffic_class::TrafficClass;
use crate::domain::utils::id::{MiddleboxId, NodeId};
use crate::error::{Error, Result};

/// One flow that must be routed from `source` to `destination` through
/// `middlebox_sequence`, in that exact order, under a bandwidth and delay SLA.
///
/// A request is created once per arrival event and consumed exactly once by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficRequest {
    pub arrival_time: u64,
    pub source: NodeId,
    pub destination: NodeId,

    /// Minimum bandwidth demand in Kbps.
    pub min_bandwidth: u64,

    /// Maximum delay in milliseconds according to the SLA.
    pub max_delay: u64,

    /// Penalty per millisecond of guarantee violation.
    pub delay_penalty: f64,

    pub middlebox_sequence: Vec<MiddleboxId>,
}

impl TrafficRequest {
    pub fn new(
        arrival_time: u64,
        source: NodeId,
        destination: NodeId,
        min_bandwidth: u64,
        max_delay: u64,
        delay_penalty: f64,
        middlebox_sequence: Vec<MiddleboxId>,
    ) -> Self {
        Self { arrival_time, source, destination, min_bandwidth, max_delay, delay_penalty, middlebox_sequence }
    }

    /// Builds a request inheriting its SLA from a traffic class.
    pub fn from_class(arrival_time: u64, source: NodeId, destination: NodeId, class: &TrafficClass, middlebox_sequence: Vec<MiddleboxId>) -> Self {
        Self::new(arrival_time, source, destination, class.min_bandwidth_kbps(), class.max_delay, class.delay_penalty, middlebox_sequence)
    }

    /// Converts a DTO, resolving the optional traffic class reference.
    ///
    /// Explicit SLA fields on the DTO override the ones of the referenced class.
    /// Node and middlebox ids are not validated here; the engine rejects unknown ids.
    pub fn from_dto(dto: TrafficRequestDto, catalog: &Catalog) -> Result<Self> {
        let class = match &dto.traffic_class {
            Some(name) => Some(catalog.traffic_class_by_name(name).ok_or_else(|| {
                Error::ModelConstructionError(format!("Traffic request at {} references unknown traffic class '{}'", dto.arrival_time, name))
            })?),
            None => None,
        };

        let missing = |field: &str| {
            Error::ModelConstructionError(format!("Traffic request at {} has no {} and no traffic class to inherit it from", dto.arrival_time, field))
        };

        let min_bandwidth = dto.min_bandwidth.or(class.map(TrafficClass::min_bandwidth_kbps)).ok_or_else(|| missing("minBandwidth"))?;
        let max_delay = dto.max_delay.or(class.map(|c| c.max_delay)).ok_or_else(|| missing("maxDelay"))?;
        let delay_penalty = dto.delay_penalty.or(class.map(|c| c.delay_penalty)).unwrap_or(0.0);

        Ok(TrafficRequest::new(
            dto.arrival_time,
            NodeId::new(dto.source),
            NodeId::new(dto.destination),
            min_bandwidth,
            max_delay,
            delay_penalty,
            dto.middlebox_sequence.into_iter().map(MiddleboxId::new).collect(),
        ))
    }
}

impl fmt::Display for TrafficRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sequence: Vec<String> = self.middlebox_sequence.iter().map(|id| id.to_string()).collect();

        write!(
            f,
            "source: {}, destination: {}, min_bandwidth: {}, max_delay: {}, delay_penalty: {}, middlebox_sequence_length: {}, middlebox_sequence: [{}]",
            self.source,
            self.destination,
            self.min_bandwidth,
            self.max_delay,
            self.delay_penalty,
            self.middlebox_sequence.len(),
            sequence.join(" ")
        )
    }
}
