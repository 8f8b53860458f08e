use std::fmt;

use crate::api::scenario_dto::MiddleboxDto;

/// A middlebox type (firewall, cache, proxy, ...) as listed in the catalog.
///
/// Instances of a type are deployed on topology nodes; every instance reserves
/// `cpu_requirement` cores on its host.
#[derive(Debug, Clone, PartialEq)]
pub struct Middlebox {
    pub name: String,

    /// CPU cores reserved per deployed instance.
    pub cpu_requirement: u32,

    /// Processing delay in milliseconds added to every flow passing the instance.
    pub processing_delay: u64,

    /// Maximum throughput of one instance.
    pub processing_capacity: u64,

    /// Hourly cost of running one instance.
    pub deployment_cost: f64,
}

impl Middlebox {
    pub fn new(name: impl Into<String>, cpu_requirement: u32, processing_delay: u64, processing_capacity: u64, deployment_cost: f64) -> Self {
        Self { name: name.into(), cpu_requirement, processing_delay, processing_capacity, deployment_cost }
    }
}

impl From<MiddleboxDto> for Middlebox {
    fn from(dto: MiddleboxDto) -> Self {
        Middlebox::new(dto.name, dto.cpu_requirement, dto.processing_delay, dto.processing_capacity, dto.deployment_cost)
    }
}

impl fmt::Display for Middlebox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "middlebox_name: {}, cpu_requirement: {}, processing_delay: {}, processing_capacity: {}, deployment_cost: {}",
            self.name, self.cpu_requirement, self.processing_delay, self.processing_capacity, self.deployment_cost
        )
    }
}
