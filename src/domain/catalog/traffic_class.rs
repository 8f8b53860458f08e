use std::fmt;

use crate::api::scenario_dto::TrafficClassDto;

/// Kbps per Mbps. Classes are declared in Mbps, requests and links carry Kbps.
pub const KBPS_PER_MBPS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficClass {
    pub name: String,

    /// Minimum bandwidth in Mbps.
    pub min_bandwidth: u64,

    /// Maximum end-to-end delay in milliseconds.
    pub max_delay: u64,

    /// Penalty per millisecond of delay guarantee violation.
    pub delay_penalty: f64,
}

impl TrafficClass {
    pub fn new(name: impl Into<String>, min_bandwidth: u64, max_delay: u64, delay_penalty: f64) -> Self {
        Self { name: name.into(), min_bandwidth, max_delay, delay_penalty }
    }

    pub fn min_bandwidth_kbps(&self) -> u64 {
        self.min_bandwidth.saturating_mul(KBPS_PER_MBPS)
    }
}

impl From<TrafficClassDto> for TrafficClass {
    fn from(dto: TrafficClassDto) -> Self {
        TrafficClass::new(dto.name, dto.min_bandwidth, dto.max_delay, dto.delay_penalty)
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class_name: {}, min_bandwidth: {}, max_delay: {}, delay_penalty: {}",
            self.name, self.min_bandwidth, self.max_delay, self.delay_penalty
        )
    }
}
