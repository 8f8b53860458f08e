use serde::Deserialize;

/// Root of a scenario file: catalogs, topology, request stream and cost coefficients.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub per_core_cost: f64,
    pub per_bit_transit_cost: f64,
    #[serde(default)]
    pub engine: EngineDto,
    pub middleboxes: Vec<MiddleboxDto>,
    #[serde(default)]
    pub traffic_classes: Vec<TrafficClassDto>,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
    #[serde(default)]
    pub traffic_requests: Vec<TrafficRequestDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDto {
    #[serde(default = "default_use_path_cache")]
    pub use_path_cache: bool,
}

impl Default for EngineDto {
    fn default() -> Self {
        Self { use_path_cache: default_use_path_cache() }
    }
}

fn default_use_path_cache() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddleboxDto {
    pub name: String,
    pub cpu_requirement: u32,
    pub processing_delay: u64,
    pub processing_capacity: u64,
    pub deployment_cost: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficClassDto {
    pub name: String,
    /// In Mbps.
    pub min_bandwidth: u64,
    pub max_delay: u64,
    pub delay_penalty: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: usize,
    pub num_cores: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub source: usize,
    pub target: usize,
    /// In Kbps.
    pub bandwidth: u64,
    pub delay: u64,
    /// Also create the reverse edge with the same bandwidth and delay.
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRequestDto {
    pub arrival_time: u64,
    pub source: usize,
    pub destination: usize,
    #[serde(default)]
    pub traffic_class: Option<String>,
    /// In Kbps.
    #[serde(default)]
    pub min_bandwidth: Option<u64>,
    #[serde(default)]
    pub max_delay: Option<u64>,
    #[serde(default)]
    pub delay_penalty: Option<f64>,
    #[serde(default)]
    pub middlebox_sequence: Vec<usize>,
}
