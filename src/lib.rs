use crate::domain::simulation::Simulation;
use crate::error::Result;
use crate::loader::parser::parse_scenario_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a scenario file and builds a ready-to-run simulation from it.
pub fn generate_simulation(file_path: &str) -> Result<Simulation> {
    let root_dto = parse_scenario_file(file_path)?;
    log::info!("JSON file parsed successfully.");

    let simulation = Simulation::try_from(root_dto)?;
    log::info!("Internal simulation model constructed successfully.");

    Ok(simulation)
}
