use anyhow::Context;
use clap::Parser;

use middlebox_placement::domain::simulation::Simulation;
use middlebox_placement::loader::parser::parse_scenario_file;
use middlebox_placement::logger;

/// Admission control and placement of middlebox-chained traffic flows.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Scenario JSON file with catalogs, topology and traffic requests.
    #[arg(short, long)]
    scenario: String,

    /// Write per-request statistics as CSV to this file.
    #[arg(long)]
    stats_csv: Option<String>,

    /// Ignore the path cache and search every request from scratch.
    #[arg(long)]
    no_path_cache: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init();
    log::info!("Logger initialized. Starting simulation.");

    let mut dto = parse_scenario_file(&args.scenario)
        .with_context(|| format!("loading scenario '{}'", args.scenario))?;

    if args.no_path_cache {
        dto.engine.use_path_cache = false;
    }

    let mut simulation = Simulation::try_from(dto).context("building simulation")?;
    simulation.run().context("running simulation")?;

    if let Some(path) = &args.stats_csv {
        simulation.engine().statistics_tracker().write_csv(Some(path)).with_context(|| format!("writing statistics to '{}'", path))?;
        log::info!("Statistics written to '{}'", path);
    }

    Ok(())
}
