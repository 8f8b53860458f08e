use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::time::Instant;

use chrono::{DateTime, Local, TimeDelta};

use crate::domain::engine::embedding::RejectionKind;
use crate::error::Result;

/// Statistics of one accepted embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficStatistics {
    /// Arrival time of the traffic request.
    pub arrival_time: u64,

    /// Cost of embedding the traffic request.
    pub cost: f64,
}

impl TrafficStatistics {
    pub fn new(arrival_time: u64, cost: f64) -> Self {
        Self { arrival_time, cost }
    }
}

/// Statistics for a whole run.
#[derive(Debug, Clone, Default)]
pub struct SolutionStatistics {
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    pub num_accepted: usize,
    pub num_rejected: usize,

    /// One entry per accepted request, in processing order.
    pub traffic_stats: Vec<TrafficStatistics>,

    /// Rejected requests per reason.
    pub rejections: BTreeMap<RejectionKind, usize>,
}

impl SolutionStatistics {
    pub fn processed(&self) -> usize {
        self.num_accepted + self.num_rejected
    }

    pub fn total_cost(&self) -> f64 {
        self.traffic_stats.iter().map(|stat| stat.cost).sum()
    }

    pub fn acceptance_ratio(&self) -> f64 {
        match self.processed() {
            0 => 0.0,
            processed => self.num_accepted as f64 / processed as f64,
        }
    }

    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.end_time? - self.start_time?)
    }
}

/// Append-only recorder fed by the embedding engine.
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    stats: SolutionStatistics,
    run_started: Option<Instant>,
}

impl StatisticsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_run(&mut self) {
        self.stats.start_time = Some(Local::now());
        self.stats.end_time = None;
        self.run_started = Some(Instant::now());
    }

    pub fn finish_run(&mut self) {
        self.stats.end_time = Some(Local::now());

        if let Some(started) = self.run_started.take() {
            log::info!(
                "Run finished in {:?}: {} accepted, {} rejected, total cost {:.4}",
                started.elapsed(),
                self.stats.num_accepted,
                self.stats.num_rejected,
                self.stats.total_cost()
            );
        }
    }

    pub fn record_accepted(&mut self, arrival_time: u64, cost: f64) {
        self.stats.num_accepted += 1;
        self.stats.traffic_stats.push(TrafficStatistics::new(arrival_time, cost));
    }

    pub fn record_rejected(&mut self, kind: RejectionKind) {
        self.stats.num_rejected += 1;
        *self.stats.rejections.entry(kind).or_insert(0) += 1;
    }

    pub fn statistics(&self) -> &SolutionStatistics {
        &self.stats
    }

    /// Writes the per-request statistics as `;`-separated CSV to `filename`, or stdout.
    pub fn write_csv(&self, filename: Option<&str>) -> Result<()> {
        let writer: Box<dyn Write> = match filename {
            Some(f) => Box::new(File::create(f)?),
            None => Box::new(io::stdout()),
        };

        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        csv_wtr.write_record(["ArrivalTime", "Cost"])?;
        for stat in &self.stats.traffic_stats {
            csv_wtr.write_record([stat.arrival_time.to_string(), stat.cost.to_string()])?;
        }

        csv_wtr.flush()?;
        Ok(())
    }
}
