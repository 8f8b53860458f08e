pub mod catalog;
pub mod cost;
pub mod engine;
pub mod simulation;
pub mod statistics;
pub mod topology;
pub mod utils;
