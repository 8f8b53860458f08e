pub mod embedding;
pub mod engine;
