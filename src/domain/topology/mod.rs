pub mod graph;
pub mod matrix;
pub mod path_cache;
