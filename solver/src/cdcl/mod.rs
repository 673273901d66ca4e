mod analysis;
mod engine;
mod graph;

pub use engine::CdclSolver;
pub use graph::{GraphNode, ImplicationGraph};
