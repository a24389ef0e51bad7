pub mod evaluator;
pub mod experiment;
pub mod optimizer;
pub mod scheduler;
pub mod utils;
pub mod workflow;
