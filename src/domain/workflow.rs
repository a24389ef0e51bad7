pub mod generator;
pub mod rank;
pub mod task;
#[allow(clippy::module_inception)]
pub mod workflow;
