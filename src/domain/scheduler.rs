pub mod assignment;
pub mod list_scheduler;
pub mod solution;
