use thiserror::Error;

use crate::domain::utils::id::{TaskId, VmId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write CSV output: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Dependency {parent} -> {child} would create a cycle")]
    CycleError { parent: TaskId, child: TaskId },

    #[error("Task {0} is not part of the workflow")]
    UnknownTask(TaskId),

    #[error("Task {0} is already part of the workflow")]
    DuplicateTask(TaskId),

    #[error("Resource index {vm} is out of range for a pool of {vm_count} VMs")]
    InvalidResourceIndex { vm: VmId, vm_count: usize },

    #[error("The resource pool is empty, scheduling is undefined")]
    EmptyResourcePool,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to build internal domain model: {0}")]
    ModelConstructionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
