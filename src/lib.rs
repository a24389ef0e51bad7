use crate::api::config_dto::ExperimentConfigDto;
use crate::api::workflow_dto::WorkflowDto;
use crate::domain::experiment::ExperimentConfig;
use crate::domain::workflow::workflow::Workflow;
use crate::error::Result;
use crate::loader::parser::{parse_json_file, write_json_file};

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads and validates the experiment configuration. Without a path the
/// design defaults are used.
pub fn load_experiment_config(file_path: Option<&str>) -> Result<ExperimentConfig> {
    let dto = match file_path {
        Some(path) => {
            let dto = parse_json_file::<ExperimentConfigDto>(path)?;
            log::info!("Experiment configuration loaded from '{}'.", path);
            dto
        }
        None => ExperimentConfigDto::default(),
    };
    ExperimentConfig::try_from(dto)
}

pub fn load_workflow(file_path: &str) -> Result<Workflow> {
    let dto = parse_json_file::<WorkflowDto>(file_path)?;
    let workflow = Workflow::try_from(dto)?;
    log::info!("Workflow with {} tasks loaded from '{}'.", workflow.len(), file_path);
    Ok(workflow)
}

pub fn save_workflow(file_path: &str, workflow: &Workflow) -> Result<()> {
    write_json_file(file_path, &WorkflowDto::from(workflow))?;
    log::info!("Workflow with {} tasks written to '{}'.", workflow.len(), file_path);
    Ok(())
}
