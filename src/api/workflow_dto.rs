use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDto {
    pub tasks: Vec<TaskDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: usize,

    /// Execution length in million instructions.
    pub length: f64,
    pub deadline: f64,

    #[serde(default)]
    pub parents: Vec<usize>,
}
