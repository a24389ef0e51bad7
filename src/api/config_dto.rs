use serde::{Deserialize, Serialize};

/// Root of the experiment configuration file. Every section and field is
/// optional and falls back to the design values of the experiment.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentConfigDto {
    pub pso: PsoConfigDto,
    pub fitness: FitnessWeightsDto,
    pub simulation: SimulationConfigDto,
    pub generator: GeneratorConfigDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PsoConfigDto {
    pub swarm_size: usize,
    pub max_iterations: usize,
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,

    /// Every n-th iteration the global best is handed to the simulator. 0 disables it.
    pub report_interval: usize,
    pub seed: Option<u64>,
}

impl Default for PsoConfigDto {
    fn default() -> Self {
        PsoConfigDto { swarm_size: 200, max_iterations: 100, inertia: 0.9, cognitive: 1.4, social: 1.1, report_interval: 20, seed: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FitnessWeightsDto {
    pub makespan_weight: f64,
    pub qos_weight: f64,
    pub makespan_scale: f64,
}

impl Default for FitnessWeightsDto {
    fn default() -> Self {
        FitnessWeightsDto { makespan_weight: 0.5, qos_weight: 0.3, makespan_scale: 10.0 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfigDto {
    /// Throughput of a single VM in million instructions per time unit.
    pub vm_mips: f64,
    pub static_power: f64,
    pub max_power: f64,

    /// Seed for the random VM choice of tasks without a preferred VM.
    pub seed: u64,
}

impl Default for SimulationConfigDto {
    fn default() -> Self {
        SimulationConfigDto { vm_mips: 2000.0, static_power: 100.0, max_power: 250.0, seed: 0 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfigDto {
    pub base_length: f64,
    pub length_step: f64,
    pub deadline_vm_count: usize,
    pub deadline_jitter: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfigDto {
    fn default() -> Self {
        GeneratorConfigDto { base_length: 8000.0, length_step: 10.0, deadline_vm_count: 20, deadline_jitter: 10.0, seed: None }
    }
}
