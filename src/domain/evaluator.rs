pub mod simulator;
pub mod surrogate;

use serde::Serialize;

use crate::api::config_dto::{FitnessWeightsDto, SimulationConfigDto};
use crate::domain::scheduler::solution::Solution;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// Anything that can score a `Solution` for a `Workflow`.
///
/// The optimizer only talks to this trait. The cheap `SurrogateEvaluator`
/// drives the search, the expensive `DagSimulator` is only wired to progress
/// reporting and final evaluation.
pub trait ScheduleEvaluator: std::fmt::Debug + Send + Sync {
    fn evaluate(&self, workflow: &Workflow, solution: &Solution) -> Result<EvaluationReport>;

    fn name(&self) -> &'static str;
}

/// Metrics of one evaluated schedule. Lower `fitness` is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub makespan: f64,
    pub total_execution_time: f64,
    pub deadline_miss_ratio: f64,
    pub qos_score: f64,
    pub energy: f64,
    pub fitness: f64,
}

/// Weights of the scalar fitness `w1 * (makespan / scale) - w2 * qos`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessWeights {
    pub makespan_weight: f64,
    pub qos_weight: f64,
    pub makespan_scale: f64,
}

impl FitnessWeights {
    pub fn fitness(&self, makespan: f64, qos_score: f64) -> f64 {
        self.makespan_weight * (makespan / self.makespan_scale) - self.qos_weight * qos_score
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights { makespan_weight: 0.5, qos_weight: 0.3, makespan_scale: 10.0 }
    }
}

impl TryFrom<FitnessWeightsDto> for FitnessWeights {
    type Error = Error;

    fn try_from(dto: FitnessWeightsDto) -> Result<Self> {
        if dto.makespan_scale <= 0.0 {
            return Err(Error::InvalidConfiguration(format!("makespan scale must be positive, got {}", dto.makespan_scale)));
        }
        if dto.makespan_weight < 0.0 || dto.qos_weight < 0.0 {
            return Err(Error::InvalidConfiguration("fitness weights must not be negative".to_string()));
        }
        Ok(FitnessWeights { makespan_weight: dto.makespan_weight, qos_weight: dto.qos_weight, makespan_scale: dto.makespan_scale })
    }
}

/// Linear host power model: `static + utilization * (max - static)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    pub static_power: f64,
    pub max_power: f64,
}

impl PowerModel {
    pub fn power(&self, utilization: f64) -> f64 {
        self.static_power + utilization.clamp(0.0, 1.0) * (self.max_power - self.static_power)
    }
}

impl Default for PowerModel {
    fn default() -> Self {
        PowerModel { static_power: 100.0, max_power: 250.0 }
    }
}

/// Shared physical constants of the VM pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Throughput of one VM in million instructions per time unit.
    pub vm_mips: f64,
    pub power: PowerModel,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig { vm_mips: 2000.0, power: PowerModel::default(), seed: 0 }
    }
}

impl TryFrom<SimulationConfigDto> for SimulationConfig {
    type Error = Error;

    fn try_from(dto: SimulationConfigDto) -> Result<Self> {
        if dto.vm_mips <= 0.0 {
            return Err(Error::InvalidConfiguration(format!("VM throughput must be positive, got {}", dto.vm_mips)));
        }
        if dto.max_power < dto.static_power {
            return Err(Error::InvalidConfiguration("max power must not be below static power".to_string()));
        }
        Ok(SimulationConfig { vm_mips: dto.vm_mips, power: PowerModel { static_power: dto.static_power, max_power: dto.max_power }, seed: dto.seed })
    }
}

/// Per-task QoS contribution `1 - max(0, (finish - deadline) / exec_time)`.
///
/// A task without execution time cannot be normalised, it counts as fully
/// satisfied when on time and as fully missed otherwise.
pub fn task_qos(finish: f64, deadline: f64, exec_time: f64) -> f64 {
    if exec_time > 0.0 {
        1.0 - f64::max(0.0, (finish - deadline) / exec_time)
    } else if finish <= deadline {
        1.0
    } else {
        0.0
    }
}

/// Mean of the per-task contributions, floored at 0. An empty workflow has nothing late.
pub fn aggregate_qos(sum: f64, task_count: usize) -> f64 {
    if task_count == 0 { 1.0 } else { f64::max(0.0, sum / task_count as f64) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitness_decreases_with_qos_and_increases_with_makespan() {
        let weights = FitnessWeights::default();
        assert!((weights.fitness(20.0, 0.5) - 0.85).abs() < 1e-12);
        assert!(weights.fitness(20.0, 0.9) < weights.fitness(20.0, 0.5));
        assert!(weights.fitness(30.0, 0.5) > weights.fitness(20.0, 0.5));
    }

    #[test]
    fn test_task_qos() {
        assert_eq!(task_qos(5.0, 10.0, 2.0), 1.0);
        assert_eq!(task_qos(11.0, 10.0, 2.0), 0.5);
        assert_eq!(task_qos(20.0, 10.0, 2.0), -4.0);
        assert_eq!(task_qos(20.0, 10.0, 0.0), 0.0);
        assert_eq!(aggregate_qos(-4.0, 2), 0.0);
        assert_eq!(aggregate_qos(1.5, 2), 0.75);
    }

    #[test]
    fn test_invalid_simulation_config_is_rejected() {
        let dto = SimulationConfigDto { vm_mips: 0.0, ..Default::default() };
        assert!(matches!(SimulationConfig::try_from(dto), Err(Error::InvalidConfiguration(_))));
    }
}
