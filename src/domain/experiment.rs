use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::api::config_dto::ExperimentConfigDto;
use crate::domain::evaluator::simulator::DagSimulator;
use crate::domain::evaluator::surrogate::SurrogateEvaluator;
use crate::domain::evaluator::{EvaluationReport, FitnessWeights, SimulationConfig};
use crate::domain::optimizer::PsoConfig;
use crate::domain::optimizer::pso_scheduler::{PsoOutcome, PsoScheduler};
use crate::domain::workflow::generator::{GeneratorConfig, WorkflowGenerator};
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// Validated configuration of a whole experiment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperimentConfig {
    pub pso: PsoConfig,
    pub fitness: FitnessWeights,
    pub simulation: SimulationConfig,
    pub generator: GeneratorConfig,
}

impl TryFrom<ExperimentConfigDto> for ExperimentConfig {
    type Error = Error;

    fn try_from(dto: ExperimentConfigDto) -> Result<Self> {
        Ok(ExperimentConfig {
            pso: PsoConfig::try_from(dto.pso)?,
            fitness: FitnessWeights::try_from(dto.fitness)?,
            simulation: SimulationConfig::try_from(dto.simulation)?,
            generator: GeneratorConfig::try_from(dto.generator)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Algorithm {
    #[serde(rename = "CPOP")]
    Cpop,
    #[serde(rename = "PSO")]
    Pso,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Cpop => write!(f, "CPOP"),
            Algorithm::Pso => write!(f, "PSO"),
        }
    }
}

/// Simulated metrics of one algorithm on one (task count, VM count) cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComparisonRecord {
    pub algorithm: Algorithm,
    pub vm_count: usize,
    pub task_count: usize,
    pub makespan: f64,
    pub total_execution_time: f64,
    pub energy: f64,
    pub deadline_miss_ratio: f64,
    pub qos_score: f64,
}

impl ComparisonRecord {
    fn from_report(algorithm: Algorithm, vm_count: usize, task_count: usize, report: &EvaluationReport) -> Self {
        ComparisonRecord {
            algorithm,
            vm_count,
            task_count,
            makespan: report.makespan,
            total_execution_time: report.total_execution_time,
            energy: report.energy,
            deadline_miss_ratio: report.deadline_miss_ratio,
            qos_score: report.qos_score,
        }
    }
}

/// One row of the PSO convergence export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRecord {
    pub task_count: usize,
    pub vm_count: usize,
    pub iteration: usize,
    pub best_fitness: f64,
}

#[derive(Debug)]
pub struct Comparison {
    pub cpop: ComparisonRecord,
    pub pso: ComparisonRecord,
    pub pso_outcome: PsoOutcome,
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub records: Vec<ComparisonRecord>,
    pub histories: Vec<HistoryRecord>,
}

/// Runs the CPOP baseline and the PSO scheduler side by side.
///
/// Both algorithms always receive their own deep copy of the workflow and are
/// judged by the same `DagSimulator`.
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    config: ExperimentConfig,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Self {
        ExperimentRunner { config }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn generator(&self) -> WorkflowGenerator {
        WorkflowGenerator::new(self.config.generator.clone(), self.config.simulation)
    }

    fn simulator(&self, vm_count: usize) -> Result<DagSimulator> {
        DagSimulator::new(vm_count, self.config.simulation, self.config.fitness)
    }

    /// List-schedules the untouched workflow by critical-path priority.
    pub fn run_cpop(&self, workflow: &Workflow, vm_count: usize) -> Result<ComparisonRecord> {
        let report = self.simulator(vm_count)?.run(&workflow.deep_copy())?;
        log::info!("CPOP on {} VMs: makespan {:.2}, QoS {:.2}%.", vm_count, report.makespan, report.qos_score * 100.0);
        Ok(ComparisonRecord::from_report(Algorithm::Cpop, vm_count, workflow.len(), &report))
    }

    /// Searches with the surrogate, then simulates the annotated best workflow.
    pub fn run_pso(&self, workflow: &Workflow, vm_count: usize) -> Result<(ComparisonRecord, PsoOutcome)> {
        let simulator = Arc::new(self.simulator(vm_count)?);
        let surrogate = Arc::new(SurrogateEvaluator::new(self.config.simulation, self.config.fitness));

        let mut pso = PsoScheduler::new(self.config.pso.clone(), surrogate)?.with_progress_evaluator(simulator.clone());
        let outcome = pso.schedule(workflow, vm_count)?;

        let report = simulator.run(&outcome.workflow)?;
        log::info!("PSO on {} VMs: makespan {:.2}, QoS {:.2}%.", vm_count, report.makespan, report.qos_score * 100.0);
        Ok((ComparisonRecord::from_report(Algorithm::Pso, vm_count, workflow.len(), &report), outcome))
    }

    pub fn run_comparison(&self, workflow: &Workflow, vm_count: usize) -> Result<Comparison> {
        let cpop = self.run_cpop(workflow, vm_count)?;
        let (pso, pso_outcome) = self.run_pso(workflow, vm_count)?;
        Ok(Comparison { cpop, pso, pso_outcome })
    }

    /// One generated base workflow per task count, compared on every VM count.
    pub fn run_batch(&self, task_counts: &[usize], vm_counts: &[usize]) -> Result<BatchResult> {
        let mut generator = self.generator();
        let mut result = BatchResult::default();

        for &task_count in task_counts {
            let base = generator.generate(task_count)?;
            for &vm_count in vm_counts {
                log::info!("Batch cell: {} tasks on {} VMs.", task_count, vm_count);
                let comparison = self.run_comparison(&base, vm_count)?;

                result.histories.extend(comparison.pso_outcome.fitness_history.iter().enumerate().map(|(iteration, &best_fitness)| HistoryRecord {
                    task_count,
                    vm_count,
                    iteration,
                    best_fitness,
                }));
                result.records.push(comparison.cpop);
                result.records.push(comparison.pso);
            }
        }

        log::info!("Batch finished: {} records.", result.records.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.pso.swarm_size = 6;
        config.pso.max_iterations = 5;
        config.pso.seed = Some(7);
        config.generator.seed = Some(7);
        config
    }

    #[test]
    fn test_default_dto_gives_default_config() {
        let config = ExperimentConfig::try_from(ExperimentConfigDto::default()).unwrap();
        assert_eq!(config, ExperimentConfig::default());
    }

    #[test]
    fn test_invalid_section_is_rejected() {
        let mut dto = ExperimentConfigDto::default();
        dto.pso.swarm_size = 0;
        assert!(matches!(ExperimentConfig::try_from(dto), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_comparison_leaves_base_untouched() {
        let runner = ExperimentRunner::new(small_config());
        let base = runner.generator().generate(12).unwrap();
        let comparison = runner.run_comparison(&base, 3).unwrap();

        assert!(base.tasks().iter().all(|task| !task.has_decisions()));
        assert_eq!(comparison.cpop.algorithm, Algorithm::Cpop);
        assert_eq!(comparison.pso.algorithm, Algorithm::Pso);
        assert_eq!(comparison.pso.task_count, 12);
        assert_eq!(comparison.pso_outcome.fitness_history.len(), 5);
        // both see the same work
        assert!((comparison.cpop.total_execution_time - comparison.pso.total_execution_time).abs() < 1e-9);
    }

    #[test]
    fn test_batch_produces_two_records_per_cell() {
        let runner = ExperimentRunner::new(small_config());
        let result = runner.run_batch(&[5, 8], &[2, 3]).unwrap();

        assert_eq!(result.records.len(), 8);
        assert_eq!(result.histories.len(), 4 * 5);
        assert_eq!(result.records[0].algorithm, Algorithm::Cpop);
        assert_eq!(result.records[7].vm_count, 3);
        assert_eq!(result.records[7].task_count, 8);
    }
}
