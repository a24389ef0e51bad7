use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::config_dto::GeneratorConfigDto;
use crate::domain::evaluator::simulator::DagSimulator;
use crate::domain::evaluator::{FitnessWeights, SimulationConfig};
use crate::domain::utils::id::{TaskId, VmId};
use crate::domain::workflow::task::Task;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Length of task 0. Task `i` gets `base_length + i * length_step`.
    pub base_length: f64,
    pub length_step: f64,

    /// Size of the pool used to derive deadlines.
    pub deadline_vm_count: usize,

    /// Deadlines are drawn from `[finish - jitter, finish + jitter)`.
    pub deadline_jitter: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig { base_length: 8000.0, length_step: 10.0, deadline_vm_count: 20, deadline_jitter: 10.0, seed: None }
    }
}

impl TryFrom<GeneratorConfigDto> for GeneratorConfig {
    type Error = Error;

    fn try_from(dto: GeneratorConfigDto) -> Result<Self> {
        if dto.deadline_vm_count == 0 {
            return Err(Error::EmptyResourcePool);
        }
        if dto.base_length < 0.0 || dto.length_step < 0.0 || dto.deadline_jitter < 0.0 {
            return Err(Error::InvalidConfiguration("generator lengths and jitter must not be negative".to_string()));
        }
        Ok(GeneratorConfig {
            base_length: dto.base_length,
            length_step: dto.length_step,
            deadline_vm_count: dto.deadline_vm_count,
            deadline_jitter: dto.deadline_jitter,
            seed: dto.seed,
        })
    }
}

/// Produces random workflows for experiments.
///
/// Edges always point from a lower to a higher task id, so every generated
/// graph is acyclic. Deadlines come from one simulated execution on a random
/// placement, jittered around each task's finish time, and are not
/// guaranteed to be attainable.
#[derive(Debug)]
pub struct WorkflowGenerator {
    config: GeneratorConfig,
    simulation: SimulationConfig,
    rng: StdRng,
}

impl WorkflowGenerator {
    pub fn new(config: GeneratorConfig, simulation: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        WorkflowGenerator { config, simulation, rng }
    }

    pub fn generate(&mut self, task_count: usize) -> Result<Workflow> {
        let mut workflow = Workflow::new();
        for i in 0..task_count {
            let length = self.config.base_length + i as f64 * self.config.length_step;
            workflow.add_task(Task::new(TaskId::new(i), length, f64::MAX))?;
        }

        self.add_random_edges(&mut workflow)?;
        self.assign_deadlines(&mut workflow)?;

        log::info!("Generated workflow with {} tasks and {} dependencies.", workflow.len(), workflow.edge_count());
        Ok(workflow)
    }

    /// Draws the edge count uniformly from `[n / 2, n * (n - 1) / 2]` and adds
    /// that many distinct `parent < child` edges.
    fn add_random_edges(&mut self, workflow: &mut Workflow) -> Result<()> {
        let n = workflow.len();
        if n < 2 {
            return Ok(());
        }

        let min_edges = n / 2;
        let max_edges = n * (n - 1) / 2;
        let edge_count = self.rng.random_range(min_edges..=max_edges);

        let mut added: HashSet<(usize, usize)> = HashSet::with_capacity(edge_count);
        while added.len() < edge_count {
            let parent = self.rng.random_range(0..n - 1);
            let child = self.rng.random_range(parent + 1..n);

            if added.insert((parent, child)) {
                workflow.add_dependency(TaskId::new(parent), TaskId::new(child))?;
            }
        }
        Ok(())
    }

    /// Places every task on a random VM, simulates the run and sets
    /// `deadline = finish - jitter + U[0, 2 * jitter)`.
    fn assign_deadlines(&mut self, workflow: &mut Workflow) -> Result<()> {
        if workflow.is_empty() {
            return Ok(());
        }

        let mut placed = workflow.deep_copy();
        for id in workflow.task_ids() {
            let vm = VmId::new(self.rng.random_range(0..self.config.deadline_vm_count));
            if let Some(task) = placed.task_mut(id) {
                task.preferred_vm = Some(vm);
            }
        }

        let simulator = DagSimulator::new(self.config.deadline_vm_count, self.simulation, FitnessWeights::default())?;
        let trace = simulator.trace(&placed)?;

        for id in workflow.task_ids() {
            let pos = workflow.position(id).ok_or(Error::UnknownTask(id))?;
            let jitter = self.config.deadline_jitter;
            let offset = if jitter > 0.0 { self.rng.random_range(0.0..2.0 * jitter) } else { 0.0 };
            if let Some(task) = workflow.task_mut(id) {
                task.deadline = trace.finish[pos] - jitter + offset;
            }
        }
        Ok(())
    }
}
