use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::evaluator::{EvaluationReport, ScheduleEvaluator};
use crate::domain::optimizer::PsoConfig;
use crate::domain::optimizer::particle::Particle;
use crate::domain::scheduler::solution::Solution;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// Full evaluation of the global best, taken every `report_interval` iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub iteration: usize,
    pub report: EvaluationReport,
}

/// Result of one optimization run.
#[derive(Debug)]
pub struct PsoOutcome {
    /// Fresh deep copy of the input with the preferred-VM and execution-order
    /// fields of the global best written in. Hand this to the list scheduler.
    pub workflow: Workflow,
    pub best: Solution,
    pub best_fitness: f64,

    /// Global best fitness after each iteration.
    pub fitness_history: Vec<f64>,
    pub progress: Vec<ProgressReport>,
}

#[derive(Debug, Clone)]
struct GlobalBest {
    solution: Solution,
    fitness: f64,
}

/// Discrete particle swarm optimization over task to VM mappings.
///
/// The search is driven by `evaluator` (normally the surrogate). The optional
/// `progress_evaluator` (normally the simulator) only sees the global best at
/// the reporting cadence and never influences the search.
#[derive(Debug)]
pub struct PsoScheduler {
    config: PsoConfig,
    evaluator: Arc<dyn ScheduleEvaluator>,
    progress_evaluator: Option<Arc<dyn ScheduleEvaluator>>,
    rng: StdRng,
}

impl PsoScheduler {
    /// Fails with `Error::InvalidConfiguration` for a swarm size of zero.
    pub fn new(config: PsoConfig, evaluator: Arc<dyn ScheduleEvaluator>) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(PsoScheduler { config, evaluator, progress_evaluator: None, rng })
    }

    pub fn with_progress_evaluator(mut self, progress_evaluator: Arc<dyn ScheduleEvaluator>) -> Self {
        self.progress_evaluator = Some(progress_evaluator);
        self
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// Searches a placement of `workflow` onto `vm_count` VMs.
    ///
    /// The run works on its own deep copy of the workflow, the input is never touched.
    pub fn schedule(&mut self, workflow: &Workflow, vm_count: usize) -> Result<PsoOutcome> {
        if vm_count == 0 {
            return Err(Error::EmptyResourcePool);
        }

        let workflow = workflow.deep_copy();
        log::info!(
            "PSO started: {} tasks, {} VMs, swarm size {}, {} iterations, evaluator '{}'.",
            workflow.len(),
            vm_count,
            self.config.swarm_size,
            self.config.max_iterations,
            self.evaluator.name()
        );

        let mut swarm = self.init_swarm(&workflow, vm_count)?;
        let mut global_best = Self::best_of(&swarm);
        let mut fitness_history = Vec::with_capacity(self.config.max_iterations);
        let mut progress = Vec::new();

        for iteration in 0..self.config.max_iterations {
            for particle in swarm.iter_mut() {
                let fitness = self.evaluator.evaluate(&workflow, &particle.position)?.fitness;
                particle.update_personal_best(fitness);

                if fitness < global_best.fitness {
                    global_best = GlobalBest { solution: particle.position.clone(), fitness };
                }
            }

            fitness_history.push(global_best.fitness);
            log::debug!("Iteration {}: global best fitness {:.6}", iteration, global_best.fitness);

            for particle in swarm.iter_mut() {
                particle.fly(&workflow, &global_best.solution, &self.config, &mut self.rng);
            }

            if self.config.report_interval > 0 && iteration % self.config.report_interval == 0 {
                if let Some(report) = self.report_progress(&workflow, iteration, &global_best.solution) {
                    progress.push(ProgressReport { iteration, report });
                }
            }
        }

        log::info!("PSO finished: best fitness {:.6}.", global_best.fitness);

        let annotated = workflow.annotated(&global_best.solution)?;
        Ok(PsoOutcome { workflow: annotated, best: global_best.solution, best_fitness: global_best.fitness, fitness_history, progress })
    }

    fn init_swarm(&mut self, workflow: &Workflow, vm_count: usize) -> Result<Vec<Particle>> {
        (0..self.config.swarm_size).map(|_| Particle::spawn(workflow, vm_count, self.evaluator.as_ref(), &mut self.rng)).collect()
    }

    /// The swarm is never empty, `PsoConfig::validate` rejects a swarm size of zero.
    fn best_of(swarm: &[Particle]) -> GlobalBest {
        let best = swarm.iter().skip(1).fold(&swarm[0], |best, particle| if particle.best_fitness < best.best_fitness { particle } else { best });
        GlobalBest { solution: best.best_position.clone(), fitness: best.best_fitness }
    }

    /// Evaluates the global best with the progress evaluator. Failures are
    /// logged and swallowed, reporting must not abort the search.
    fn report_progress(&self, workflow: &Workflow, iteration: usize, best: &Solution) -> Option<EvaluationReport> {
        let progress_evaluator = self.progress_evaluator.as_ref()?;
        match progress_evaluator.evaluate(workflow, best) {
            Ok(report) => {
                log::info!("Iteration {} -> Makespan={:.2} | QoS={:.2}%", iteration, report.makespan, report.qos_score * 100.0);
                Some(report)
            }
            Err(e) => {
                log::warn!("Iteration {}: progress evaluation with '{}' failed: {}", iteration, progress_evaluator.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluator::surrogate::SurrogateEvaluator;
    use crate::domain::utils::id::TaskId;
    use crate::domain::workflow::task::Task;

    fn chain(n: usize) -> Workflow {
        let mut workflow = Workflow::new();
        for id in 0..n {
            workflow.add_task(Task::new(TaskId::new(id), 2000.0, 5.0)).unwrap();
        }
        for id in 1..n {
            workflow.add_dependency(TaskId::new(id - 1), TaskId::new(id)).unwrap();
        }
        workflow
    }

    fn config(swarm_size: usize, max_iterations: usize) -> PsoConfig {
        PsoConfig { swarm_size, max_iterations, report_interval: 0, seed: Some(42), ..Default::default() }
    }

    #[test]
    fn test_zero_swarm_is_rejected() {
        let result = PsoScheduler::new(config(0, 10), Arc::new(SurrogateEvaluator::default()));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let mut pso = PsoScheduler::new(config(2, 2), Arc::new(SurrogateEvaluator::default())).unwrap();
        assert!(matches!(pso.schedule(&chain(3), 0), Err(Error::EmptyResourcePool)));
    }

    #[test]
    fn test_input_workflow_is_left_untouched() {
        let workflow = chain(5);
        let mut pso = PsoScheduler::new(config(4, 3), Arc::new(SurrogateEvaluator::default())).unwrap();
        let outcome = pso.schedule(&workflow, 2).unwrap();

        assert!(workflow.tasks().iter().all(|task| !task.has_decisions()));
        assert!(outcome.workflow.tasks().iter().all(|task| task.preferred_vm.is_some() && task.execution_order.is_some()));
    }

    #[test]
    fn test_zero_iterations_returns_best_initial_particle() {
        let mut pso = PsoScheduler::new(config(5, 0), Arc::new(SurrogateEvaluator::default())).unwrap();
        let outcome = pso.schedule(&chain(4), 3).unwrap();

        assert!(outcome.fitness_history.is_empty());
        assert!(outcome.best.validate(&outcome.workflow).is_ok());
    }
}
