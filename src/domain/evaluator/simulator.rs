use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::evaluator::{EvaluationReport, FitnessWeights, ScheduleEvaluator, SimulationConfig, aggregate_qos, task_qos};
use crate::domain::scheduler::assignment::Assignment;
use crate::domain::scheduler::list_scheduler::ListScheduler;
use crate::domain::scheduler::solution::Solution;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// Timed execution of one schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTrace {
    pub assignment: Assignment,

    /// Start and finish time per task, indexed by arena position.
    pub start: Vec<f64>,
    pub finish: Vec<f64>,

    /// Busy time per VM.
    pub vm_busy: Vec<f64>,
}

/// Reference execution simulator for a pool of identical VMs.
///
/// The workflow is first turned into a concrete assignment by the
/// `ListScheduler`, then executed: each VM runs its tasks one after another in
/// scheduling order, and a task starts once its VM is free and all of its
/// parents have finished. This is the ground truth the surrogate approximates,
/// and it is considerably more expensive to run.
#[derive(Debug, Clone)]
pub struct DagSimulator {
    scheduler: ListScheduler,
    config: SimulationConfig,
    weights: FitnessWeights,
}

impl DagSimulator {
    pub fn new(vm_count: usize, config: SimulationConfig, weights: FitnessWeights) -> Result<Self> {
        if config.vm_mips <= 0.0 {
            return Err(Error::InvalidConfiguration(format!("VM throughput must be positive, got {}", config.vm_mips)));
        }
        Ok(DagSimulator { scheduler: ListScheduler::new(vm_count)?, config, weights })
    }

    pub fn vm_count(&self) -> usize {
        self.scheduler.vm_count()
    }

    /// Schedules and executes `workflow`, honouring its decision fields if set.
    ///
    /// Tasks without a preferred VM are placed with an RNG seeded from the
    /// configuration, so repeated runs on the same input agree.
    pub fn run(&self, workflow: &Workflow) -> Result<EvaluationReport> {
        let trace = self.trace(workflow)?;
        Ok(self.report(workflow, &trace))
    }

    pub fn trace(&self, workflow: &Workflow) -> Result<SimulationTrace> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let assignment = self.scheduler.schedule(workflow, &mut rng)?;
        self.execute(workflow, assignment)
    }

    /// Executes an already computed assignment.
    pub fn execute(&self, workflow: &Workflow, assignment: Assignment) -> Result<SimulationTrace> {
        if !assignment.is_topological(workflow) {
            return Err(Error::ModelConstructionError("Assignment is not a topological order of the workflow.".to_string()));
        }

        let mut start = vec![0.0; workflow.len()];
        let mut finish = vec![0.0; workflow.len()];
        let mut vm_free = vec![0.0_f64; assignment.vm_count];
        let mut vm_busy = vec![0.0_f64; assignment.vm_count];

        for entry in &assignment.entries {
            let pos = workflow.position(entry.task).ok_or(Error::UnknownTask(entry.task))?;
            let vm = entry.vm.id;
            if vm >= assignment.vm_count {
                return Err(Error::InvalidResourceIndex { vm: entry.vm, vm_count: assignment.vm_count });
            }

            // Parents precede their children in a topological assignment, so their finish times are final.
            let parents_done = workflow.parent_positions(pos).iter().map(|&parent| finish[parent]).fold(0.0, f64::max);
            let exec_time = workflow.task_at(pos).length / self.config.vm_mips;

            start[pos] = vm_free[vm].max(parents_done);
            finish[pos] = start[pos] + exec_time;
            vm_free[vm] = finish[pos];
            vm_busy[vm] += exec_time;
        }

        Ok(SimulationTrace { assignment, start, finish, vm_busy })
    }

    pub fn report(&self, workflow: &Workflow, trace: &SimulationTrace) -> EvaluationReport {
        let makespan = trace.finish.iter().copied().fold(0.0, f64::max);

        let mut qos_sum = 0.0;
        let mut missed = 0usize;
        let mut total_execution_time = 0.0;
        for (pos, task) in workflow.tasks().iter().enumerate() {
            let exec_time = trace.finish[pos] - trace.start[pos];
            qos_sum += task_qos(trace.finish[pos], task.deadline, exec_time);
            if trace.finish[pos] > task.deadline {
                missed += 1;
            }
            total_execution_time += exec_time;
        }

        let qos_score = aggregate_qos(qos_sum, workflow.len());
        let deadline_miss_ratio = if workflow.is_empty() { 0.0 } else { missed as f64 / workflow.len() as f64 };

        // Every VM draws power for the whole run, scaled by how busy it was.
        let energy: f64 = trace
            .vm_busy
            .iter()
            .map(|busy| {
                let utilization = if makespan > 0.0 { busy / makespan } else { 0.0 };
                self.config.power.power(utilization) * makespan
            })
            .sum();

        EvaluationReport { makespan, total_execution_time, deadline_miss_ratio, qos_score, energy, fitness: self.weights.fitness(makespan, qos_score) }
    }
}

impl ScheduleEvaluator for DagSimulator {
    fn evaluate(&self, workflow: &Workflow, solution: &Solution) -> Result<EvaluationReport> {
        self.run(&workflow.annotated(solution)?)
    }

    fn name(&self) -> &'static str {
        "simulator"
    }
}
