use rand::Rng;

use crate::domain::evaluator::ScheduleEvaluator;
use crate::domain::optimizer::PsoConfig;
use crate::domain::scheduler::solution::Solution;
use crate::domain::utils::id::VmId;
use crate::domain::workflow::workflow::Workflow;
use crate::error::Result;

/// One candidate of the swarm.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Solution,

    /// One value per (task, VM) cell, indexed `[task_position][vm]`.
    /// Higher values make the task more likely to move to that VM.
    pub velocity: Vec<Vec<f64>>,

    pub best_position: Solution,
    pub best_fitness: f64,
}

impl Particle {
    /// A particle with a uniformly random mapping, a random order per VM and
    /// velocities drawn uniformly from `[-1, 1)`.
    pub fn spawn<R: Rng>(workflow: &Workflow, vm_count: usize, evaluator: &dyn ScheduleEvaluator, rng: &mut R) -> Result<Self> {
        let position = Solution::random(workflow, vm_count, rng);
        let velocity: Vec<Vec<f64>> = (0..workflow.len()).map(|_| (0..vm_count).map(|_| rng.random_range(-1.0..1.0)).collect()).collect();
        let fitness = evaluator.evaluate(workflow, &position)?.fitness;

        Ok(Particle { best_position: position.clone(), position, velocity, best_fitness: fitness })
    }

    /// Records `fitness` of the current position. Returns true if it is a new personal best.
    pub fn update_personal_best(&mut self, fitness: f64) -> bool {
        if fitness < self.best_fitness {
            self.best_fitness = fitness;
            self.best_position = self.position.clone();
            true
        } else {
            false
        }
    }

    /// Moves the particle one step.
    ///
    /// Per task, the velocity row is pulled towards the VM of the personal and
    /// of the global best mapping, then a new VM is sampled from the softmax
    /// of that row. Afterwards the order map is re-randomized from the new
    /// mapping, the order itself is not steered by the velocity.
    pub fn fly<R: Rng>(&mut self, workflow: &Workflow, global_best: &Solution, config: &PsoConfig, rng: &mut R) {
        for (pos, row) in self.velocity.iter_mut().enumerate() {
            let personal_vm = self.best_position.mapping[pos].id;
            let global_vm = global_best.mapping[pos].id;

            for (vm, velocity) in row.iter_mut().enumerate() {
                let r1: f64 = rng.random();
                let r2: f64 = rng.random();
                let cognitive = config.cognitive * r1 * indicator(personal_vm == vm);
                let social = config.social * r2 * indicator(global_vm == vm);
                *velocity = config.inertia * *velocity + cognitive + social;
            }

            if let Some(vm) = sample_softmax(row, rng.random()) {
                self.position.mapping[pos] = VmId::new(vm);
            }
        }

        let vm_count = self.position.vm_count();
        self.position.order_map = Solution::order_from_mapping(workflow, &self.position.mapping, vm_count, rng);
    }
}

fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Picks the first index whose cumulative softmax probability reaches `draw`.
///
/// `p(i) = exp(v[i]) / sum(exp(v))`. The row maximum is subtracted before
/// exponentiating, which leaves the probabilities unchanged but keeps large
/// velocities from overflowing. Returns `None` for an empty row or if rounding
/// keeps the cumulative sum below `draw`.
pub fn sample_softmax(row: &[f64], draw: f64) -> Option<usize> {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = row.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = weights.iter().sum();

    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight / sum;
        if draw <= cumulative {
            return Some(index);
        }
    }
    None
}
