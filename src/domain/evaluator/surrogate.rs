use crate::domain::evaluator::{EvaluationReport, FitnessWeights, PowerModel, ScheduleEvaluator, SimulationConfig, aggregate_qos, task_qos};
use crate::domain::scheduler::solution::Solution;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// Closed-form approximation of a schedule, used inside the search loop.
///
/// Every VM is treated as finishing all of its tasks at once, at
/// `workload / vm_mips`. Execution order and dependency waits are ignored.
/// The QoS term therefore uses the VM's completion time as the finish time of
/// each of its tasks, so one late task at the end of a queue penalises all
/// earlier tasks on that VM as well. This is a known approximation.
#[derive(Debug, Clone)]
pub struct SurrogateEvaluator {
    vm_mips: f64,
    power: PowerModel,
    weights: FitnessWeights,
}

impl SurrogateEvaluator {
    pub fn new(simulation: SimulationConfig, weights: FitnessWeights) -> Self {
        SurrogateEvaluator { vm_mips: simulation.vm_mips, power: simulation.power, weights }
    }

    /// Sum of task lengths per VM, summed along the order map.
    fn vm_workloads(&self, workflow: &Workflow, solution: &Solution) -> Result<Vec<f64>> {
        solution
            .order_map
            .iter()
            .map(|queue| queue.iter().map(|task_id| workflow.task(*task_id).map(|task| task.length).ok_or(Error::UnknownTask(*task_id))).sum::<Result<f64>>())
            .collect()
    }
}

impl Default for SurrogateEvaluator {
    fn default() -> Self {
        SurrogateEvaluator::new(SimulationConfig::default(), FitnessWeights::default())
    }
}

impl ScheduleEvaluator for SurrogateEvaluator {
    fn evaluate(&self, workflow: &Workflow, solution: &Solution) -> Result<EvaluationReport> {
        if solution.mapping.len() != workflow.len() {
            return Err(Error::ModelConstructionError(format!("Solution maps {} tasks, but the workflow has {}.", solution.mapping.len(), workflow.len())));
        }

        let vm_work = self.vm_workloads(workflow, solution)?;
        let makespan = vm_work.iter().map(|work| work / self.vm_mips).fold(0.0, f64::max);

        let mut qos_sum = 0.0;
        let mut missed = 0usize;
        let mut total_execution_time = 0.0;
        for (pos, vm) in solution.mapping.iter().enumerate() {
            let task = workflow.task_at(pos);
            let vm_finish = vm_work.get(vm.id).ok_or(Error::InvalidResourceIndex { vm: *vm, vm_count: vm_work.len() })? / self.vm_mips;
            let exec_time = task.length / self.vm_mips;

            qos_sum += task_qos(vm_finish, task.deadline, exec_time);
            if vm_finish > task.deadline {
                missed += 1;
            }
            total_execution_time += exec_time;
        }

        let qos_score = aggregate_qos(qos_sum, workflow.len());
        let deadline_miss_ratio = if workflow.is_empty() { 0.0 } else { missed as f64 / workflow.len() as f64 };

        let energy: f64 = vm_work
            .iter()
            .map(|work| {
                let exec = work / self.vm_mips;
                let utilization = if exec == 0.0 { 0.0 } else { work / (self.vm_mips * makespan) };
                self.power.power(utilization) * exec
            })
            .sum();

        Ok(EvaluationReport {
            makespan,
            total_execution_time,
            deadline_miss_ratio,
            qos_score,
            energy,
            fitness: self.weights.fitness(makespan, qos_score),
        })
    }

    fn name(&self) -> &'static str {
        "surrogate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utils::id::{TaskId, VmId};
    use crate::domain::workflow::task::Task;

    fn workflow_from(tasks: &[(f64, f64)]) -> Workflow {
        let mut workflow = Workflow::new();
        for (id, (length, deadline)) in tasks.iter().enumerate() {
            workflow.add_task(Task::new(TaskId::new(id), *length, *deadline)).unwrap();
        }
        workflow
    }

    fn solution_from(mapping: &[usize], vm_count: usize) -> Solution {
        let mut order_map = vec![Vec::new(); vm_count];
        for (pos, vm) in mapping.iter().enumerate() {
            order_map[*vm].push(TaskId::new(pos));
        }
        Solution { mapping: mapping.iter().map(|vm| VmId::new(*vm)).collect(), order_map }
    }

    #[test]
    fn test_single_vm_makespan_is_total_length_over_throughput() {
        let workflow = workflow_from(&[(4000.0, 100.0), (2000.0, 100.0), (6000.0, 100.0)]);
        let report = SurrogateEvaluator::default().evaluate(&workflow, &solution_from(&[0, 0, 0], 1)).unwrap();

        assert!((report.makespan - 12000.0 / 2000.0).abs() < 1e-12);
        assert_eq!(report.qos_score, 1.0);
        assert_eq!(report.deadline_miss_ratio, 0.0);
        assert!((report.fitness - (0.5 * 0.6 - 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_late_tasks_reduce_qos() {
        // VM 0 finishes at 3.0, VM 1 at 1.0. Task 0 (exec 2.0, deadline 2.0) is 1.0 late.
        let workflow = workflow_from(&[(4000.0, 2.0), (2000.0, 5.0), (2000.0, 0.5)]);
        let report = SurrogateEvaluator::default().evaluate(&workflow, &solution_from(&[0, 0, 1], 2)).unwrap();

        // task 0: 1 - 1/2 = 0.5, task 1: 1, task 2: 1 - 0.5/1 = 0.5
        assert!((report.qos_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.deadline_miss_ratio - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.makespan - 3.0).abs() < 1e-12);
        assert!((report.total_execution_time - 4.0).abs() < 1e-12);
        assert!((report.fitness - (0.5 * 0.3 - 0.3 * 2.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_is_pure() {
        let workflow = workflow_from(&[(8000.0, 3.0), (8010.0, 4.0), (8020.0, 5.0), (8030.0, 1.0)]);
        let solution = solution_from(&[1, 0, 1, 1], 2);
        let evaluator = SurrogateEvaluator::default();

        let first = evaluator.evaluate(&workflow, &solution).unwrap();
        let second = evaluator.evaluate(&workflow, &solution).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fitness.to_bits(), second.fitness.to_bits());
    }

    #[test]
    fn test_qos_is_floored_at_zero() {
        let workflow = workflow_from(&[(2000.0, 0.0), (2000.0, 0.0)]);
        let report = SurrogateEvaluator::default().evaluate(&workflow, &solution_from(&[0, 0], 1)).unwrap();

        assert_eq!(report.qos_score, 0.0);
        assert_eq!(report.deadline_miss_ratio, 1.0);
    }

    #[test]
    fn test_mismatched_solution_is_rejected() {
        let workflow = workflow_from(&[(1.0, 1.0)]);
        let solution = solution_from(&[0, 0], 1);
        assert!(SurrogateEvaluator::default().evaluate(&workflow, &solution).is_err());
    }
}
