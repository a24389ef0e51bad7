use rand::SeedableRng;
use rand::rngs::StdRng;

use pso_workflow_scheduler::domain::evaluator::ScheduleEvaluator;
use pso_workflow_scheduler::domain::evaluator::simulator::DagSimulator;
use pso_workflow_scheduler::domain::evaluator::surrogate::SurrogateEvaluator;
use pso_workflow_scheduler::domain::evaluator::{FitnessWeights, SimulationConfig};
use pso_workflow_scheduler::domain::scheduler::list_scheduler::ListScheduler;
use pso_workflow_scheduler::domain::scheduler::solution::Solution;
use pso_workflow_scheduler::domain::utils::id::{TaskId, VmId};
use pso_workflow_scheduler::domain::workflow::generator::{GeneratorConfig, WorkflowGenerator};
use pso_workflow_scheduler::domain::workflow::task::Task;
use pso_workflow_scheduler::domain::workflow::workflow::Workflow;

fn generated(task_count: usize, seed: u64) -> Workflow {
    let config = GeneratorConfig { seed: Some(seed), ..Default::default() };
    WorkflowGenerator::new(config, SimulationConfig::default()).generate(task_count).unwrap()
}

#[test]
fn test_single_vm_pool() {
    let workflow = generated(40, 5);

    let mut rng = StdRng::seed_from_u64(5);
    let assignment = ListScheduler::new(1).unwrap().schedule(&workflow, &mut rng).unwrap();
    assert!(assignment.is_topological(&workflow));
    assert!(assignment.entries.iter().all(|entry| entry.vm == VmId::new(0)));

    let mut rng = StdRng::seed_from_u64(6);
    let solution = Solution::random(&workflow, 1, &mut rng);
    let report = SurrogateEvaluator::default().evaluate(&workflow, &solution).unwrap();
    assert!((report.makespan - workflow.total_length() / 2000.0).abs() < 1e-9);
}

#[test]
fn test_assignments_are_topological_on_generated_workflows() {
    for seed in 0..5 {
        let workflow = generated(30, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let assignment = ListScheduler::new(4).unwrap().schedule(&workflow, &mut rng).unwrap();

        assert_eq!(assignment.len(), 30);
        assert!(assignment.is_topological(&workflow));
        assert!(assignment.entries.iter().all(|entry| entry.vm.id < 4));
    }
}

#[test]
fn test_annotated_workflow_is_executed_as_annotated() {
    let workflow = generated(15, 9);
    let mut rng = StdRng::seed_from_u64(9);
    let solution = Solution::random(&workflow, 3, &mut rng);
    let annotated = workflow.annotated(&solution).unwrap();

    let assignment = ListScheduler::new(3).unwrap().schedule(&annotated, &mut rng).unwrap();
    for (pos, vm) in solution.mapping.iter().enumerate() {
        assert_eq!(assignment.vm_of(workflow.task_at(pos).id), Some(*vm));
    }
    assert!(assignment.is_topological(&annotated));
}

#[test]
fn test_simulated_makespan_bounds() {
    // 0 -> 1 -> 2 plus two independent tasks, each 2000 MI (1 time unit)
    let mut workflow = Workflow::new();
    for id in 0..5 {
        workflow.add_task(Task::new(TaskId::new(id), 2000.0, 10.0)).unwrap();
    }
    workflow.add_dependency(TaskId::new(0), TaskId::new(1)).unwrap();
    workflow.add_dependency(TaskId::new(1), TaskId::new(2)).unwrap();

    let report = DagSimulator::new(2, SimulationConfig::default(), FitnessWeights::default()).unwrap().run(&workflow).unwrap();

    // never faster than the chain, never slower than one VM doing everything
    assert!(report.makespan >= 3.0 - 1e-9);
    assert!(report.makespan <= 5.0 + 1e-9);
    assert_eq!(report.qos_score, 1.0);
}
