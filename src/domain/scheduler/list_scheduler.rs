use rand::Rng;

use crate::domain::scheduler::assignment::Assignment;
use crate::domain::utils::id::VmId;
use crate::domain::workflow::rank::RankCalculator;
use crate::domain::workflow::task::Task;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// How the ready set of a pass is sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOrder {
    /// Combined rank `U + D`, highest first (CPOP baseline).
    CriticalPath,
    /// Execution-order field written by the optimizer, lowest first.
    ExecutionOrder,
}

/// Dependency-respecting list scheduler (CPOP style).
///
/// Repeatedly collects all unscheduled tasks whose predecessors are scheduled
/// (the ready set), sorts them and hands them out one by one. Each pass
/// schedules the whole ready set it started with. A task goes to its
/// preferred VM if it has a valid one, otherwise to a uniformly random VM.
///
/// Ties in the sort keep arena order. That is an iteration-order artefact and
/// not part of the policy.
#[derive(Debug, Clone)]
pub struct ListScheduler {
    vm_count: usize,
}

impl ListScheduler {
    pub fn new(vm_count: usize) -> Result<Self> {
        if vm_count == 0 {
            return Err(Error::EmptyResourcePool);
        }
        Ok(ListScheduler { vm_count })
    }

    pub fn vm_count(&self) -> usize {
        self.vm_count
    }

    /// The ordering policy for `workflow`: execution order if the graph was
    /// annotated by an optimizer, critical path otherwise.
    pub fn ready_order(workflow: &Workflow) -> ReadyOrder {
        if workflow.has_execution_order() { ReadyOrder::ExecutionOrder } else { ReadyOrder::CriticalPath }
    }

    pub fn schedule<R: Rng>(&self, workflow: &Workflow, rng: &mut R) -> Result<Assignment> {
        let ready_order = Self::ready_order(workflow);
        let scores = match ready_order {
            ReadyOrder::CriticalPath => RankCalculator::new(workflow).priority_scores(),
            ReadyOrder::ExecutionOrder => Vec::new(),
        };

        let task_count = workflow.len();
        let mut assignment = Assignment::new(self.vm_count);
        let mut is_scheduled = vec![false; task_count];
        let mut pass = 0;

        while assignment.len() < task_count {
            let mut ready: Vec<usize> = (0..task_count)
                .filter(|&pos| !is_scheduled[pos])
                .filter(|&pos| workflow.parent_positions(pos).iter().all(|&parent| is_scheduled[parent]))
                .collect();

            if ready.is_empty() {
                return Err(Error::ModelConstructionError(format!(
                    "No ready task among the {} unscheduled tasks, the dependency graph is not acyclic.",
                    task_count - assignment.len()
                )));
            }

            match ready_order {
                ReadyOrder::CriticalPath => ready.sort_by(|&a, &b| scores[b].total_cmp(&scores[a])),
                ReadyOrder::ExecutionOrder => ready.sort_by_key(|&pos| workflow.task_at(pos).execution_order.unwrap_or(usize::MAX)),
            }

            log::debug!("Pass {}: scheduling {} ready tasks.", pass, ready.len());

            for pos in ready {
                let task = workflow.task_at(pos);
                let vm = self.select_vm(task, rng);
                assignment.push(task.id, vm);
                is_scheduled[pos] = true;
            }
            pass += 1;
        }

        Ok(assignment)
    }

    /// The task's preferred VM if it is in range, otherwise a uniformly random VM.
    fn select_vm<R: Rng>(&self, task: &Task, rng: &mut R) -> VmId {
        match task.preferred_vm.map(|vm| self.check_vm(vm)) {
            Some(Ok(vm)) => vm,
            Some(Err(e)) => {
                log::warn!("Task {}: {}. Falling back to a random VM.", task.id, e);
                VmId::new(rng.random_range(0..self.vm_count))
            }
            None => VmId::new(rng.random_range(0..self.vm_count)),
        }
    }

    fn check_vm(&self, vm: VmId) -> Result<VmId> {
        if vm.id < self.vm_count { Ok(vm) } else { Err(Error::InvalidResourceIndex { vm, vm_count: self.vm_count }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utils::id::TaskId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn workflow_from(lengths: &[f64], edges: &[(usize, usize)]) -> Workflow {
        let mut workflow = Workflow::new();
        for (id, length) in lengths.iter().enumerate() {
            workflow.add_task(Task::new(TaskId::new(id), *length, 100.0)).unwrap();
        }
        for (parent, child) in edges {
            workflow.add_dependency(TaskId::new(*parent), TaskId::new(*child)).unwrap();
        }
        workflow
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(matches!(ListScheduler::new(0), Err(Error::EmptyResourcePool)));
    }

    #[test]
    fn test_critical_path_order() {
        // 0 -> 1 -> 3 and 2 alone: the first pass holds both entries, 0 (on the
        // critical path) goes before 2. Then 1, then 3.
        let workflow = workflow_from(&[10.0, 10.0, 1.0, 10.0], &[(0, 1), (1, 3)]);
        let mut rng = StdRng::seed_from_u64(1);
        let assignment = ListScheduler::new(3).unwrap().schedule(&workflow, &mut rng).unwrap();

        let order: Vec<usize> = assignment.order().iter().map(|id| id.id).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
        assert!(assignment.is_topological(&workflow));
    }

    #[test]
    fn test_single_vm_takes_every_task() {
        let workflow = workflow_from(&[1.0, 2.0, 3.0, 4.0], &[(0, 2), (1, 2), (2, 3)]);
        let mut rng = StdRng::seed_from_u64(2);
        let assignment = ListScheduler::new(1).unwrap().schedule(&workflow, &mut rng).unwrap();

        assert!(assignment.entries.iter().all(|entry| entry.vm == VmId::new(0)));
        assert!(assignment.is_topological(&workflow));
        assert_eq!(assignment.vm_queues()[0].len(), 4);
    }

    #[test]
    fn test_preferred_vm_and_execution_order_are_used() {
        let mut workflow = workflow_from(&[1.0, 1.0, 1.0], &[]);
        for (id, (vm, order)) in [(2, 1), (0, 0), (2, 0)].into_iter().enumerate() {
            let task = workflow.task_mut(TaskId::new(id)).unwrap();
            task.preferred_vm = Some(VmId::new(vm));
            task.execution_order = Some(order);
        }

        let mut rng = StdRng::seed_from_u64(3);
        let scheduler = ListScheduler::new(3).unwrap();
        assert_eq!(ListScheduler::ready_order(&workflow), ReadyOrder::ExecutionOrder);

        let assignment = scheduler.schedule(&workflow, &mut rng).unwrap();
        let order: Vec<usize> = assignment.order().iter().map(|id| id.id).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(assignment.vm_of(TaskId::new(0)), Some(VmId::new(2)));
        assert_eq!(assignment.vm_of(TaskId::new(1)), Some(VmId::new(0)));
        assert_eq!(assignment.vm_of(TaskId::new(2)), Some(VmId::new(2)));
    }

    #[test]
    fn test_invalid_preferred_vm_falls_back_to_pool() {
        let mut workflow = workflow_from(&[1.0, 1.0], &[(0, 1)]);
        workflow.task_mut(TaskId::new(0)).unwrap().preferred_vm = Some(VmId::new(42));

        let mut rng = StdRng::seed_from_u64(4);
        let assignment = ListScheduler::new(2).unwrap().schedule(&workflow, &mut rng).unwrap();

        assert!(assignment.vm_of(TaskId::new(0)).unwrap().id < 2);
        assert!(assignment.is_topological(&workflow));
    }

    #[test]
    fn test_empty_workflow_gives_empty_assignment() {
        let workflow = Workflow::new();
        let mut rng = StdRng::seed_from_u64(5);
        let assignment = ListScheduler::new(2).unwrap().schedule(&workflow, &mut rng).unwrap();
        assert!(assignment.is_empty());
    }
}
