use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::utils::id::{TaskId, VmId};
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

/// A candidate placement of a workflow onto a pool of identical VMs.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// VM per task, indexed by the task's arena position in the workflow.
    pub mapping: Vec<VmId>,

    /// Ordered task ids per VM, indexed by VM.
    pub order_map: Vec<Vec<TaskId>>,
}

impl Solution {
    /// A uniformly random mapping with a random order per VM.
    pub fn random<R: Rng>(workflow: &Workflow, vm_count: usize, rng: &mut R) -> Solution {
        let mapping: Vec<VmId> = (0..workflow.len()).map(|_| VmId::new(rng.random_range(0..vm_count))).collect();
        let order_map = Self::order_from_mapping(workflow, &mapping, vm_count, rng);
        Solution { mapping, order_map }
    }

    /// Groups the tasks by their mapped VM. The task ids are shuffled before
    /// grouping, so the order inside each VM is random.
    pub fn order_from_mapping<R: Rng>(workflow: &Workflow, mapping: &[VmId], vm_count: usize, rng: &mut R) -> Vec<Vec<TaskId>> {
        let mut positions: Vec<usize> = (0..mapping.len()).collect();
        positions.shuffle(rng);

        let mut order_map = vec![Vec::new(); vm_count];
        for pos in positions {
            order_map[mapping[pos].id].push(workflow.task_at(pos).id);
        }
        order_map
    }

    pub fn vm_count(&self) -> usize {
        self.order_map.len()
    }

    pub fn task_count(&self) -> usize {
        self.mapping.len()
    }

    /// Checks that the solution covers `workflow` exactly: one VM per task,
    /// every VM index in range and every task queued exactly once on its VM.
    pub fn validate(&self, workflow: &Workflow) -> Result<()> {
        if self.mapping.len() != workflow.len() {
            return Err(Error::ModelConstructionError(format!("Solution maps {} tasks, but the workflow has {}.", self.mapping.len(), workflow.len())));
        }

        let vm_count = self.vm_count();
        if let Some(vm) = self.mapping.iter().find(|vm| vm.id >= vm_count) {
            return Err(Error::InvalidResourceIndex { vm: *vm, vm_count });
        }

        let mut seen = vec![false; workflow.len()];
        for (vm, queue) in self.order_map.iter().enumerate() {
            for task_id in queue {
                let pos = workflow.position(*task_id).ok_or(Error::UnknownTask(*task_id))?;
                if seen[pos] || self.mapping[pos].id != vm {
                    return Err(Error::ModelConstructionError(format!("Task {} is queued inconsistently with its mapping.", task_id)));
                }
                seen[pos] = true;
            }
        }

        if let Some(missing) = seen.iter().position(|queued| !queued) {
            return Err(Error::ModelConstructionError(format!("Task {} is missing from the order map.", workflow.task_at(missing).id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::task::Task;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn independent_tasks(n: usize) -> Workflow {
        let mut workflow = Workflow::new();
        for id in 0..n {
            workflow.add_task(Task::new(TaskId::new(id), 100.0, 10.0)).unwrap();
        }
        workflow
    }

    #[test]
    fn test_random_solution_is_valid() {
        let workflow = independent_tasks(25);
        let mut rng = StdRng::seed_from_u64(7);
        let solution = Solution::random(&workflow, 4, &mut rng);

        assert_eq!(solution.task_count(), 25);
        assert_eq!(solution.vm_count(), 4);
        assert!(solution.validate(&workflow).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_vm() {
        let workflow = independent_tasks(2);
        let solution = Solution { mapping: vec![VmId::new(0), VmId::new(3)], order_map: vec![vec![TaskId::new(0)]] };

        assert!(matches!(solution.validate(&workflow), Err(Error::InvalidResourceIndex { vm_count: 1, .. })));
    }

    #[test]
    fn test_validate_rejects_missing_task() {
        let workflow = independent_tasks(2);
        let solution = Solution { mapping: vec![VmId::new(0), VmId::new(0)], order_map: vec![vec![TaskId::new(1)]] };

        assert!(matches!(solution.validate(&workflow), Err(Error::ModelConstructionError(_))));
    }
}
