use crate::domain::utils::id::{TaskId, VmId};
use crate::domain::workflow::workflow::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    pub vm: VmId,

    /// Position in the global scheduling sequence.
    pub position: usize,
}

/// Output of the list scheduler: every task on exactly one VM, in the order
/// in which the tasks were handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub vm_count: usize,
    pub entries: Vec<ScheduledTask>,
}

impl Assignment {
    pub fn new(vm_count: usize) -> Self {
        Assignment { vm_count, entries: Vec::new() }
    }

    pub fn push(&mut self, task: TaskId, vm: VmId) {
        let position = self.entries.len();
        self.entries.push(ScheduledTask { task, vm, position });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn vm_of(&self, task: TaskId) -> Option<VmId> {
        self.entries.iter().find(|entry| entry.task == task).map(|entry| entry.vm)
    }

    /// The linear execution order.
    pub fn order(&self) -> Vec<TaskId> {
        self.entries.iter().map(|entry| entry.task).collect()
    }

    /// Task ids per VM, each in scheduling order.
    pub fn vm_queues(&self) -> Vec<Vec<TaskId>> {
        let mut queues = vec![Vec::new(); self.vm_count];
        for entry in &self.entries {
            queues[entry.vm.id].push(entry.task);
        }
        queues
    }

    /// True if every task of `workflow` appears exactly once and strictly
    /// after all of its predecessors.
    pub fn is_topological(&self, workflow: &Workflow) -> bool {
        if self.entries.len() != workflow.len() {
            return false;
        }

        let mut sequence_position = vec![usize::MAX; workflow.len()];
        for entry in &self.entries {
            match workflow.position(entry.task) {
                Some(pos) if sequence_position[pos] == usize::MAX => sequence_position[pos] = entry.position,
                _ => return false,
            }
        }

        (0..workflow.len()).all(|pos| workflow.parent_positions(pos).iter().all(|&parent| sequence_position[parent] < sequence_position[pos]))
    }
}
