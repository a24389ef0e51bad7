use crate::domain::utils::id::{TaskId, VmId};

/// A single unit of work inside a `Workflow`.
///
/// Dependency edges live in the owning `Workflow` and ranks are owned by the
/// `RankCalculator`, so a task only carries its own data and the two
/// scheduling decision fields written by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,

    /// Execution length in million instructions, independent of the VM.
    pub length: f64,

    /// Absolute point in time the task should be finished by.
    pub deadline: f64,

    /// VM the optimizer wants this task on. `None` means "use the default policy".
    pub preferred_vm: Option<VmId>,

    /// Position of the task in the queue of its preferred VM.
    pub execution_order: Option<usize>,
}

impl Task {
    pub fn new(id: TaskId, length: f64, deadline: f64) -> Self {
        Task { id, length, deadline, preferred_vm: None, execution_order: None }
    }

    pub fn has_decisions(&self) -> bool {
        self.preferred_vm.is_some() || self.execution_order.is_some()
    }

    pub fn reset_decisions(&mut self) {
        self.preferred_vm = None;
        self.execution_order = None;
    }
}
