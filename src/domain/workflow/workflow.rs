use std::collections::{HashMap, HashSet, VecDeque};

use crate::api::workflow_dto::{TaskDto, WorkflowDto};
use crate::domain::scheduler::solution::Solution;
use crate::domain::utils::id::TaskId;
use crate::domain::workflow::task::Task;
use crate::error::{Error, Result};

/// A workflow expressed as a directed acyclic graph of `Task`s.
///
/// Tasks are stored in an arena (`tasks`), addressed by their position. The
/// position is stable for the lifetime of the graph and is what mappings,
/// rank tables and simulator traces are indexed by.
///
/// `edges` is the single authoritative list of dependencies, stored as
/// `(parent_position, child_position)`. The `parents`/`children` adjacency
/// lists are caches derived from it and only ever written by `insert_edge`
/// and `rebuild_adjacency`.
#[derive(Debug)]
pub struct Workflow {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    edges: Vec<(usize, usize)>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,

    /// True while every edge points from a lower to a higher arena position.
    /// Such a graph is acyclic by construction, which lets `add_dependency`
    /// skip the reachability search.
    forward_only: bool,
}

impl Workflow {
    pub fn new() -> Self {
        Workflow { tasks: Vec::new(), index: HashMap::new(), edges: Vec::new(), parents: Vec::new(), children: Vec::new(), forward_only: true }
    }

    /// Registers a task. Fails with `Error::DuplicateTask` if the id is already present.
    pub fn add_task(&mut self, task: Task) -> Result<TaskId> {
        let id = task.id;
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateTask(id));
        }

        self.index.insert(id, self.tasks.len());
        self.tasks.push(task);
        self.parents.push(Vec::new());
        self.children.push(Vec::new());
        Ok(id)
    }

    /// Registers `child` as depending on `parent`.
    ///
    /// Fails with `Error::CycleError` if the edge would close a cycle (this
    /// includes self-loops) and with `Error::UnknownTask` if either end is not
    /// part of the graph. Adding an existing edge again is a no-op.
    pub fn add_dependency(&mut self, parent: TaskId, child: TaskId) -> Result<()> {
        let parent_pos = self.position(parent).ok_or(Error::UnknownTask(parent))?;
        let child_pos = self.position(child).ok_or(Error::UnknownTask(child))?;

        if parent_pos == child_pos {
            return Err(Error::CycleError { parent, child });
        }

        if self.children[parent_pos].contains(&child_pos) {
            log::debug!("Dependency {} -> {} already exists, ignoring.", parent, child);
            return Ok(());
        }

        let is_forward = parent_pos < child_pos;
        if !(self.forward_only && is_forward) && self.reaches(child_pos, parent_pos) {
            return Err(Error::CycleError { parent, child });
        }

        self.insert_edge(parent_pos, child_pos);
        self.forward_only &= is_forward;
        Ok(())
    }

    /// True iff every predecessor of `task` is contained in `done`.
    /// Unknown tasks are never ready.
    pub fn is_ready(&self, task: TaskId, done: &HashSet<TaskId>) -> bool {
        match self.position(task) {
            Some(pos) => self.parents[pos].iter().all(|&p| done.contains(&self.tasks[p].id)),
            None => false,
        }
    }

    /// Produces a structurally identical graph that shares nothing with `self`.
    ///
    /// Ids, lengths, deadlines and edges are preserved, the decision fields of
    /// every task are reset. Edges are re-added by id.
    pub fn deep_copy(&self) -> Workflow {
        let mut copy = Workflow::new();
        copy.tasks = self.tasks.iter().map(|task| Task::new(task.id, task.length, task.deadline)).collect();
        copy.index = copy.tasks.iter().enumerate().map(|(pos, task)| (task.id, pos)).collect();
        copy.edges = self.edges.clone();
        copy.forward_only = self.forward_only;
        copy.rebuild_adjacency();
        copy
    }

    /// Deep copy with the preferred-VM and execution-order fields taken from `solution`.
    pub fn annotated(&self, solution: &Solution) -> Result<Workflow> {
        if solution.mapping.len() != self.len() {
            return Err(Error::ModelConstructionError(format!(
                "Solution maps {} tasks, but the workflow has {}.",
                solution.mapping.len(),
                self.len()
            )));
        }

        let mut copy = self.deep_copy();
        for (task, vm) in copy.tasks.iter_mut().zip(&solution.mapping) {
            task.preferred_vm = Some(*vm);
        }

        for queue in &solution.order_map {
            for (order, task_id) in queue.iter().enumerate() {
                copy.task_mut(*task_id).ok_or(Error::UnknownTask(*task_id))?.execution_order = Some(order);
            }
        }

        Ok(copy)
    }

    /// True if at least one task carries an execution order, i.e. the graph was
    /// annotated by an optimizer.
    pub fn has_execution_order(&self) -> bool {
        self.tasks.iter().any(|task| task.execution_order.is_some())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.position(id).map(|pos| &self.tasks[pos])
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.position(id).map(move |pos| &mut self.tasks[pos])
    }

    /// Arena position of a task.
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn task_at(&self, pos: usize) -> &Task {
        &self.tasks[pos]
    }

    pub fn parent_positions(&self, pos: usize) -> &[usize] {
        &self.parents[pos]
    }

    pub fn child_positions(&self, pos: usize) -> &[usize] {
        &self.children[pos]
    }

    pub fn parents(&self, id: TaskId) -> Vec<TaskId> {
        self.position(id).map(|pos| self.parents[pos].iter().map(|&p| self.tasks[p].id).collect()).unwrap_or_default()
    }

    pub fn children(&self, id: TaskId) -> Vec<TaskId> {
        self.position(id).map(|pos| self.children[pos].iter().map(|&c| self.tasks[c].id).collect()).unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = (TaskId, TaskId)> + '_ {
        self.edges.iter().map(|&(p, c)| (self.tasks[p].id, self.tasks[c].id))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Tasks without predecessors.
    pub fn entry_tasks(&self) -> Vec<TaskId> {
        (0..self.len()).filter(|&pos| self.parents[pos].is_empty()).map(|pos| self.tasks[pos].id).collect()
    }

    /// Tasks without successors.
    pub fn exit_tasks(&self) -> Vec<TaskId> {
        (0..self.len()).filter(|&pos| self.children[pos].is_empty()).map(|pos| self.tasks[pos].id).collect()
    }

    pub fn total_length(&self) -> f64 {
        self.tasks.iter().map(|task| task.length).sum()
    }

    /// A topological order of all tasks (Kahn's algorithm, ties by arena position).
    pub fn topological_order(&self) -> Vec<TaskId> {
        let mut in_degree: Vec<usize> = self.parents.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..self.len()).filter(|&pos| in_degree[pos] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(pos) = queue.pop_front() {
            order.push(self.tasks[pos].id);
            for &child in &self.children[pos] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        order
    }

    /// Depth-first search from `from` along child edges.
    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.len()];
        let mut stack = vec![from];

        while let Some(pos) = stack.pop() {
            if pos == to {
                return true;
            }
            if visited[pos] {
                continue;
            }
            visited[pos] = true;
            stack.extend(self.children[pos].iter().copied().filter(|&c| !visited[c]));
        }
        false
    }

    fn insert_edge(&mut self, parent_pos: usize, child_pos: usize) {
        self.edges.push((parent_pos, child_pos));
        self.parents[child_pos].push(parent_pos);
        self.children[parent_pos].push(child_pos);
    }

    fn rebuild_adjacency(&mut self) {
        self.parents = vec![Vec::new(); self.tasks.len()];
        self.children = vec![Vec::new(); self.tasks.len()];
        for &(parent_pos, child_pos) in &self.edges {
            self.parents[child_pos].push(parent_pos);
            self.children[parent_pos].push(child_pos);
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Workflow::new()
    }
}

impl TryFrom<WorkflowDto> for Workflow {
    type Error = Error;

    /// Builds the graph in two phases: all tasks first, then all dependencies,
    /// so a task may reference parents listed after it.
    fn try_from(dto: WorkflowDto) -> Result<Self> {
        let mut workflow = Workflow::new();

        for task_dto in &dto.tasks {
            workflow.add_task(Task::new(TaskId::new(task_dto.id), task_dto.length, task_dto.deadline))?;
        }

        for task_dto in &dto.tasks {
            for parent in &task_dto.parents {
                workflow.add_dependency(TaskId::new(*parent), TaskId::new(task_dto.id))?;
            }
        }

        log::debug!("Workflow built from DTO: {} tasks, {} dependencies.", workflow.len(), workflow.edge_count());
        Ok(workflow)
    }
}

impl From<&Workflow> for WorkflowDto {
    fn from(workflow: &Workflow) -> Self {
        let tasks = workflow
            .tasks
            .iter()
            .enumerate()
            .map(|(pos, task)| TaskDto {
                id: task.id.id,
                length: task.length,
                deadline: task.deadline,
                parents: workflow.parents[pos].iter().map(|&p| workflow.tasks[p].id.id).collect(),
            })
            .collect();

        WorkflowDto { tasks }
    }
}
