use std::collections::HashMap;

use crate::domain::utils::id::TaskId;
use crate::domain::workflow::workflow::Workflow;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankDirection {
    /// Towards the exit tasks, following child edges.
    Upward,
    /// Towards the entry tasks, following parent edges.
    Downward,
}

/// Critical-path ranks of the tasks of one `Workflow`.
///
/// * upward rank `U(t) = length(t) + max(U(child))`, `U(t) = length(t)` for exit tasks
/// * downward rank `D(t) = length(t) + max(D(parent))`, `D(t) = length(t)` for entry tasks
///
/// Both ranks are memoized per task id, so every rank is computed at most once
/// no matter in which order tasks are queried. The memo belongs to the
/// calculator and is dropped with it, nothing is written back into the graph.
#[derive(Debug)]
pub struct RankCalculator<'a> {
    workflow: &'a Workflow,
    upward: HashMap<TaskId, f64>,
    downward: HashMap<TaskId, f64>,
}

impl<'a> RankCalculator<'a> {
    pub fn new(workflow: &'a Workflow) -> Self {
        RankCalculator { workflow, upward: HashMap::with_capacity(workflow.len()), downward: HashMap::with_capacity(workflow.len()) }
    }

    pub fn compute_upward_rank(&mut self, task: TaskId) -> Result<f64> {
        let pos = self.workflow.position(task).ok_or(Error::UnknownTask(task))?;
        Ok(self.resolve(pos, RankDirection::Upward))
    }

    pub fn compute_downward_rank(&mut self, task: TaskId) -> Result<f64> {
        let pos = self.workflow.position(task).ok_or(Error::UnknownTask(task))?;
        Ok(self.resolve(pos, RankDirection::Downward))
    }

    /// Combined priority `U(t) + D(t)`. Higher means more critical.
    pub fn priority_score(&mut self, task: TaskId) -> Result<f64> {
        Ok(self.compute_upward_rank(task)? + self.compute_downward_rank(task)?)
    }

    /// Priority scores of all tasks, indexed by arena position.
    pub fn priority_scores(&mut self) -> Vec<f64> {
        (0..self.workflow.len())
            .map(|pos| self.resolve(pos, RankDirection::Upward) + self.resolve(pos, RankDirection::Downward))
            .collect()
    }

    /// Task ids sorted by priority score, highest first.
    ///
    /// Equal scores keep arena order. That tie-break is an artefact of
    /// iteration order, not a scheduling rule, so callers should not rely on it.
    pub fn ranked_tasks(&mut self) -> Vec<(TaskId, f64)> {
        let scores = self.priority_scores();
        let mut ranked: Vec<(TaskId, f64)> = scores.into_iter().enumerate().map(|(pos, score)| (self.workflow.task_at(pos).id, score)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Computes the rank of the task at `start`, resolving every missing
    /// neighbour rank first.
    ///
    /// Uses an explicit stack instead of recursion, so long dependency chains
    /// cannot overflow the call stack. A node stays on the stack until all of
    /// its neighbours have a rank.
    fn resolve(&mut self, start: usize, direction: RankDirection) -> f64 {
        let workflow = self.workflow;
        let memo = match direction {
            RankDirection::Upward => &mut self.upward,
            RankDirection::Downward => &mut self.downward,
        };

        let mut stack = vec![start];
        while let Some(&pos) = stack.last() {
            let task = workflow.task_at(pos);
            if memo.contains_key(&task.id) {
                stack.pop();
                continue;
            }

            let neighbours = match direction {
                RankDirection::Upward => workflow.child_positions(pos),
                RankDirection::Downward => workflow.parent_positions(pos),
            };

            let mut max_neighbour_rank = 0.0_f64;
            let mut is_neighbour_without_rank = false;
            for &neighbour in neighbours {
                match memo.get(&workflow.task_at(neighbour).id) {
                    Some(rank) => max_neighbour_rank = max_neighbour_rank.max(*rank),
                    None => {
                        is_neighbour_without_rank = true;
                        stack.push(neighbour);
                    }
                }
            }

            if !is_neighbour_without_rank {
                memo.insert(task.id, task.length + max_neighbour_rank);
                stack.pop();
            }
        }

        memo[&workflow.task_at(start).id]
    }
}
