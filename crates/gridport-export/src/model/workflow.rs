//! Job arena.

use std::collections::HashMap;

use crate::error::{ExportError, ExportResult};
use crate::session::NodeId;
use super::job::Job;

/// Overall canvas extent of the laid-out workflow, display only.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[derive(Debug)]
pub struct CanvasExtent {
    /// Width in canvas pixels.
    pub width: i32,
    /// Height in canvas pixels.
    pub height: i32,
}

/// The job graph under construction.
///
/// Jobs live in an insertion-ordered arena addressed by their originating
/// node ID; ports reference other jobs by ID rather than holding pointers,
/// so rewiring passes never fight the borrow checker over a shared graph.
#[derive(Clone, Default)]
#[derive(Debug)]
pub struct Workflow {
    jobs: Vec<Job>,
    index: HashMap<NodeId, usize>,
    canvas: CanvasExtent,
}

impl Workflow {
    /// Creates an empty workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job to the arena.
    ///
    /// Returns an error if a job with the same ID is already present.
    pub fn insert(&mut self, job: Job) -> ExportResult<()> {
        if self.index.contains_key(&job.id) {
            return Err(ExportError::GraphIntegrity(format!(
                "duplicate job id {}",
                job.id
            )));
        }

        self.canvas.width = self.canvas.width.max(job.position.x);
        self.canvas.height = self.canvas.height.max(job.position.y);
        self.index.insert(job.id, self.jobs.len());
        self.jobs.push(job);
        Ok(())
    }

    /// Returns the canvas extent covering every job position.
    pub fn canvas(&self) -> CanvasExtent {
        self.canvas
    }

    /// Returns the job for a node ID, if present.
    pub fn job(&self, id: NodeId) -> Option<&Job> {
        self.index.get(&id).map(|&slot| &self.jobs[slot])
    }

    /// Returns the job for a node ID, mutably.
    pub fn job_mut(&mut self, id: NodeId) -> Option<&mut Job> {
        let slot = *self.index.get(&id)?;
        self.jobs.get_mut(slot)
    }

    /// Returns two distinct jobs mutably at once.
    ///
    /// Returns `None` if either ID is unknown or both name the same job.
    pub fn pair_mut(&mut self, first: NodeId, second: NodeId) -> Option<(&mut Job, &mut Job)> {
        let i = *self.index.get(&first)?;
        let j = *self.index.get(&second)?;
        if i == j {
            return None;
        }

        if i < j {
            let (head, tail) = self.jobs.split_at_mut(j);
            Some((&mut head[i], &mut tail[0]))
        } else {
            let (head, tail) = self.jobs.split_at_mut(i);
            Some((&mut tail[0], &mut head[j]))
        }
    }

    /// Returns whether a job exists for the given node ID.
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterates over jobs in insertion order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Iterates over jobs in insertion order, mutably.
    pub fn jobs_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    /// Returns the number of jobs, ignored ones included.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns whether the arena holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the number of jobs that will be emitted.
    pub fn emitted_len(&self) -> usize {
        self.jobs.iter().filter(|job| !job.ignored).count()
    }
}
