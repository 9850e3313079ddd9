// scheduler.rs - Double-buffered generation scheduler

use tracing::{debug, trace};

use crate::backend::{Backend, BufferHandle};
use crate::error::{LifeError, Result};
use crate::grid::{ALIVE, DEAD, GridSize, Workgroups};
use crate::rule::Rule;

/// Owns the two cell buffers and alternates their roles every tick.
///
/// With `step` even, buffer A (index 0) is current and B is next; the roles
/// swap each time `step` advances. A dispatch only ever reads the current
/// buffer and writes the next one, so no cell is read and written by the
/// same dispatch.
pub struct Scheduler<B: Backend> {
    backend: B,
    size: GridSize,
    rule: Rule,
    groups: Workgroups,
    buffers: [BufferHandle; 2],
    step: u64,
}

impl<B: Backend> Scheduler<B> {
    /// Allocates both buffers and uploads `initial` into buffer A.
    pub fn new(mut backend: B, size: GridSize, rule: Rule, initial: &[u32]) -> Result<Self> {
        size.check_len(initial.len())?;
        if let Some((index, &value)) = initial
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != ALIVE && v != DEAD)
        {
            return Err(LifeError::NonBinaryCell { index, value });
        }

        let cells = size.cell_count();
        let buffers = [backend.allocate_buffer(cells)?, backend.allocate_buffer(cells)?];
        backend.write_buffer(buffers[0], initial)?;

        let groups = Workgroups::covering(size);
        debug!(
            width = size.width(),
            height = size.height(),
            groups_x = groups.x,
            groups_y = groups.y,
            %rule,
            "scheduler ready"
        );

        Ok(Self {
            backend,
            size,
            rule,
            groups,
            buffers,
            step: 0,
        })
    }

    /// One simulate-then-render cycle.
    pub fn tick(&mut self) -> Result<()> {
        let current = self.current();
        let next = 1 - current;
        trace!(step = self.step, current, next, "tick");

        self.backend.dispatch_compute(
            &self.rule,
            self.buffers[current],
            self.buffers[next],
            self.groups,
        )?;

        self.step += 1;

        // The buffer just written is the current one under the new step.
        self.backend.render_frame(self.buffers[self.current()])?;
        self.backend.submit()
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Index (0 = A, 1 = B) of the buffer holding the latest generation.
    pub fn current(&self) -> usize {
        (self.step % 2) as usize
    }

    /// Index of the buffer the next tick writes.
    pub fn next(&self) -> usize {
        1 - self.current()
    }

    pub fn buffers(&self) -> [BufferHandle; 2] {
        self.buffers
    }

    pub fn current_cells(&self) -> Result<&[u32]> {
        self.backend.read_buffer(self.buffers[self.current()])
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn workgroups(&self) -> Workgroups {
        self.groups
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
