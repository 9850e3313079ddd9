// lib.rs - Double-buffered Game of Life on a pluggable compute/render backend

pub mod backend;
pub mod config;
pub mod cpu;
pub mod error;
pub mod grid;
pub mod patterns;
pub mod rule;
pub mod scheduler;
pub mod ticker;

pub use backend::{Backend, BufferHandle, Frame, FrameSink, TextSink};
pub use config::{LifeArgs, LifeConfig};
pub use cpu::CpuBackend;
pub use error::{LifeError, Result};
pub use grid::{ALIVE, DEAD, GridSize, WORKGROUP_SIZE, Workgroups};
pub use patterns::{Pattern, Placement, SeedStrategy};
pub use rule::Rule;
pub use scheduler::Scheduler;
pub use ticker::TickerHandle;

/// Seeds generation zero from `config` and wires a CPU backend presenting to `sink`.
pub fn cpu_scheduler<S: FrameSink>(config: &LifeConfig, sink: S) -> Result<Scheduler<CpuBackend<S>>> {
    let size = config.grid_size()?;
    let initial = patterns::initial_state(config)?;
    let backend = CpuBackend::new(size, config.threads, sink)?;
    Scheduler::new(backend, size, config.rule, &initial)
}
