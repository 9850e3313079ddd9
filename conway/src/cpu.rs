// cpu.rs - Data-parallel backend running the rule on a rayon pool

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::backend::{Backend, BufferHandle, Frame, FrameSink};
use crate::error::{LifeError, Result};
use crate::grid::{DEAD, GridSize, WORKGROUP_SIZE, Workgroups};
use crate::rule::Rule;

/// Reference backend: buffers live in host memory and each dispatch fans
/// out over a dedicated thread pool, one band of workgroups per task.
pub struct CpuBackend<S: FrameSink> {
    size: GridSize,
    pool: rayon::ThreadPool,
    buffers: Vec<Vec<u32>>,
    sink: S,
    frames: u64,
}

impl<S: FrameSink> CpuBackend<S> {
    pub fn new(size: GridSize, threads: Option<usize>, sink: S) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("conway-compute-{i}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| LifeError::BackendUnavailable(e.to_string()))?;

        debug!(
            width = size.width(),
            height = size.height(),
            threads = pool.current_num_threads(),
            "cpu backend ready"
        );

        Ok(Self {
            size,
            pool,
            buffers: Vec::with_capacity(2),
            sink,
            frames: 0,
        })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn check_handle(&self, handle: BufferHandle) -> Result<()> {
        if handle.0 < self.buffers.len() {
            Ok(())
        } else {
            Err(LifeError::UnknownBuffer(handle))
        }
    }
}

impl<S: FrameSink> Backend for CpuBackend<S> {
    fn allocate_buffer(&mut self, cells: usize) -> Result<BufferHandle> {
        self.size.check_len(cells)?;
        self.buffers.push(vec![DEAD; cells]);
        Ok(BufferHandle(self.buffers.len() - 1))
    }

    fn write_buffer(&mut self, handle: BufferHandle, data: &[u32]) -> Result<()> {
        self.check_handle(handle)?;
        self.size.check_len(data.len())?;
        self.buffers[handle.0].copy_from_slice(data);
        Ok(())
    }

    fn dispatch_compute(
        &mut self,
        rule: &Rule,
        read: BufferHandle,
        write: BufferHandle,
        groups: Workgroups,
    ) -> Result<()> {
        self.check_handle(read)?;
        self.check_handle(write)?;
        if read == write {
            return Err(LifeError::AliasedBuffers(read));
        }

        let size = self.size;
        if !groups.covers(size) {
            let covered_x = (groups.x as usize * WORKGROUP_SIZE as usize).min(size.width() as usize);
            let covered_y = (groups.y as usize * WORKGROUP_SIZE as usize).min(size.height() as usize);
            return Err(LifeError::DimensionMismatch {
                expected: size.cell_count(),
                actual: covered_x * covered_y,
            });
        }

        trace!(?read, ?write, groups_x = groups.x, groups_y = groups.y, "dispatch");

        // Each band is the output of one row of workgroups; bands never overlap.
        let band_len = size.width() as usize * WORKGROUP_SIZE as usize;
        let mut output = std::mem::take(&mut self.buffers[write.0]);
        let input = &self.buffers[read.0];
        self.pool.install(|| {
            output
                .par_chunks_mut(band_len)
                .enumerate()
                .for_each(|(gy, band)| {
                    let base = gy * band_len;
                    for (x, y) in groups.band(gy as u32, size) {
                        band[size.index(x, y) - base] = rule.step_cell(input, size, x, y);
                    }
                });
        });
        self.buffers[write.0] = output;
        Ok(())
    }

    fn render_frame(&mut self, state: BufferHandle) -> Result<()> {
        self.check_handle(state)?;
        let frame = Frame {
            sequence: self.frames,
            size: self.size,
            cells: self.buffers[state.0].clone(),
        };
        self.sink.present(frame)?;
        self.frames += 1;
        Ok(())
    }

    fn read_buffer(&self, handle: BufferHandle) -> Result<&[u32]> {
        self.check_handle(handle)?;
        Ok(&self.buffers[handle.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ALIVE;
    use crate::patterns::random_fill;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn backend(width: u32, height: u32) -> CpuBackend<Vec<Frame>> {
        let size = GridSize::new(width, height).unwrap();
        CpuBackend::new(size, Some(2), Vec::new()).unwrap()
    }

    #[test]
    fn parallel_dispatch_matches_serial_rule() {
        for (w, h) in [(1, 1), (3, 5), (8, 8), (17, 9), (32, 32), (40, 23)] {
            let mut backend = backend(w, h);
            let size = backend.size();
            let mut cells = vec![DEAD; size.cell_count()];
            random_fill(&mut cells, 0.6, &mut StdRng::seed_from_u64(w as u64 * 31 + h as u64));

            let a = backend.allocate_buffer(size.cell_count()).unwrap();
            let b = backend.allocate_buffer(size.cell_count()).unwrap();
            backend.write_buffer(a, &cells).unwrap();
            backend
                .dispatch_compute(&Rule::CONWAY, a, b, Workgroups::covering(size))
                .unwrap();

            let mut expected = vec![DEAD; size.cell_count()];
            Rule::CONWAY.step_grid(&cells, &mut expected, size).unwrap();
            assert_eq!(backend.read_buffer(b).unwrap(), &expected[..], "{w}x{h}");
            assert_eq!(backend.read_buffer(a).unwrap(), &cells[..], "input changed");
        }
    }

    #[test]
    fn oversized_dispatch_is_fine() {
        let mut backend = backend(4, 4);
        let a = backend.allocate_buffer(16).unwrap();
        let b = backend.allocate_buffer(16).unwrap();
        backend.write_buffer(a, &[ALIVE; 16]).unwrap();
        backend
            .dispatch_compute(&Rule::CONWAY, a, b, Workgroups { x: 3, y: 3 })
            .unwrap();
        // Every cell of a full 4x4 torus has 8 live neighbors.
        assert!(backend.read_buffer(b).unwrap().iter().all(|&c| c == DEAD));
    }

    #[test]
    fn rejects_bad_dispatches() {
        let mut backend = backend(16, 16);
        let a = backend.allocate_buffer(256).unwrap();
        let b = backend.allocate_buffer(256).unwrap();

        let err = backend
            .dispatch_compute(&Rule::CONWAY, a, a, Workgroups { x: 2, y: 2 })
            .unwrap_err();
        assert!(matches!(err, LifeError::AliasedBuffers(h) if h == a));

        let err = backend
            .dispatch_compute(&Rule::CONWAY, a, b, Workgroups { x: 2, y: 1 })
            .unwrap_err();
        assert!(matches!(err, LifeError::DimensionMismatch { expected: 256, actual: 128 }));

        let err = backend
            .dispatch_compute(&Rule::CONWAY, a, BufferHandle(9), Workgroups { x: 2, y: 2 })
            .unwrap_err();
        assert!(matches!(err, LifeError::UnknownBuffer(BufferHandle(9))));
    }

    #[test]
    fn buffers_must_match_grid() {
        let mut backend = backend(4, 4);
        assert!(matches!(
            backend.allocate_buffer(15),
            Err(LifeError::DimensionMismatch { expected: 16, actual: 15 })
        ));
        let a = backend.allocate_buffer(16).unwrap();
        assert!(matches!(
            backend.write_buffer(a, &[DEAD; 20]),
            Err(LifeError::DimensionMismatch { expected: 16, actual: 20 })
        ));
    }

    #[test]
    fn frames_are_numbered_in_order() {
        let mut backend = backend(2, 2);
        let a = backend.allocate_buffer(4).unwrap();
        backend.write_buffer(a, &[ALIVE, DEAD, DEAD, ALIVE]).unwrap();
        backend.render_frame(a).unwrap();
        backend.render_frame(a).unwrap();

        assert_eq!(backend.frames_presented(), 2);
        let frames = backend.sink();
        assert_eq!(frames.iter().map(|f| f.sequence).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(frames[1].cells, [ALIVE, DEAD, DEAD, ALIVE]);
    }
}
