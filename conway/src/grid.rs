// grid.rs - Grid geometry, cell values and workgroup partitioning

use crate::error::{LifeError, Result};

pub const DEAD: u32 = 0;
pub const ALIVE: u32 = 1;

/// Side length of a square compute workgroup.
pub const WORKGROUP_SIZE: u32 = 8;

/// Fixed dimensions of the cell grid. Cells are stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(LifeError::InvalidConfig(format!(
                "grid must be at least 1x1, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn coords(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    /// Fails with `DimensionMismatch` unless `len` is exactly one cell per grid slot.
    pub fn check_len(&self, len: usize) -> Result<()> {
        let expected = self.cell_count();
        if len != expected {
            return Err(LifeError::DimensionMismatch { expected, actual: len });
        }
        Ok(())
    }
}

/// Toroidal step: moves `coord` by `delta` and wraps around `extent`.
pub fn wrap(coord: u32, delta: i32, extent: u32) -> u32 {
    (coord as i64 + delta as i64).rem_euclid(extent as i64) as u32
}

/// Number of workgroups along each axis of one compute dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workgroups {
    pub x: u32,
    pub y: u32,
}

impl Workgroups {
    /// The smallest dispatch whose 8x8 groups cover every cell.
    pub fn covering(size: GridSize) -> Self {
        Self {
            x: size.width().div_ceil(WORKGROUP_SIZE),
            y: size.height().div_ceil(WORKGROUP_SIZE),
        }
    }

    pub fn covers(&self, size: GridSize) -> bool {
        self.x as u64 * WORKGROUP_SIZE as u64 >= size.width() as u64
            && self.y as u64 * WORKGROUP_SIZE as u64 >= size.height() as u64
    }

    pub fn total(&self) -> u64 {
        self.x as u64 * self.y as u64
    }

    /// Invocations of the groups in row `gy` that land inside the grid.
    ///
    /// Every group in the row contributes its 8x8 local ids; ids past the
    /// right or bottom edge are dropped, so across all rows each cell
    /// appears exactly once.
    pub fn band(&self, gy: u32, size: GridSize) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (groups_x, width, height) = (self.x, size.width(), size.height());
        (0..groups_x).flat_map(move |gx| {
            (0..WORKGROUP_SIZE).flat_map(move |ly| {
                (0..WORKGROUP_SIZE).filter_map(move |lx| {
                    let x = gx * WORKGROUP_SIZE + lx;
                    let y = gy * WORKGROUP_SIZE + ly;
                    (x < width && y < height).then_some((x, y))
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rejects_empty_grid() {
        assert!(GridSize::new(0, 4).is_err());
        assert!(GridSize::new(4, 0).is_err());
    }

    #[test]
    fn index_and_coords_agree() {
        let size = GridSize::new(5, 3).unwrap();
        for index in 0..size.cell_count() {
            let (x, y) = size.coords(index);
            assert_eq!(size.index(x, y), index);
        }
        assert_eq!(size.index(4, 2), 14);
    }

    #[test]
    fn wrap_crosses_both_edges() {
        assert_eq!(wrap(0, -1, 32), 31);
        assert_eq!(wrap(31, 1, 32), 0);
        assert_eq!(wrap(5, 1, 32), 6);
        assert_eq!(wrap(0, -1, 1), 0);
    }

    #[test]
    fn covering_rounds_up() {
        let groups = Workgroups::covering(GridSize::new(32, 17).unwrap());
        assert_eq!(groups, Workgroups { x: 4, y: 3 });
        assert!(groups.covers(GridSize::new(32, 24).unwrap()));
        assert!(!groups.covers(GridSize::new(33, 17).unwrap()));
    }

    #[test]
    fn invocations_hit_every_cell_once() {
        for (w, h) in [(1, 1), (8, 8), (9, 7), (32, 32), (13, 21)] {
            let size = GridSize::new(w, h).unwrap();
            let groups = Workgroups::covering(size);
            let mut seen = HashSet::new();
            for gy in 0..groups.y {
                for (x, y) in groups.band(gy, size) {
                    assert!(seen.insert(size.index(x, y)), "({x}, {y}) written twice");
                }
            }
            assert_eq!(seen.len(), size.cell_count());
        }
    }
}
