// rule.rs - Life-like update rule with toroidal neighbor counting

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{LifeError, Result};
use crate::grid::{ALIVE, DEAD, GridSize, wrap};

#[rustfmt::skip]
const OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Birth/survival rule. Bit `n` of each mask is set when `n` live
/// neighbors trigger birth (dead cell) or survival (live cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rule {
    birth: u16,
    survive: u16,
}

impl Rule {
    /// Conway's Game of Life, B3/S23.
    pub const CONWAY: Rule = Rule {
        birth: 1 << 3,
        survive: (1 << 2) | (1 << 3),
    };

    pub fn next_state(&self, current: u32, neighbors: u32) -> u32 {
        let mask = if current == ALIVE { self.survive } else { self.birth };
        if neighbors <= 8 && mask & (1 << neighbors) != 0 { ALIVE } else { DEAD }
    }

    /// One invocation of the rule: next state of the cell at (x, y).
    pub fn step_cell(&self, cells: &[u32], size: GridSize, x: u32, y: u32) -> u32 {
        let current = cells[size.index(x, y)];
        self.next_state(current, live_neighbors(cells, size, x, y))
    }

    /// Serial generation step, the reference for parallel dispatches.
    pub fn step_grid(&self, current: &[u32], next: &mut [u32], size: GridSize) -> Result<()> {
        size.check_len(current.len())?;
        size.check_len(next.len())?;
        for (index, slot) in next.iter_mut().enumerate() {
            let (x, y) = size.coords(index);
            *slot = self.step_cell(current, size, x, y);
        }
        Ok(())
    }
}

impl Default for Rule {
    fn default() -> Self {
        Rule::CONWAY
    }
}

/// Live cells among the 8 neighbors of (x, y), wrapping at every edge.
pub fn live_neighbors(cells: &[u32], size: GridSize, x: u32, y: u32) -> u32 {
    OFFSETS
        .iter()
        .filter(|&&(dx, dy)| {
            let nx = wrap(x, dx, size.width());
            let ny = wrap(y, dy, size.height());
            cells[size.index(nx, ny)] == ALIVE
        })
        .count() as u32
}

fn parse_counts(digits: &str, text: &str) -> Result<u16> {
    let mut mask = 0u16;
    for c in digits.chars() {
        match c.to_digit(10) {
            Some(n) if n <= 8 => mask |= 1 << n,
            _ => return Err(LifeError::InvalidRule(text.to_string())),
        }
    }
    Ok(mask)
}

impl FromStr for Rule {
    type Err = LifeError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || LifeError::InvalidRule(text.to_string());
        let (birth, survive) = text.trim().split_once('/').ok_or_else(invalid)?;
        let birth = birth
            .strip_prefix('B')
            .or_else(|| birth.strip_prefix('b'))
            .ok_or_else(invalid)?;
        let survive = survive
            .strip_prefix('S')
            .or_else(|| survive.strip_prefix('s'))
            .ok_or_else(invalid)?;
        Ok(Rule {
            birth: parse_counts(birth, text)?,
            survive: parse_counts(survive, text)?,
        })
    }
}

impl TryFrom<String> for Rule {
    type Error = LifeError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |mask: u16| -> String {
            (0..=8u32)
                .filter(|&n| mask & (1 << n) != 0)
                .filter_map(|n| char::from_digit(n, 10))
                .collect()
        };
        write!(f, "B{}/S{}", digits(self.birth), digits(self.survive))
    }
}
