// patterns.rs - Shape catalogue and initial-state generators

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::config::LifeConfig;
use crate::error::{LifeError, Result};
use crate::grid::{ALIVE, DEAD, GridSize};

/// A shape given as (x, y) offsets from its top-left corner.
#[derive(Debug, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(u32, u32)],
}

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
};

pub const BLOCK: Pattern = Pattern {
    name: "Block",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
};

pub const PATTERNS: &[Pattern] = &[
    GLIDER,
    BLOCK,
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (1, 0), (2, 0)],
    },
    Pattern {
        name: "Toad",
        cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (2, 0), (3, 0), (4, 0), (8, 0), (9, 0), (10, 0),
            (0, 2), (5, 2), (7, 2), (12, 2),
            (0, 3), (5, 3), (7, 3), (12, 3),
            (0, 4), (5, 4), (7, 4), (12, 4),
            (2, 5), (3, 5), (4, 5), (8, 5), (9, 5), (10, 5),
            // Bottom half (mirrored)
            (2, 7), (3, 7), (4, 7), (8, 7), (9, 7), (10, 7),
            (0, 8), (5, 8), (7, 8), (12, 8),
            (0, 9), (5, 9), (7, 9), (12, 9),
            (0, 10), (5, 10), (7, 10), (12, 10),
            (2, 12), (3, 12), (4, 12), (8, 12), (9, 12), (10, 12),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (0, 4), (1, 4), (0, 5), (1, 5),
            (10, 4), (10, 5), (10, 6), (11, 3), (11, 7), (12, 2), (12, 8),
            (13, 2), (13, 8), (14, 5), (15, 3), (15, 7), (16, 4), (16, 5),
            (16, 6), (17, 5), (20, 2), (20, 3), (20, 4), (21, 2), (21, 3),
            (21, 4), (22, 1), (22, 5), (24, 0), (24, 1), (24, 5), (24, 6),
            (34, 2), (34, 3), (35, 2), (35, 3),
        ],
    },
];

/// Where the default fixed-pattern seed drops its gliders.
pub const GLIDER_ORIGINS: [(u32, u32); 4] = [(0, 0), (10, 10), (20, 20), (5, 25)];

/// A catalogue shape anchored at a grid position, written `name@x,y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Placement {
    pub pattern: &'static Pattern,
    pub origin: (u32, u32),
}

impl Placement {
    /// The demo's four gliders.
    pub fn default_gliders() -> Vec<Placement> {
        GLIDER_ORIGINS
            .into_iter()
            .map(|origin| Placement { pattern: &GLIDER, origin })
            .collect()
    }
}

impl FromStr for Placement {
    type Err = LifeError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || LifeError::InvalidPattern(text.to_string());
        let (name, at) = text.split_once('@').ok_or_else(invalid)?;
        let (x, y) = at.split_once(',').ok_or_else(invalid)?;
        Ok(Placement {
            pattern: find(name.trim()).ok_or_else(invalid)?,
            origin: (
                x.trim().parse().map_err(|_| invalid())?,
                y.trim().parse().map_err(|_| invalid())?,
            ),
        })
    }
}

impl TryFrom<String> for Placement {
    type Error = LifeError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.pattern.name.to_ascii_lowercase().replace(' ', "-");
        write!(f, "{name}@{},{}", self.origin.0, self.origin.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeedStrategy {
    /// Each cell alive with probability `1 - random_threshold`.
    #[default]
    Random,
    /// The configured `patterns` placements.
    FixedPatterns,
}

/// Catalogue lookup, ignoring case; `-` and `_` stand for spaces.
pub fn find(name: &str) -> Option<&'static Pattern> {
    let wanted = name.replace(['-', '_'], " ");
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(&wanted))
}

/// Marks the pattern's cells alive at `origin`. Cells past the grid edge are clipped.
pub fn place(cells: &mut [u32], size: GridSize, pattern: &Pattern, origin: (u32, u32)) {
    for &(dx, dy) in pattern.cells {
        let (x, y) = (origin.0 as u64 + dx as u64, origin.1 as u64 + dy as u64);
        if x < size.width() as u64 && y < size.height() as u64 {
            cells[size.index(x as u32, y as u32)] = ALIVE;
        }
    }
}

pub fn random_fill<R: Rng + ?Sized>(cells: &mut [u32], threshold: f64, rng: &mut R) {
    for cell in cells.iter_mut() {
        *cell = if rng.random::<f64>() > threshold { ALIVE } else { DEAD };
    }
}

/// Builds generation zero for the configured grid.
pub fn initial_state(config: &LifeConfig) -> Result<Vec<u32>> {
    let size = config.grid_size()?;
    let mut cells = vec![DEAD; size.cell_count()];

    match config.seed_strategy {
        SeedStrategy::Random => {
            let mut rng = match config.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            random_fill(&mut cells, config.random_threshold, &mut rng);
        }
        SeedStrategy::FixedPatterns => {
            for placement in &config.patterns {
                place(&mut cells, size, placement.pattern, placement.origin);
            }
        }
    }

    Ok(cells)
}
