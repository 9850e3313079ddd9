// config.rs - Simulation settings from TOML and the command line

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{LifeError, Result};
use crate::grid::GridSize;
use crate::patterns::{Placement, SeedStrategy};
use crate::rule::Rule;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifeConfig {
    pub width: u32,
    pub height: u32,
    /// Milliseconds between two ticks.
    pub interval_ms: u64,
    pub seed_strategy: SeedStrategy,
    /// A cell starts alive when its random sample exceeds this value.
    pub random_threshold: f64,
    /// Shapes placed by the fixed-patterns seed.
    pub patterns: Vec<Placement>,
    pub rule: Rule,
    pub rng_seed: Option<u64>,
    /// Worker threads for the compute pool; rayon picks when unset.
    pub threads: Option<usize>,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            interval_ms: 100,
            seed_strategy: SeedStrategy::Random,
            random_threshold: 0.6,
            patterns: Placement::default_gliders(),
            rule: Rule::CONWAY,
            rng_seed: None,
            threads: None,
        }
    }
}

impl LifeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: LifeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid_size()?;
        if self.interval_ms == 0 {
            return Err(LifeError::InvalidConfig("interval_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.random_threshold) {
            return Err(LifeError::InvalidConfig(format!(
                "random_threshold must be within [0, 1], got {}",
                self.random_threshold
            )));
        }
        if self.threads == Some(0) {
            return Err(LifeError::InvalidConfig("threads must be positive".into()));
        }
        Ok(())
    }

    pub fn grid_size(&self) -> Result<GridSize> {
        GridSize::new(self.width, self.height)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Command-line overrides, flattened into each binary's parser.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LifeArgs {
    /// TOML file with simulation settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    pub width: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    pub height: Option<u32>,

    /// Milliseconds between generations
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// How generation zero is seeded
    #[arg(long, value_enum)]
    pub seed_strategy: Option<SeedStrategy>,

    /// Random seeding threshold in [0, 1]
    #[arg(long, value_name = "P")]
    pub random_threshold: Option<f64>,

    /// Shape to place with the fixed-patterns seed, e.g. pulsar@5,5 (repeatable)
    #[arg(long = "pattern", value_name = "NAME@X,Y")]
    pub patterns: Vec<Placement>,

    /// Birth/survival rule, e.g. B3/S23
    #[arg(long)]
    pub rule: Option<Rule>,

    /// Fixed RNG seed for reproducible random starts
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Compute worker threads
    #[arg(long)]
    pub threads: Option<usize>,
}

impl LifeArgs {
    /// Loads `--config` (or the defaults) and applies every override given.
    pub fn resolve(&self) -> Result<LifeConfig> {
        let mut config = match &self.config {
            Some(path) => LifeConfig::load(path)?,
            None => LifeConfig::default(),
        };

        if let Some(width) = self.width { config.width = width; }
        if let Some(height) = self.height { config.height = height; }
        if let Some(interval_ms) = self.interval_ms { config.interval_ms = interval_ms; }
        if let Some(strategy) = self.seed_strategy { config.seed_strategy = strategy; }
        if let Some(threshold) = self.random_threshold { config.random_threshold = threshold; }
        if !self.patterns.is_empty() { config.patterns = self.patterns.clone(); }
        if let Some(rule) = self.rule { config.rule = rule; }
        if self.rng_seed.is_some() { config.rng_seed = self.rng_seed; }
        if self.threads.is_some() { config.threads = self.threads; }

        config.validate()?;
        Ok(config)
    }
}
