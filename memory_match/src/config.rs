use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BoardGenerator, EvaluatorSettings, LayoutError};

/// Everything that can be tuned about a game, loadable from a JSON file.
///
/// Missing keys fall back to the defaults, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Inclusive range of pair counts a board may have.
    pub pair_range: [u32; 2],
    pub max_rows: u32,
    pub max_columns: u32,
    /// How long both faces of a pair stay visible before it is resolved.
    pub delay_ms: u64,
    /// Mismatches allowed before the game is lost. Zero or less means unlimited.
    pub fail_limit: i32,
    /// Pause between the end of one session and the start of the next.
    pub restart_delay_ms: u64,
    pub score_per_match: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pair_range: [2, 8],
            max_rows: 4,
            max_columns: 6,
            delay_ms: 500,
            fail_limit: -1,
            restart_delay_ms: 2000,
            score_per_match: 10,
        }
    }
}

impl GameConfig {
    /// Reads a JSON config and checks its pair range.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a pair range whose minimum exceeds its maximum.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let [min_pairs, max_pairs] = self.pair_range;
        if min_pairs > max_pairs {
            return Err(LayoutError::InvalidPairRange {
                min_pairs,
                max_pairs,
            });
        }
        Ok(())
    }

    pub fn generator(&self) -> BoardGenerator {
        let [min_pairs, max_pairs] = self.pair_range;
        BoardGenerator::new(min_pairs..=max_pairs, self.max_rows, self.max_columns)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Settings for the evaluator of a board with `total_pairs` pairs.
    pub fn evaluator_settings(&self, total_pairs: u32) -> EvaluatorSettings {
        EvaluatorSettings {
            total_pairs,
            delay: self.delay(),
            fail_limit: self.fail_limit,
        }
    }
}
