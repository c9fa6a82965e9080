// game/difficulty.rs

use log::{debug, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

const DIFFICULTY_JSON: &str = include_str!("../../assets/difficulty.json");

/// Number of tiers the bundled table is authored with
pub const TIER_COUNT: usize = 5;

/// Error types for difficulty table loading
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    NoTiers,
    InvertedRange { tier: String, min: u32, max: u32 },
    NotContiguous { tier: String, expected: u32, found: u32 },
    ColorCount { tier: String, count: u8 },
    ComboThreshold(String),
    Timing(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Cannot parse difficulty table: {}", msg),
            ConfigError::NoTiers => write!(f, "Difficulty table has no tiers"),
            ConfigError::InvertedRange { tier, min, max } => {
                write!(f, "Tier '{}' range {}..={} is inverted", tier, min, max)
            }
            ConfigError::NotContiguous {
                tier,
                expected,
                found,
            } => write!(
                f,
                "Tier '{}' starts at level {}, expected {}",
                tier, found, expected
            ),
            ConfigError::ColorCount { tier, count } => {
                write!(f, "Tier '{}' needs at least 2 colors, has {}", tier, count)
            }
            ConfigError::ComboThreshold(tier) => {
                write!(f, "Tier '{}' combo threshold must be at least 1", tier)
            }
            ConfigError::Timing(tier) => {
                write!(f, "Tier '{}' has a negative or non-finite timing or multiplier", tier)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One contiguous, inclusive range of levels sharing a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub min_level: u32,
    pub max_level: u32,
    /// Expected node count of the layouts in the pool
    pub node_count: usize,
    pub color_count: u8,
    pub shuffle_moves: u32,
    /// Seconds a puzzle may take before the combo streak breaks
    pub time_per_puzzle: f32,
    pub session_time_limit: f32,
    pub solve_score: u32,
    /// Carried from the authored data, not applied by the engine
    #[serde(default)]
    pub wrong_penalty: u32,
    pub combo_threshold: u32,
    pub combo_multiplier: f32,
    #[serde(default)]
    pub layout_pool: Vec<String>,
}

impl Tier {
    pub fn contains(&self, level: u32) -> bool {
        (self.min_level..=self.max_level).contains(&level)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.min_level > self.max_level {
            return Err(ConfigError::InvertedRange {
                tier: self.name.clone(),
                min: self.min_level,
                max: self.max_level,
            });
        }
        if self.color_count < 2 {
            return Err(ConfigError::ColorCount {
                tier: self.name.clone(),
                count: self.color_count,
            });
        }
        if self.combo_threshold == 0 {
            return Err(ConfigError::ComboThreshold(self.name.clone()));
        }
        let scalars = [
            self.time_per_puzzle,
            self.session_time_limit,
            self.combo_multiplier,
        ];
        if scalars.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::Timing(self.name.clone()));
        }
        Ok(())
    }
}

/// Configuration resolved for one level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyConfig {
    pub level: u32,
    pub tier: String,
    pub node_count: usize,
    pub color_count: u8,
    pub shuffle_moves: u32,
    pub time_per_puzzle: f32,
    pub session_time_limit: f32,
    pub solve_score: u32,
    pub wrong_penalty: u32,
    pub combo_threshold: u32,
    pub combo_multiplier: f32,
    pub layout_pool: Vec<String>,
    /// Layout drawn from the pool, `None` when the pool is empty
    pub layout: Option<String>,
}

impl DifficultyConfig {
    pub fn from_tier(tier: &Tier, level: u32, layout: Option<String>) -> Self {
        DifficultyConfig {
            level,
            tier: tier.name.clone(),
            node_count: tier.node_count,
            color_count: tier.color_count,
            shuffle_moves: tier.shuffle_moves,
            time_per_puzzle: tier.time_per_puzzle,
            session_time_limit: tier.session_time_limit,
            solve_score: tier.solve_score,
            wrong_penalty: tier.wrong_penalty,
            combo_threshold: tier.combo_threshold,
            combo_multiplier: tier.combo_multiplier,
            layout_pool: tier.layout_pool.clone(),
            layout,
        }
    }

    /// Score for a solve at the given streak length
    pub fn earned_score(&self, combo_streak: u32) -> u32 {
        if combo_streak >= self.combo_threshold {
            // Float to int casts saturate at u32::MAX
            (f64::from(self.solve_score) * f64::from(self.combo_multiplier)).round() as u32
        } else {
            self.solve_score
        }
    }
}

/// Maps a level number to its difficulty configuration
pub trait DifficultyResolver {
    fn resolve<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> DifficultyConfig;
}

#[derive(Debug, Deserialize)]
struct TableFile {
    tiers: Vec<Tier>,
}

/// Ordered, contiguous difficulty tiers
#[derive(Debug, Clone)]
pub struct DifficultyTable {
    tiers: Vec<Tier>,
}

impl DifficultyTable {
    /// Build a table, rejecting gaps, overlaps and out-of-range values
    pub fn new(tiers: Vec<Tier>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::NoTiers);
        }

        for tier in &tiers {
            tier.check()?;
            if tier.layout_pool.is_empty() {
                warn!("Tier '{}' has an empty layout pool", tier.name);
            }
        }

        for pair in tiers.windows(2) {
            let expected = pair[0].max_level.saturating_add(1);
            if pair[1].min_level != expected {
                return Err(ConfigError::NotContiguous {
                    tier: pair[1].name.clone(),
                    expected,
                    found: pair[1].min_level,
                });
            }
        }

        Ok(DifficultyTable { tiers })
    }

    /// Load the bundled difficulty table
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_json(DIFFICULTY_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: TableFile =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::new(file.tiers)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// First tier whose upper bound reaches `level`, else the hardest tier
    pub fn tier_for(&self, level: u32) -> &Tier {
        self.tiers
            .iter()
            .find(|tier| tier.max_level >= level)
            .unwrap_or_else(|| &self.tiers[self.tiers.len() - 1])
    }

    /// Highest level covered by an authored tier
    pub fn max_level(&self) -> u32 {
        self.tiers[self.tiers.len() - 1].max_level
    }
}

impl DifficultyResolver for DifficultyTable {
    fn resolve<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> DifficultyConfig {
        let tier = self.tier_for(level);
        let layout = tier.layout_pool.choose(rng).cloned();

        debug!(
            "Level {} resolved to tier '{}' with layout {:?}",
            level, tier.name, layout
        );

        DifficultyConfig::from_tier(tier, level, layout)
    }
}

#[cfg(test)]
pub(crate) fn test_tier(name: &str, min_level: u32, max_level: u32, pool: &[&str]) -> Tier {
    Tier {
        name: name.to_string(),
        min_level,
        max_level,
        node_count: 3,
        color_count: 2,
        shuffle_moves: 2,
        time_per_puzzle: 10.0,
        session_time_limit: 30.0,
        solve_score: 100,
        wrong_penalty: 0,
        combo_threshold: 3,
        combo_multiplier: 1.5,
        layout_pool: pool.iter().map(|s| s.to_string()).collect(),
    }
}
