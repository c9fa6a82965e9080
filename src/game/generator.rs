//! Puzzle dealing.
//!
//! Every puzzle starts from the solved state and is scrambled only with the
//! same toggles a player can make, so it can always be solved again. Colors are
//! never assigned at random.

use crate::game::difficulty::DifficultyConfig;
use crate::game::library::LayoutStore;
use crate::game::puzzle::{Puzzle, ToggleError};
use crate::graph::{LayoutError, LayoutHandle, NodeId};

use log::{debug, error, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// How many previous shuffle picks a new pick must differ from
const SHUFFLE_MEMORY: usize = 2;

/// Error types for puzzle generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    EmptyLayoutPool { tier: String },
    ColorCount { tier: String, count: u8 },
    /// The target is not a reachable colour
    InvalidColors { color_count: u8, target_color: u8 },
    NoUsableLayout { tier: String, last: LayoutError },
    Toggle(ToggleError),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::EmptyLayoutPool { tier } => {
                write!(f, "Tier '{}' has no layouts to build a puzzle from", tier)
            }
            GenerateError::ColorCount { tier, count } => {
                write!(f, "Tier '{}' needs at least 2 colors, has {}", tier, count)
            }
            GenerateError::InvalidColors {
                color_count,
                target_color,
            } => write!(
                f,
                "Cannot deal target color {} with {} colors",
                target_color, color_count
            ),
            GenerateError::NoUsableLayout { tier, last } => {
                write!(f, "No usable layout in tier '{}': {}", tier, last)
            }
            GenerateError::Toggle(e) => write!(f, "Shuffle failed: {}", e),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<ToggleError> for GenerateError {
    fn from(e: ToggleError) -> Self {
        GenerateError::Toggle(e)
    }
}

/// Builds shuffled-but-solvable puzzles from difficulty configs
#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleGenerator;

impl PuzzleGenerator {
    pub fn new() -> Self {
        PuzzleGenerator
    }

    /// Acquire a layout for `config` and deal a puzzle on it.
    ///
    /// The drawn layout is tried first; if it cannot be acquired the rest of the
    /// pool is tried in random order. The returned puzzle holds the layout
    /// handle, which the caller releases to `store` when discarding it.
    pub fn generate<S, R>(
        &self,
        config: &DifficultyConfig,
        store: &mut S,
        rng: &mut R,
    ) -> Result<Puzzle, GenerateError>
    where
        S: LayoutStore + ?Sized,
        R: Rng + ?Sized,
    {
        if config.color_count < 2 {
            let err = GenerateError::ColorCount {
                tier: config.tier.clone(),
                count: config.color_count,
            };
            error!("{}", err);
            return Err(err);
        }

        let layout = self.acquire_layout(config, store, rng)?;

        if layout.node_count() != config.node_count {
            warn!(
                "Layout '{}' has {} nodes, tier '{}' expects {}",
                layout.name(),
                layout.node_count(),
                config.tier,
                config.node_count
            );
        }

        let target_color = rng.random_range(0..config.color_count);
        let picks = shuffle_picks(rng, layout.node_count(), config.shuffle_moves as usize);

        match self.build(layout.clone(), config.color_count, target_color, picks) {
            Ok(puzzle) => {
                info!(
                    "Dealt puzzle on '{}' for level {}: {} colors, target {}, {} shuffle moves",
                    layout.name(),
                    config.level,
                    config.color_count,
                    target_color,
                    config.shuffle_moves
                );
                Ok(puzzle)
            }
            Err(e) => {
                store.release(layout);
                Err(e)
            }
        }
    }

    /// Deal a puzzle from a fixed toggle sequence.
    ///
    /// Starts with every node at `target_color` and applies each pick in order.
    /// Needs at least two colors and a target below `color_count`.
    pub fn build(
        &self,
        layout: LayoutHandle,
        color_count: u8,
        target_color: u8,
        picks: Vec<NodeId>,
    ) -> Result<Puzzle, GenerateError> {
        if color_count < 2 || target_color >= color_count {
            let err = GenerateError::InvalidColors {
                color_count,
                target_color,
            };
            error!("{}", err);
            return Err(err);
        }

        let mut puzzle = Puzzle::solved(layout, color_count, target_color);
        for &pick in &picks {
            puzzle.toggle(pick)?;
        }
        puzzle.record_shuffle(picks);

        if puzzle.is_solved() {
            debug!("Shuffle left the puzzle solved");
        }
        Ok(puzzle)
    }

    fn acquire_layout<S, R>(
        &self,
        config: &DifficultyConfig,
        store: &mut S,
        rng: &mut R,
    ) -> Result<LayoutHandle, GenerateError>
    where
        S: LayoutStore + ?Sized,
        R: Rng + ?Sized,
    {
        if config.layout_pool.is_empty() && config.layout.is_none() {
            let err = GenerateError::EmptyLayoutPool {
                tier: config.tier.clone(),
            };
            error!("{}", err);
            return Err(err);
        }

        let mut candidates: Vec<&str> = Vec::new();
        if let Some(first) = &config.layout {
            candidates.push(first.as_str());
        }
        let mut rest: Vec<&str> = config
            .layout_pool
            .iter()
            .map(String::as_str)
            .filter(|name| Some(*name) != config.layout.as_deref())
            .collect();
        rest.shuffle(rng);
        candidates.extend(rest);

        let mut last = None;
        for name in candidates {
            match store.acquire(name) {
                Ok(handle) => return Ok(handle),
                Err(e) => {
                    warn!("Skipping layout '{}': {}", name, e);
                    last = Some(e);
                }
            }
        }

        let err = GenerateError::NoUsableLayout {
            tier: config.tier.clone(),
            last: last.unwrap_or_else(|| LayoutError::UnknownLayout(String::new())),
        };
        error!("{}", err);
        Err(err)
    }
}

/// Pick `moves` node ids uniformly, each differing from the previous two picks.
///
/// Two-node layouts only avoid the immediately previous pick, since a third
/// distinct id does not exist.
pub fn shuffle_picks<R: Rng + ?Sized>(rng: &mut R, node_count: usize, moves: usize) -> Vec<NodeId> {
    let mut picks: Vec<NodeId> = Vec::with_capacity(moves);
    if node_count == 0 {
        return picks;
    }

    let memory = SHUFFLE_MEMORY.min(node_count - 1);
    for _ in 0..moves {
        let recent = &picks[picks.len().saturating_sub(memory)..];
        let pick = loop {
            let candidate = NodeId(rng.random_range(0..node_count));
            if !recent.contains(&candidate) {
                break candidate;
            }
        };
        picks.push(pick);
    }
    picks
}
