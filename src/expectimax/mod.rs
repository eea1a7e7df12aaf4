//! Expectimax search policy for 2048.
//!
//! Player nodes take the maximum over the directions that change the board;
//! chance nodes average over every empty cell, weighting a spawned 2 by 0.9 and
//! a spawned 4 by 0.1. Leaves are scored by a [`SearchEvaluator`], by default
//! the symmetric snake-gradient [`SnakeHeuristic`].
//!
//! The search is exhaustive within its depth bound: no pruning and no caching.
//! It is deterministic unless [`TieBreak::Random`] is configured and an RNG is
//! supplied.
//!
//! Quick start
//! ```
//! use autoplay_2048::engine::{new_board, Board};
//! use autoplay_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = new_board(&mut rng);
//! let mut ex = Expectimax::new();
//! let m = ex.best_move(b0);
//! assert!(m.is_some());
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move};

mod heuristic;
mod search;

pub use heuristic::{snake_score, SnakeHeuristic, SNAKE_WEIGHTS};
pub use search::Expectimax;

/// Value of a player node with no legal move. Ranks below every heuristic score.
pub const LOSS_SCORE: f64 = -1e20;

/// Direction returned by [`Expectimax::choose_move`] when nothing is legal.
pub const FALLBACK_MOVE: Move = Move::Up;

/// Static board evaluation used at search leaves.
pub trait SearchEvaluator {
    fn evaluate(&self, board: Board) -> f64;
}

impl<F: Fn(Board) -> f64> SearchEvaluator for F {
    fn evaluate(&self, board: Board) -> f64 { self(board) }
}

/// How to pick among root moves with exactly equal expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First in `Move::ALL` order (Up, Right, Down, Left). Deterministic.
    #[default]
    InputOrder,
    /// Uniform among the tied moves, drawn from the RNG passed to the
    /// `*_with_rng` methods. Without an RNG this behaves like `InputOrder`.
    Random,
}

/// Configurable knobs. Defaults give the adaptive depth policy: 3 plies, 4 once
/// a 2048 tile exists, 5 when additionally at most 4 cells are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Depth when nothing below applies.
    pub base_depth: u32,
    /// Depth once the highest tile reaches `late_game_tile`.
    pub late_game_depth: u32,
    /// Depth in the late game when at most `endgame_max_empty` cells are empty.
    pub endgame_depth: u32,
    pub late_game_tile: u32,
    pub endgame_max_empty: usize,
    /// Optional hard cap applied after the policy.
    pub depth_cap: Option<u32>,
    pub tie_break: TieBreak,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_depth: 3,
            late_game_depth: 4,
            endgame_depth: 5,
            late_game_tile: 2048,
            endgame_max_empty: 4,
            depth_cap: None,
            tie_break: TieBreak::InputOrder,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid search config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SearchConfig {
    /// Search depth for `board` under the adaptive policy.
    pub fn depth_for(&self, board: Board) -> u32 {
        let mut depth = self.base_depth;
        if board.highest_tile() >= self.late_game_tile {
            depth = self.late_game_depth;
            if board.count_empty() <= self.endgame_max_empty {
                depth = self.endgame_depth;
            }
        }
        match self.depth_cap {
            Some(cap) => depth.min(cap),
            None => depth,
        }
    }

    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
    pub depth: u32,
}
