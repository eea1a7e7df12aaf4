use crate::engine::transform::{symmetries, Grid, SIZE};
use crate::engine::Board;

use super::SearchEvaluator;

/// Snake gradient: powers of 4 along a boustrophedon path, row 0 left to right,
/// row 1 right to left, and so on, ending at the left corner of row 3.
pub const SNAKE_WEIGHTS: Grid<f64> = [
    [1.0, 4.0, 16.0, 64.0],
    [16_384.0, 4_096.0, 1_024.0, 256.0],
    [65_536.0, 262_144.0, 1_048_576.0, 4_194_304.0],
    [1_073_741_824.0, 268_435_456.0, 67_108_864.0, 16_777_216.0],
];

#[inline]
fn weighted(grid: &Grid<u32>) -> f64 {
    let mut score = 0.0;
    for r in 0..SIZE {
        for c in 0..SIZE {
            score += f64::from(grid[r][c]) * SNAKE_WEIGHTS[r][c];
        }
    }
    score
}

/// Best fit of the board against the snake gradient over all 8 symmetries of
/// the square, so a chain anchored in any corner with either handedness scores
/// the same.
pub fn snake_score(board: Board) -> f64 {
    symmetries(board.rows()).iter().map(weighted).fold(0.0, f64::max)
}

/// The default leaf evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeHeuristic;

impl SearchEvaluator for SnakeHeuristic {
    #[inline]
    fn evaluate(&self, board: Board) -> f64 { snake_score(board) }
}
