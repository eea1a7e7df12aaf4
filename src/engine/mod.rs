//! Board simulator: sliding, merging, spawning and terminal detection.
//!
//! Every operation is a pure function of its board argument. The only
//! randomness is the spawn step, which takes the RNG as a parameter.
//!
//! ```
//! use autoplay_2048::engine::{apply_move, Board, Move};
//! let b = Board::from_rows([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
//! let res = apply_move(b, Move::Left);
//! assert!(res.changed);
//! assert_eq!(res.score_delta, 4);
//! assert_eq!(res.board.rows()[0], [4, 0, 0, 0]);
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

mod line;
pub mod game;
pub mod state;
pub mod tiles;
pub mod transform;

pub use game::{BestScoreStore, Game, InMemoryBestScore, Transition, WIN_TILE};
pub use state::{Board, BoardError, CELLS, MAX_TILE};
pub use tiles::{apply_move_traced, Coord, Origin, Tile, TileGrid};
pub use transform::{Grid, SIZE};

use line::collapse_left;
use transform::rotate_cw_n;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
}

impl Move {
    /// Canonical order. Search ties are broken in this order by default.
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    /// Stable byte encoding used by run traces.
    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Right => 1,
            Move::Down => 2,
            Move::Left => 3,
        }
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Move> {
        match v {
            0 => Some(Move::Up),
            1 => Some(Move::Right),
            2 => Some(Move::Down),
            3 => Some(Move::Left),
            _ => None,
        }
    }

    /// Clockwise quarter turns that bring this direction's edge to the left.
    #[inline]
    pub(crate) fn quarter_turns(self) -> usize {
        match self {
            Move::Left => 0,
            Move::Down => 1,
            Move::Right => 2,
            Move::Up => 3,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "Up",
            Move::Right => "Right",
            Move::Down => "Down",
            Move::Left => "Left",
        };
        f.write_str(name)
    }
}

/// Outcome of sliding a board in one direction (before any spawn).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    /// The board after sliding and merging.
    pub board: Board,
    /// Sum of the values created by merges in this move.
    pub score_delta: u64,
    /// True iff some cell differs from the input in occupancy or value.
    pub changed: bool,
}

/// Slide/merge tiles toward `dir`. No randomness, never mutates `board`.
///
/// The board is rotated so `dir` points at the left edge, each row is collapsed
/// (gaps removed, each adjacent equal pair merged once), then rotated back.
pub fn apply_move(board: Board, dir: Move) -> MoveResult {
    let turns = dir.quarter_turns();
    let mut grid = rotate_cw_n(board.rows(), turns);
    let mut score_delta = 0;
    for row in grid.iter_mut() {
        let collapsed = collapse_left(row);
        *row = collapsed.cells;
        score_delta += collapsed.score;
    }
    let moved = Board::from_grid(rotate_cw_n(&grid, 4 - turns));
    MoveResult { board: moved, score_delta, changed: moved != board }
}

/// Pick the cell and value for a spawn: a uniformly random empty cell, holding
/// 2 with probability 0.9 and 4 otherwise. `None` on a full board.
pub fn pick_spawn<R: Rng + ?Sized>(board: Board, rng: &mut R) -> Option<(Coord, u32)> {
    let empty = board.count_empty();
    if empty == 0 {
        return None;
    }
    let index = rng.gen_range(0..empty);
    let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
    board.empty_cells().nth(index).map(|(row, col)| (Coord::new(row, col), value))
}

/// Insert a random tile (see [`pick_spawn`]). A full board is returned unchanged.
pub fn spawn_random_tile<R: Rng + ?Sized>(board: Board, rng: &mut R) -> Board {
    match pick_spawn(board, rng) {
        Some((at, value)) => board.with_tile(at.row, at.col, value),
        None => board,
    }
}

/// A fresh starting board: two random tiles on an empty grid.
pub fn new_board<R: Rng + ?Sized>(rng: &mut R) -> Board {
    Board::EMPTY.with_random_tile(rng).with_random_tile(rng)
}

/// True iff the board is full and no two orthogonally adjacent cells can merge
/// (equal and below [`MAX_TILE`]).
///
/// This is an adjacency scan, independent of [`apply_move`]; the two are kept in
/// agreement by the `terminal_iff_no_direction_changes` property test.
pub fn is_terminal(board: Board) -> bool {
    let g = board.rows();
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = g[r][c];
            if v == 0 {
                return false;
            }
            if v == MAX_TILE {
                continue;
            }
            if c + 1 < SIZE && g[r][c + 1] == v {
                return false;
            }
            if r + 1 < SIZE && g[r + 1][c] == v {
                return false;
            }
        }
    }
    true
}

/// Directions that change the board, in canonical order.
pub fn legal_moves(board: Board) -> impl Iterator<Item = Move> {
    Move::ALL.into_iter().filter(move |&dir| apply_move(board, dir).changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(rows: Grid<u32>) -> Board { Board::from_rows(rows).unwrap() }

    #[test]
    fn test_move_left() {
        let b = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let res = apply_move(b, Move::Left);
        assert_eq!(res.board, board([[2, 4, 8, 16], [2, 16, 4, 0], [8, 0, 0, 0], [2, 4, 0, 0]]));
        assert_eq!(res.score_delta, 24);
        assert!(res.changed);
    }

    #[test]
    fn test_move_right() {
        let b = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let res = apply_move(b, Move::Right);
        assert_eq!(res.board, board([[2, 4, 8, 16], [0, 2, 16, 4], [0, 0, 0, 8], [0, 0, 2, 4]]));
        assert_eq!(res.score_delta, 24);
    }

    #[test]
    fn test_move_up() {
        let b = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 2, 4, 4]]);
        let res = apply_move(b, Move::Up);
        assert_eq!(res.board, board([[2, 2, 8, 2], [4, 16, 0, 4], [8, 2, 0, 0], [16, 0, 0, 0]]));
        assert_eq!(res.score_delta, 24);
    }

    #[test]
    fn test_move_down() {
        let b = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 2, 4, 4]]);
        let res = apply_move(b, Move::Down);
        assert_eq!(res.board, board([[2, 0, 0, 0], [4, 2, 0, 0], [8, 16, 0, 2], [16, 2, 8, 4]]));
        assert_eq!(res.score_delta, 24);
    }

    #[test]
    fn left_merge_end_to_end() {
        let b = board([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]);
        let res = apply_move(b, Move::Left);
        assert_eq!(res.board, board([[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(res.score_delta, 4);
        assert!(res.changed);
    }

    #[test]
    fn no_double_merge_in_every_direction() {
        let row = board([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(row.shift(Move::Left).rows()[0], [4, 4, 0, 0]);
        assert_eq!(row.shift(Move::Right).rows()[0], [0, 0, 4, 4]);
        let col = board([[2, 0, 0, 0], [2, 0, 0, 0], [2, 0, 0, 0], [2, 0, 0, 0]]);
        assert_eq!(col.shift(Move::Up), board([[4, 0, 0, 0], [4, 0, 0, 0], [0; 4], [0; 4]]));
        assert_eq!(col.shift(Move::Down), board([[0; 4], [0; 4], [4, 0, 0, 0], [4, 0, 0, 0]]));
    }

    #[test]
    fn merge_without_gap_shift_counts_as_changed() {
        let b = board([[2, 2, 4, 8], [0; 4], [0; 4], [0; 4]]);
        let res = apply_move(b, Move::Left);
        assert!(res.changed);
        assert_eq!(res.board.rows()[0], [4, 4, 8, 0]);
    }

    #[test]
    fn compacted_line_reports_unchanged() {
        let b = board([[2, 4, 0, 0], [8, 0, 0, 0], [0; 4], [0; 4]]);
        let res = apply_move(b, Move::Left);
        assert!(!res.changed);
        assert_eq!(res.board, b);
        assert_eq!(res.score_delta, 0);
    }

    #[test]
    fn apply_move_does_not_mutate_input() {
        let b = board([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]);
        let copy = b;
        let _ = apply_move(b, Move::Left);
        assert_eq!(b, copy);
    }

    #[test]
    fn checkerboard_is_terminal() {
        let b = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(is_terminal(b));
        assert!(b.is_terminal());
        assert_eq!(legal_moves(b).count(), 0);
    }

    #[test]
    fn full_board_with_pair_is_not_terminal() {
        let b = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 4]]);
        assert!(!is_terminal(b));
        assert!(!Board::EMPTY.with_tile(0, 0, 2).is_terminal());
    }

    #[test]
    fn empty_board_is_not_terminal_but_has_no_moves() {
        // Terminal requires a full board; an empty one simply cannot move.
        assert!(!is_terminal(Board::EMPTY));
        assert_eq!(legal_moves(Board::EMPTY).count(), 0);
    }

    #[test]
    fn capped_tiles_never_overflow() {
        let b = board([[MAX_TILE; 4], [0; 4], [0; 4], [0; 4]]);
        let left = apply_move(b, Move::Left);
        assert!(!left.changed);
        assert_eq!(left.score_delta, 0);
        let down = apply_move(b, Move::Down);
        assert_eq!(down.board.rows()[3], [MAX_TILE; 4]);
        assert_eq!(down.board.tile_sum(), b.tile_sum());

        let full = board([[MAX_TILE; 4]; 4]);
        assert!(is_terminal(full));
        assert_eq!(legal_moves(full).count(), 0);
        let pair = board([[MAX_TILE, MAX_TILE / 2, 4, 2], [MAX_TILE, MAX_TILE / 2, 2, 4], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!is_terminal(pair));
        assert_eq!(legal_moves(pair).collect::<Vec<_>>(), vec![Move::Up, Move::Down]);
    }

    #[test]
    fn spawn_on_full_board_is_noop() {
        let b = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(spawn_random_tile(b, &mut rng), b);
        assert_eq!(pick_spawn(b, &mut rng), None);
    }

    #[test]
    fn spawn_distribution_is_roughly_nine_to_one() {
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 10_000;
        let fours = (0..trials)
            .filter(|_| pick_spawn(Board::EMPTY, &mut rng).map(|(_, v)| v) == Some(4))
            .count();
        assert!((800..1200).contains(&fours), "fours = {fours}");
    }

    #[test]
    fn spawn_reaches_every_empty_cell() {
        let b = board([[2, 0, 2, 0], [0, 2, 0, 2], [2, 0, 2, 0], [0, 2, 0, 2]]);
        let mut rng = StdRng::seed_from_u64(77);
        let mut seen = [[false; SIZE]; SIZE];
        for _ in 0..500 {
            let (at, _) = pick_spawn(b, &mut rng).unwrap();
            assert_eq!(b.get(at.row, at.col), 0);
            seen[at.row][at.col] = true;
        }
        for (r, c) in b.empty_cells() {
            assert!(seen[r][c], "never spawned at ({r}, {c})");
        }
    }

    #[test]
    fn new_board_has_two_tiles() {
        let mut rng = StdRng::seed_from_u64(42);
        let b = new_board(&mut rng);
        assert_eq!(b.count_empty(), 14);
        assert!(b.rows().iter().flatten().all(|&v| v == 0 || v == 2 || v == 4));
    }

    #[test]
    fn move_byte_encoding() {
        for dir in Move::ALL {
            assert_eq!(Move::from_u8(dir.to_u8()), Some(dir));
        }
        assert_eq!(Move::from_u8(4), None);
    }

    fn arb_board() -> impl Strategy<Value = Board> {
        // Exponent 0 is empty; small exponents keep merges likely.
        proptest::array::uniform16(0u32..6).prop_map(|exps| {
            let mut grid = [[0u32; SIZE]; SIZE];
            for (i, e) in exps.iter().enumerate() {
                grid[i / SIZE][i % SIZE] = if *e == 0 { 0 } else { 1 << e };
            }
            Board::from_rows(grid).unwrap()
        })
    }

    fn arb_full_board() -> impl Strategy<Value = Board> {
        proptest::array::uniform16(1u32..4).prop_map(|exps| {
            let mut grid = [[0u32; SIZE]; SIZE];
            for (i, e) in exps.iter().enumerate() {
                grid[i / SIZE][i % SIZE] = 1 << e;
            }
            Board::from_rows(grid).unwrap()
        })
    }

    fn arb_move() -> impl Strategy<Value = Move> {
        (0u8..4).prop_map(|v| Move::from_u8(v).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn terminal_iff_no_direction_changes(b in arb_board()) {
            // The empty board cannot move yet is not terminal; play never reaches it.
            prop_assume!(b != Board::EMPTY);
            prop_assert_eq!(is_terminal(b), legal_moves(b).next().is_none());
        }

        #[test]
        fn terminal_iff_no_direction_changes_on_full_boards(b in arb_full_board()) {
            let stuck = Move::ALL.iter().all(|&d| !apply_move(b, d).changed);
            prop_assert_eq!(is_terminal(b), stuck);
        }

        #[test]
        fn unchanged_move_is_a_fixed_point(b in arb_board(), dir in arb_move()) {
            let first = apply_move(b, dir);
            let second = apply_move(first.board, dir);
            if !first.changed {
                prop_assert_eq!(first.board, b);
                prop_assert!(!second.changed);
                prop_assert_eq!(second.board, first.board);
            }
        }

        #[test]
        fn merges_conserve_tile_sum(b in arb_board(), dir in arb_move()) {
            let res = apply_move(b, dir);
            prop_assert_eq!(res.board.tile_sum(), b.tile_sum());
            prop_assert_eq!(res.changed, res.board != b);
            if !res.changed {
                prop_assert_eq!(res.score_delta, 0);
            }
        }

        #[test]
        fn score_delta_is_sum_of_merged_values(b in arb_board(), dir in arb_move()) {
            let (res, tiles) = apply_move_traced(b, dir);
            let merged: Vec<u32> = tiles
                .iter()
                .flatten()
                .flatten()
                .filter(|t| t.merged_from().is_some())
                .map(|t| t.value)
                .collect();
            prop_assert!(merged.iter().all(|&v| v >= 4 && v.is_power_of_two()));
            prop_assert_eq!(res.score_delta, merged.iter().map(|&v| u64::from(v)).sum::<u64>());
            prop_assert_eq!(res, apply_move(b, dir));
        }

        #[test]
        fn spawn_never_overwrites(b in arb_board(), seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let after = spawn_random_tile(b, &mut rng);
            if b.count_empty() == 0 {
                prop_assert_eq!(after, b);
            } else {
                prop_assert_eq!(after.count_empty(), b.count_empty() - 1);
                for r in 0..SIZE {
                    for c in 0..SIZE {
                        if b.get(r, c) != 0 {
                            prop_assert_eq!(after.get(r, c), b.get(r, c));
                        } else if after.get(r, c) != 0 {
                            prop_assert!(after.get(r, c) == 2 || after.get(r, c) == 4);
                        }
                    }
                }
            }
        }
    }
}
