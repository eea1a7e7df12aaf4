//! Presentation-only tile annotations.
//!
//! The simulator works on plain values; this side-channel tells a renderer where
//! each tile came from so it can animate slides, merges and spawns. None of it
//! feeds back into board equality, hashing or scoring.

use serde::{Deserialize, Serialize};

use super::line::{collapse_left, Source};
use super::state::Board;
use super::transform::{rotate_cw_n, Grid, SIZE};
use super::{Move, MoveResult};

/// A cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self { Coord { row, col } }
}

/// How a tile reached its current cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Slid from (or stayed at) the given cell.
    Moved(Coord),
    /// Produced by merging the tiles at the two given cells.
    Merged(Coord, Coord),
    /// Spawned by the chance step after the move.
    Spawned,
}

/// An occupied cell with its presentation annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub value: u32,
    pub row: usize,
    pub col: usize,
    pub origin: Origin,
}

impl Tile {
    /// True for a tile that appeared in this transition's spawn.
    pub fn is_new(&self) -> bool { matches!(self.origin, Origin::Spawned) }

    /// The predecessor cells of a merged tile.
    pub fn merged_from(&self) -> Option<[Coord; 2]> {
        match self.origin {
            Origin::Merged(a, b) => Some([a, b]),
            _ => None,
        }
    }
}

/// Annotated grid; `None` for empty cells.
pub type TileGrid = Grid<Option<Tile>>;

fn coord_grid() -> Grid<Coord> {
    let mut grid = [[Coord::default(); SIZE]; SIZE];
    for (r, row) in grid.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = Coord::new(r, c);
        }
    }
    grid
}

/// Annotate a board with no history: every tile "moved" from where it stands.
pub fn annotate(board: Board) -> TileGrid {
    let mut out: TileGrid = [[None; SIZE]; SIZE];
    for (r, row) in board.rows().iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            if value != 0 {
                out[r][c] = Some(Tile { value, row: r, col: c, origin: Origin::Moved(Coord::new(r, c)) });
            }
        }
    }
    out
}

/// Like [`super::apply_move`], but also reports where each resulting tile came from.
///
/// Coordinates travel through the same rotation as the values, so every recorded
/// origin is in the caller's orientation.
pub fn apply_move_traced(board: Board, dir: Move) -> (MoveResult, TileGrid) {
    let turns = dir.quarter_turns();
    let values = rotate_cw_n(board.rows(), turns);
    let coords = rotate_cw_n(&coord_grid(), turns);

    let mut slid: TileGrid = [[None; SIZE]; SIZE];
    let mut score_delta = 0;
    for r in 0..SIZE {
        let collapsed = collapse_left(&values[r]);
        score_delta += collapsed.score;
        for (c, source) in collapsed.sources.iter().enumerate() {
            let origin = match *source {
                Source::Empty => continue,
                Source::Moved(i) => Origin::Moved(coords[r][i]),
                Source::Merged(a, b) => Origin::Merged(coords[r][a], coords[r][b]),
            };
            slid[r][c] = Some(Tile { value: collapsed.cells[c], row: 0, col: 0, origin });
        }
    }

    let mut tiles = rotate_cw_n(&slid, 4 - turns);
    let mut grid = [[0u32; SIZE]; SIZE];
    for (r, row) in tiles.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            if let Some(tile) = cell {
                tile.row = r;
                tile.col = c;
                grid[r][c] = tile.value;
            }
        }
    }
    let moved = Board::from_grid(grid);
    (MoveResult { board: moved, score_delta, changed: moved != board }, tiles)
}

/// Record a spawned tile in an annotated grid.
pub fn mark_spawn(tiles: &mut TileGrid, at: Coord, value: u32) {
    debug_assert!(tiles[at.row][at.col].is_none(), "spawn onto occupied cell {at:?}");
    tiles[at.row][at.col] = Some(Tile { value, row: at.row, col: at.col, origin: Origin::Spawned });
}
