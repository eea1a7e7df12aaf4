use std::fmt;

use rand::Rng;

use super::transform::{Grid, SIZE};
use super::{Move, MoveResult};

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// Largest tile a board may hold. Two of them do not merge, so every merge
/// result fits in a `u32`.
pub const MAX_TILE: u32 = 1 << 30;

/// Rejected board input. Boards are validated once at the boundary; every
/// operation after that assumes a well-formed grid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("expected 4 rows, found {found}")]
    RowCount { found: usize },
    #[error("row {row}: expected 4 cells, found {found}")]
    RowLength { row: usize, found: usize },
    #[error("cell ({row}, {col}) holds {value}, which is not a power of two in 2..=2^30")]
    Value { row: usize, col: usize, value: u32 },
    #[error("cell {index}: exponent {exponent} out of range")]
    Exponent { index: usize, exponent: u8 },
    #[error("cell ({row}, {col}): cannot parse {text:?} as a tile value")]
    Text { row: usize, col: usize, text: String },
}

/// A 4x4 2048 board. Each cell holds a tile value (2, 4, 8, ...) or 0 when empty.
///
/// `Board` is `Copy` and every method returns a new board; nothing mutates in place.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(Grid<u32>);

#[inline]
fn is_tile_value(value: u32) -> bool { value == 0 || (value >= 2 && value <= MAX_TILE && value.is_power_of_two()) }

impl Board {
    /// A constant empty board.
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from row-major values, rejecting anything that is not empty (0)
    /// or a power of two >= 2.
    ///
    /// ```
    /// use autoplay_2048::engine::Board;
    /// let b = Board::from_rows([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(b.count_empty(), 14);
    /// assert!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_rows(rows: Grid<u32>) -> Result<Self, BoardError> {
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if !is_tile_value(value) {
                    return Err(BoardError::Value { row, col, value });
                }
            }
        }
        Ok(Board(rows))
    }

    /// Wrap a grid produced by engine internals.
    #[inline]
    pub(crate) fn from_grid(grid: Grid<u32>) -> Self {
        debug_assert!(grid.iter().flatten().all(|&v| is_tile_value(v)), "malformed grid {grid:?}");
        Board(grid)
    }

    /// Borrow the rows of this board.
    #[inline]
    pub fn rows(&self) -> &Grid<u32> { &self.0 }

    /// Value at `(row, col)`; 0 when empty.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 { self.0[row][col] }

    /// Slide/merge tiles in `dir` without spawning. See [`super::apply_move`].
    #[inline]
    pub fn apply_move(self, dir: Move) -> MoveResult { super::apply_move(self, dir) }

    /// Return the board after sliding/merging in `dir` (no random insert).
    #[inline]
    pub fn shift(self, dir: Move) -> Self { super::apply_move(self, dir).board }

    /// Insert a random 2 (90%) or 4 (10%) into a random empty cell. No-op on a full board.
    ///
    /// ```
    /// use autoplay_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self { super::spawn_random_tile(self, rng) }

    /// Place `value` into the empty cell `(row, col)`.
    #[inline]
    pub fn with_tile(self, row: usize, col: usize, value: u32) -> Self {
        debug_assert_eq!(self.0[row][col], 0, "cell ({row}, {col}) is occupied");
        debug_assert!(value != 0 && is_tile_value(value));
        let mut grid = self.0;
        grid[row][col] = value;
        Board(grid)
    }

    /// True when no direction can change the board.
    #[inline]
    pub fn is_terminal(self) -> bool { super::is_terminal(self) }

    /// Count the empty cells.
    #[inline]
    pub fn count_empty(self) -> usize { self.0.iter().flatten().filter(|&&v| v == 0).count() }

    /// Coordinates of empty cells in row-major order.
    pub fn empty_cells(self) -> impl Iterator<Item = (usize, usize)> {
        (0..CELLS).map(|i| (i / SIZE, i % SIZE)).filter(move |&(r, c)| self.0[r][c] == 0)
    }

    /// Highest tile value on the board (0 for an empty board).
    #[inline]
    pub fn highest_tile(self) -> u32 { self.0.iter().flatten().copied().max().unwrap_or(0) }

    /// Sum of all tile values.
    #[inline]
    pub fn tile_sum(self) -> u64 { self.0.iter().flatten().map(|&v| u64::from(v)).sum() }

    /// Log2 exponent per cell in row-major order (0 for empty).
    pub fn to_exponents(self) -> [u8; CELLS] {
        let mut out = [0u8; CELLS];
        for (slot, &value) in out.iter_mut().zip(self.0.iter().flatten()) {
            *slot = if value == 0 { 0 } else { value.trailing_zeros() as u8 };
        }
        out
    }

    /// Inverse of [`Board::to_exponents`].
    pub fn from_exponents(exps: [u8; CELLS]) -> Result<Self, BoardError> {
        let mut grid = [[0u32; SIZE]; SIZE];
        for (index, &exponent) in exps.iter().enumerate() {
            if u32::from(exponent) > MAX_TILE.trailing_zeros() {
                return Err(BoardError::Exponent { index, exponent });
            }
            if exponent != 0 {
                grid[index / SIZE][index % SIZE] = 1 << exponent;
            }
        }
        Ok(Board(grid))
    }

    /// Textual snapshot for the advisory collaborator: rows of tab-separated
    /// integers, 0 for empty, rows joined by `\n`.
    ///
    /// ```
    /// use autoplay_2048::engine::Board;
    /// let b = Board::from_rows([[2, 0, 0, 4], [0; 4], [0; 4], [0, 0, 0, 2048]]).unwrap();
    /// assert_eq!(b.to_advisory_text(), "2\t0\t0\t4\n0\t0\t0\t0\n0\t0\t0\t0\n0\t0\t0\t2048");
    /// ```
    pub fn to_advisory_text(self) -> String {
        self.0
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse the format produced by [`Board::to_advisory_text`]. Any whitespace
    /// separates cells; blank lines are ignored.
    pub fn from_advisory_text(text: &str) -> Result<Self, BoardError> {
        let rows: Vec<Vec<u32>> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.split_whitespace()
                    .enumerate()
                    .map(|(col, cell)| {
                        cell.parse::<u32>().map_err(|_| BoardError::Text { row, col, text: cell.to_string() })
                    })
                    .collect::<Result<Vec<u32>, BoardError>>()
            })
            .collect::<Result<_, _>>()?;
        Board::try_from(rows)
    }
}

impl TryFrom<Vec<Vec<u32>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<u32>>) -> Result<Self, Self::Error> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount { found: rows.len() });
        }
        let mut grid = [[0u32; SIZE]; SIZE];
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != SIZE {
                return Err(BoardError::RowLength { row, found: cells.len() });
            }
            grid[row].copy_from_slice(cells);
        }
        Board::from_rows(grid)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for (r, row) in self.0.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
            if r + 1 < SIZE {
                writeln!(f, "{}", "-".repeat(32))?;
            }
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => " ".repeat(7),
        x => format!("{:^7}", x),
    }
}
