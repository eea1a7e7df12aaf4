//! Pure square-grid transforms.
//!
//! Every function takes a grid by reference and returns a fresh one, so the same
//! transform can move tile values, coordinates or presentation annotations.

/// Side length of the board.
pub const SIZE: usize = 4;

/// A fixed `SIZE x SIZE` grid, indexed `[row][col]`.
pub type Grid<T> = [[T; SIZE]; SIZE];

/// Rotate a quarter turn clockwise: the left column becomes the top row.
pub fn rotate_cw<T: Copy>(grid: &Grid<T>) -> Grid<T> {
    let mut out = *grid;
    for (r, row) in grid.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            out[c][SIZE - 1 - r] = cell;
        }
    }
    out
}

/// Rotate `turns` quarter turns clockwise (taken modulo 4).
pub fn rotate_cw_n<T: Copy>(grid: &Grid<T>, turns: usize) -> Grid<T> {
    let mut out = *grid;
    for _ in 0..turns % 4 {
        out = rotate_cw(&out);
    }
    out
}

/// Mirror left-to-right (reverse every row).
pub fn mirror<T: Copy>(grid: &Grid<T>) -> Grid<T> {
    let mut out = *grid;
    for row in out.iter_mut() {
        row.reverse();
    }
    out
}

/// All 8 symmetries of the square: the 4 rotations of `grid` followed by the
/// 4 rotations of its mirror. Index 0 is the identity.
pub fn symmetries<T: Copy>(grid: &Grid<T>) -> [Grid<T>; 8] {
    let mut out = [*grid; 8];
    let mut current = *grid;
    let mut mirrored = mirror(grid);
    for i in 0..4 {
        out[i] = current;
        out[i + 4] = mirrored;
        current = rotate_cw(&current);
        mirrored = rotate_cw(&mirrored);
    }
    out
}
