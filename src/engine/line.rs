use super::state::MAX_TILE;
use super::transform::SIZE;

/// Where a cell of a collapsed line came from, as indices into the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Source {
    #[default]
    Empty,
    Moved(usize),
    Merged(usize, usize),
}

/// A line after sliding toward index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Collapsed {
    pub cells: [u32; SIZE],
    pub sources: [Source; SIZE],
    pub score: u64,
}

/// Slide a line toward index 0: drop the gaps, then merge each adjacent equal
/// pair once, scanning from index 0. A merged cell is never merged again, and
/// two [`MAX_TILE`] tiles stay apart.
pub(crate) fn collapse_left(line: &[u32; SIZE]) -> Collapsed {
    let mut packed = [(0u32, 0usize); SIZE];
    let mut len = 0;
    for (idx, &value) in line.iter().enumerate() {
        if value != 0 {
            packed[len] = (value, idx);
            len += 1;
        }
    }

    let mut out = Collapsed { cells: [0; SIZE], sources: [Source::Empty; SIZE], score: 0 };
    let (mut read, mut write) = (0, 0);
    while read < len {
        let (value, from) = packed[read];
        if read + 1 < len && packed[read + 1].0 == value && value < MAX_TILE {
            let merged = value * 2;
            out.cells[write] = merged;
            out.sources[write] = Source::Merged(from, packed[read + 1].1);
            out.score += u64::from(merged);
            read += 2;
        } else {
            out.cells[write] = value;
            out.sources[write] = Source::Moved(from);
            read += 1;
        }
        write += 1;
    }
    out
}
