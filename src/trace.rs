//! Binary record of one autoplay session.
//!
//! Layout (all integers little-endian):
//!
//! | field          | bytes                      |
//! |----------------|----------------------------|
//! | magic `A2T2`   | 4                          |
//! | version        | 1                          |
//! | seed           | 8                          |
//! | steps          | 4                          |
//! | start_unix_s   | 8                          |
//! | elapsed_s      | 4 (f32 bits)               |
//! | final_score    | 8                          |
//! | highest_tile   | 4                          |
//! | engine_len     | 2                          |
//! | engine_str     | engine_len (UTF-8)         |
//! | states         | (steps + 1) * 16 exponents |
//! | moves          | steps                      |
//! | crc32c         | 4, over everything above   |

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{apply_move, Board, BoardError, Move, CELLS};

const MAGIC: &[u8; 4] = b"A2T2";
const VERSION: u8 = 2;
const HEADER_LEN: usize = 4 + 1 + 8 + 4 + 8 + 4 + 8 + 4 + 2;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Seed of the `StdRng` that drove spawns and tie-breaks.
    pub seed: u64,
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub final_score: u64,
    pub highest_tile: u32,
    pub engine_str: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub meta: Meta,
    pub states: Vec<Board>, // length = steps + 1
    pub moves: Vec<Move>,   // length = steps
}

/// Why a recorded transition does not replay.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayFault {
    #[error("move {0} does not change the board")]
    IllegalMove(Move),
    #[error("next state is not the moved board plus one spawned 2 or 4")]
    BadSpawn,
    #[error("first state is not an opening: two 2 or 4 tiles on an empty board")]
    InvalidStart,
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("{states} states and {moves} moves do not match {steps} steps")]
    Length { steps: u32, states: usize, moves: usize },
    #[error("engine string is {0} bytes, longer than a u16 length")]
    EngineTooLong(usize),
    #[error("bad board: {0}")]
    Board(#[from] BoardError),
    #[error("invalid move byte {0}")]
    InvalidMove(u8),
    #[error("step {step}: {fault}")]
    Replay { step: usize, fault: ReplayFault },
    #[error("recorded final score {recorded} but replay gives {replayed}")]
    ScoreMismatch { recorded: u64, replayed: u64 },
    #[error("recorded highest tile {recorded} but final board has {actual}")]
    TileMismatch { recorded: u32, actual: u32 },
}

/// Little-endian cursor over the checksummed content.
struct Reader<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TraceError> {
        let end = self.off.checked_add(n).ok_or(TraceError::Malformed)?;
        let out = self.bytes.get(self.off..end).ok_or(TraceError::Malformed)?;
        self.off = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TraceError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, TraceError> { Ok(self.array::<1>()?[0]) }
    fn u16(&mut self) -> Result<u16, TraceError> { Ok(u16::from_le_bytes(self.array()?)) }
    fn u32(&mut self) -> Result<u32, TraceError> { Ok(u32::from_le_bytes(self.array()?)) }
    fn u64(&mut self) -> Result<u64, TraceError> { Ok(u64::from_le_bytes(self.array()?)) }
    fn f32(&mut self) -> Result<f32, TraceError> { self.u32().map(f32::from_bits) }
}

pub fn encode_run(meta: &Meta, states: &[Board], moves: &[Move]) -> Result<Vec<u8>, TraceError> {
    let steps = meta.steps as usize;
    if states.len() != steps + 1 || moves.len() != steps {
        return Err(TraceError::Length { steps: meta.steps, states: states.len(), moves: moves.len() });
    }
    let engine_bytes = meta.engine_str.as_deref().map(str::as_bytes).unwrap_or(&[]);
    let engine_len = u16::try_from(engine_bytes.len()).map_err(|_| TraceError::EngineTooLong(engine_bytes.len()))?;

    let payload_len = engine_bytes.len() + states.len() * CELLS + moves.len();
    let mut buf = Vec::with_capacity(HEADER_LEN + payload_len + CHECKSUM_LEN);

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&meta.seed.to_le_bytes());
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.final_score.to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());
    buf.extend_from_slice(&engine_len.to_le_bytes());
    buf.extend_from_slice(engine_bytes);

    for b in states {
        buf.extend_from_slice(&b.to_exponents());
    }
    buf.extend(moves.iter().map(|m| m.to_u8()));

    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn write_run_to_path<P: AsRef<Path>>(path: P, run: &Run) -> Result<(), TraceError> {
    let data = encode_run(&run.meta, &run.states, &run.moves)?;
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }

    // Checksum first so corrupted fields never reach the decoder.
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let mut crc = [0u8; CHECKSUM_LEN];
    crc.copy_from_slice(trailer);
    if u32::from_le_bytes(crc) != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }

    let mut r = Reader { bytes: content, off: 0 };
    if r.take(4)? != MAGIC || r.u8()? != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    let seed = r.u64()?;
    let steps = r.u32()?;
    let start_unix_s = r.u64()?;
    let elapsed_s = r.f32()?;
    let final_score = r.u64()?;
    let highest_tile = r.u32()?;
    let engine_len = r.u16()? as usize;
    let engine_bytes = r.take(engine_len)?;
    let engine_str = if engine_len > 0 { std::str::from_utf8(engine_bytes).ok().map(str::to_owned) } else { None };

    let states_count = (steps as usize).checked_add(1).ok_or(TraceError::Malformed)?;
    let expected_rest = states_count.checked_mul(CELLS).and_then(|n| n.checked_add(steps as usize)).ok_or(TraceError::Malformed)?;
    if content.len() - r.off != expected_rest {
        return Err(TraceError::Malformed);
    }

    let mut states = Vec::with_capacity(states_count);
    for _ in 0..states_count {
        states.push(Board::from_exponents(r.array::<CELLS>()?)?);
    }
    let moves = r
        .take(steps as usize)?
        .iter()
        .map(|&b| Move::from_u8(b).ok_or(TraceError::InvalidMove(b)))
        .collect::<Result<Vec<_>, _>>()?;

    let meta = Meta { seed, steps, start_unix_s, elapsed_s, final_score, highest_tile, engine_str };
    Ok(Run { meta, states, moves })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

/// Replay every transition of `run`.
///
/// The first state must be an opening: exactly two tiles, each a 2 or a 4.
/// Each later state must be the previous one with the recorded move applied plus
/// exactly one spawned 2 or 4 in a cell the move left empty. The replayed
/// score and final highest tile must match the header. Returns the replayed
/// score.
pub fn verify_run(run: &Run) -> Result<u64, TraceError> {
    let steps = run.meta.steps as usize;
    if run.states.len() != steps + 1 || run.moves.len() != steps {
        return Err(TraceError::Length { steps: run.meta.steps, states: run.states.len(), moves: run.moves.len() });
    }
    if !run.states.first().is_some_and(|&b| is_opening(b)) {
        return Err(TraceError::Replay { step: 0, fault: ReplayFault::InvalidStart });
    }

    let mut score = 0u64;
    for (step, (pair, &dir)) in run.states.windows(2).zip(&run.moves).enumerate() {
        let res = apply_move(pair[0], dir);
        if !res.changed {
            return Err(TraceError::Replay { step, fault: ReplayFault::IllegalMove(dir) });
        }
        if !is_single_spawn(res.board, pair[1]) {
            return Err(TraceError::Replay { step, fault: ReplayFault::BadSpawn });
        }
        score += res.score_delta;
    }

    if score != run.meta.final_score {
        return Err(TraceError::ScoreMismatch { recorded: run.meta.final_score, replayed: score });
    }
    let actual = run.states.last().map_or(0, |b| b.highest_tile());
    if actual != run.meta.highest_tile {
        return Err(TraceError::TileMismatch { recorded: run.meta.highest_tile, actual });
    }
    Ok(score)
}

fn is_opening(board: Board) -> bool {
    let tiles: Vec<u32> = board.rows().iter().flatten().copied().filter(|&v| v != 0).collect();
    tiles.len() == 2 && tiles.iter().all(|&v| v == 2 || v == 4)
}

fn is_single_spawn(moved: Board, next: Board) -> bool {
    let mut spawns = 0;
    for (a, b) in moved.rows().iter().flatten().zip(next.rows().iter().flatten()) {
        if a == b {
            continue;
        }
        if *a != 0 || !matches!(*b, 2 | 4) {
            return false;
        }
        spawns += 1;
    }
    spawns == 1
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
