//! Advisory boundary: a board snapshot in, free-form text out.
//!
//! The game never depends on what an advisor says. [`request_advice`] turns
//! every failure into [`FALLBACK_ADVICE`] so callers can display the result
//! unconditionally.

use log::warn;

use crate::engine::{apply_move, Board, BoardError, Move};
use crate::expectimax::{Expectimax, SearchConfig};

/// Shown whenever an advisor fails or says nothing.
pub const FALLBACK_ADVICE: &str = "Advice is unavailable right now. This does not affect the game.";

#[derive(thiserror::Error, Debug)]
pub enum AdvisorError {
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot is not a board: {0}")]
    BadSnapshot(#[from] BoardError),
}

/// Takes the text from [`Board::to_advisory_text`] and answers in prose.
pub trait Advisor {
    fn advise(&self, snapshot: &str) -> Result<String, AdvisorError>;
}

/// Ask `advisor` about `board`. Errors and blank answers degrade to
/// [`FALLBACK_ADVICE`].
///
/// ```
/// use autoplay_2048::advice::{request_advice, OfflineAdvisor, FALLBACK_ADVICE};
/// use autoplay_2048::engine::Board;
/// assert_eq!(request_advice(&OfflineAdvisor, Board::EMPTY), FALLBACK_ADVICE);
/// ```
pub fn request_advice<A: Advisor + ?Sized>(advisor: &A, board: Board) -> String {
    match advisor.advise(&board.to_advisory_text()) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("advisor returned an empty answer");
            FALLBACK_ADVICE.to_string()
        }
        Err(e) => {
            warn!("advisor failed: {e}");
            FALLBACK_ADVICE.to_string()
        }
    }
}

/// Answers from the local search, in the `Move: ...` / `Reason: ...` shape.
#[derive(Debug, Clone, Default)]
pub struct LocalAdvisor {
    pub config: SearchConfig,
}

impl LocalAdvisor {
    pub fn new(config: SearchConfig) -> Self { Self { config } }
}

impl Advisor for LocalAdvisor {
    fn advise(&self, snapshot: &str) -> Result<String, AdvisorError> {
        let board = Board::from_advisory_text(snapshot)?;
        let mut search = Expectimax::with_config(self.config.clone());
        let Some(dir) = search.best_move(board) else {
            return Ok("Move: none\nReason: No direction changes the board. The game is over.".to_string());
        };
        Ok(format!("Move: {dir}\nReason: {}", reason(board, dir)))
    }
}

fn reason(board: Board, dir: Move) -> String {
    let res = apply_move(board, dir);
    let top = res.board.highest_tile();
    let corners = [(0, 0), (0, 3), (3, 0), (3, 3)];
    let anchored = |b: Board| corners.iter().any(|&(r, c)| b.get(r, c) == top);
    let mut parts = Vec::new();
    if res.score_delta > 0 {
        parts.push(format!("It merges for {} points", res.score_delta));
    } else {
        parts.push("It sets up the next merges".to_string());
    }
    if anchored(res.board) {
        parts.push(format!("keeps the {top} tile in a corner"));
    }
    format!("{}.", parts.join(" and "))
}

/// An advisor that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn advise(&self, _snapshot: &str) -> Result<String, AdvisorError> {
        Err(AdvisorError::Unavailable("offline".to_string()))
    }
}
