//! Game session snapshots: board, score, best score and the terminal flag.

use rand::Rng;

use super::state::Board;
use super::tiles::{self, Coord, TileGrid};
use super::{new_board, pick_spawn, Move, MoveResult};

/// Tile value that counts as a win. Play continues past it.
pub const WIN_TILE: u32 = 2048;

/// Persistence boundary for the best-score high-water mark. The storage
/// mechanism belongs to the implementor.
pub trait BestScoreStore {
    fn load(&self) -> u64;
    fn store(&mut self, best: u64);
}

/// Process-local best score, for tests and headless runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InMemoryBestScore(pub u64);

impl BestScoreStore for InMemoryBestScore {
    fn load(&self) -> u64 { self.0 }
    fn store(&mut self, best: u64) { self.0 = best; }
}

/// An immutable game snapshot. [`Game::play`] returns a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    board: Board,
    score: u64,
    best_score: u64,
    terminal: bool,
}

/// What happened on one move command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// False when the move changed nothing (or the game was already over);
    /// nothing was scored or spawned.
    pub accepted: bool,
    /// The slide/merge result, before the spawn.
    pub outcome: MoveResult,
    /// The spawned cell and value, if any.
    pub spawned: Option<(Coord, u32)>,
    /// Presentation annotations for the final board.
    pub tiles: TileGrid,
}

impl Game {
    /// Start a session: two random tiles on an empty board.
    ///
    /// ```
    /// use autoplay_2048::engine::{Game, Move};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let game = Game::new(&mut rng, 0);
    /// assert_eq!(game.board().count_empty(), 14);
    /// assert_eq!(game.score(), 0);
    /// ```
    pub fn new<R: Rng + ?Sized>(rng: &mut R, best_score: u64) -> Self {
        Self::from_board(new_board(rng), 0, best_score)
    }

    /// Resume from an existing board and score.
    pub fn from_board(board: Board, score: u64, best_score: u64) -> Self {
        Game { board, score, best_score: best_score.max(score), terminal: board.is_terminal() }
    }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    pub fn best_score(&self) -> u64 { self.best_score }

    #[inline]
    pub fn is_terminal(&self) -> bool { self.terminal }

    /// True once a [`WIN_TILE`] has been made.
    #[inline]
    pub fn won(&self) -> bool { self.board.highest_tile() >= WIN_TILE }

    /// Apply a move command. A move that changes nothing is rejected: the
    /// returned snapshot equals `self`, no score, no spawn.
    pub fn play<R: Rng + ?Sized>(&self, dir: Move, rng: &mut R) -> (Game, Transition) {
        let (outcome, mut tiles) = tiles::apply_move_traced(self.board, dir);
        if self.terminal || !outcome.changed {
            let rejected = MoveResult { board: self.board, score_delta: 0, changed: false };
            return (*self, Transition { accepted: false, outcome: rejected, spawned: None, tiles: tiles::annotate(self.board) });
        }

        let spawned = pick_spawn(outcome.board, rng);
        let board = match spawned {
            Some((at, value)) => {
                tiles::mark_spawn(&mut tiles, at, value);
                outcome.board.with_tile(at.row, at.col, value)
            }
            None => outcome.board,
        };
        let score = self.score + outcome.score_delta;
        let next = Game { board, score, best_score: self.best_score.max(score), terminal: board.is_terminal() };
        (next, Transition { accepted: true, outcome, spawned, tiles })
    }

    /// Push the best score to `store` if it beats what the store holds.
    /// Returns true when the store was updated.
    pub fn record_best<S: BestScoreStore + ?Sized>(&self, store: &mut S) -> bool {
        if self.best_score > store.load() {
            store.store(self.best_score);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(rows: crate::engine::Grid<u32>) -> Board { Board::from_rows(rows).unwrap() }

    #[test]
    fn accepted_move_scores_and_spawns() {
        let mut rng = StdRng::seed_from_u64(11);
        let game = Game::from_board(board([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]), 0, 10);
        let (next, tr) = game.play(Move::Left, &mut rng);
        assert!(tr.accepted);
        assert_eq!(tr.outcome.score_delta, 4);
        assert_eq!(next.score(), 4);
        assert_eq!(next.best_score(), 10);
        assert_eq!(next.board().count_empty(), 14);
        let (at, value) = tr.spawned.unwrap();
        assert_eq!(next.board().get(at.row, at.col), value);
        assert!(tr.tiles[at.row][at.col].unwrap().is_new());
        // The snapshot it came from is untouched.
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().rows()[0], [0, 0, 2, 2]);
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(12);
        let game = Game::from_board(board([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]), 8, 8);
        let (next, tr) = game.play(Move::Left, &mut rng);
        assert!(!tr.accepted);
        assert_eq!(next, game);
        assert_eq!(tr.spawned, None);
        assert_eq!(tr.outcome.score_delta, 0);
    }

    #[test]
    fn best_score_is_a_high_water_mark() {
        let mut rng = StdRng::seed_from_u64(13);
        let game = Game::from_board(board([[4, 4, 0, 0], [0; 4], [0; 4], [0; 4]]), 0, 2);
        let (next, _) = game.play(Move::Right, &mut rng);
        assert_eq!(next.score(), 8);
        assert_eq!(next.best_score(), 8);

        let mut store = InMemoryBestScore(100);
        assert!(!next.record_best(&mut store));
        assert_eq!(store.load(), 100);
        let mut store = InMemoryBestScore(3);
        assert!(next.record_best(&mut store));
        assert_eq!(store.load(), 8);
    }

    #[test]
    fn terminal_game_rejects_moves() {
        let mut rng = StdRng::seed_from_u64(14);
        let game = Game::from_board(board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]), 50, 60);
        assert!(game.is_terminal());
        for dir in Move::ALL {
            let (next, tr) = game.play(dir, &mut rng);
            assert!(!tr.accepted);
            assert_eq!(next, game);
        }
    }

    #[test]
    fn last_merge_into_full_board_sets_terminal() {
        let mut rng = StdRng::seed_from_u64(15);
        // Sliding Left frees exactly one cell; the spawn refills it.
        let b = board([[2, 2, 8, 16], [32, 64, 128, 256], [512, 1024, 2, 4], [8, 16, 32, 64]]);
        let game = Game::from_board(b, 0, 0);
        let (next, tr) = game.play(Move::Left, &mut rng);
        assert!(tr.accepted);
        assert_eq!(next.board().count_empty(), 0);
        assert_eq!(next.is_terminal(), next.board().is_terminal());
    }

    #[test]
    fn score_never_decreases_over_a_random_session() {
        let mut rng = StdRng::seed_from_u64(16);
        let mut game = Game::new(&mut rng, 0);
        for i in 0..200 {
            if game.is_terminal() {
                break;
            }
            let (next, tr) = game.play(Move::ALL[i % 4], &mut rng);
            assert!(next.score() >= game.score());
            assert_eq!(next.score(), game.score() + tr.outcome.score_delta * u64::from(tr.accepted));
            game = next;
        }
    }

    #[test]
    fn won_after_reaching_2048() {
        let game = Game::from_board(board([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]), 0, 0);
        assert!(!game.won());
        let mut rng = StdRng::seed_from_u64(17);
        let (next, _) = game.play(Move::Left, &mut rng);
        assert!(next.won());
    }
}
