use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::engine::{apply_move, Board, Move};

use super::{BranchEval, SearchConfig, SearchEvaluator, SearchStats, SnakeHeuristic, TieBreak, FALLBACK_MOVE, LOSS_SCORE};

/// Chance-node weights for the two spawn values.
const SPAWN_OUTCOMES: [(u32, f64); 2] = [(2, 0.9), (4, 0.1)];

/// Single-threaded, exhaustive Expectimax search.
///
/// Methods take `&mut self` only to record [`SearchStats`]; the search itself
/// keeps no state between calls.
pub struct Expectimax<E = SnakeHeuristic> {
    cfg: SearchConfig,
    evaluator: E,
    stats: SearchStats,
}

impl Expectimax<SnakeHeuristic> {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self::with_evaluator(cfg, SnakeHeuristic) }
}

impl Default for Expectimax<SnakeHeuristic> {
    fn default() -> Self { Self::new() }
}

impl<E: SearchEvaluator> Expectimax<E> {
    /// Search with a custom leaf evaluator.
    pub fn with_evaluator(cfg: SearchConfig, evaluator: E) -> Self {
        Self { cfg, evaluator, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Depth the adaptive policy picks for `board`.
    #[inline]
    pub fn depth_for(&self, board: Board) -> u32 { self.cfg.depth_for(board) }

    /// Compute the best move, or `None` if no direction changes the board.
    /// Ties go to the first direction in `Move::ALL` order.
    ///
    /// Example
    /// ```
    /// use autoplay_2048::engine::{new_board, Board};
    /// use autoplay_2048::expectimax::Expectimax;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = new_board(&mut rng);
    /// let mut ex = Expectimax::new();
    /// assert!(ex.best_move(b).is_some());
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        select(&branches, TieBreak::InputOrder, None)
    }

    /// Like [`Self::best_move`], honoring the configured [`TieBreak`] with `rng`.
    pub fn best_move_with_rng(&mut self, board: Board, rng: &mut dyn RngCore) -> Option<Move> {
        let branches = self.branch_evals(board);
        select(&branches, self.cfg.tie_break, Some(rng))
    }

    /// Always returns a direction. On a board with no legal move (the caller
    /// should have checked for a terminal state) this is [`FALLBACK_MOVE`].
    pub fn choose_move(&mut self, board: Board) -> Move {
        let choice = self.best_move(board);
        self.finish(board, choice)
    }

    /// [`Self::choose_move`] with the configured tie-break policy.
    pub fn choose_move_with_rng(&mut self, board: Board, rng: &mut dyn RngCore) -> Move {
        let choice = self.best_move_with_rng(board, rng);
        self.finish(board, choice)
    }

    fn finish(&self, board: Board, choice: Option<Move>) -> Move {
        match choice {
            Some(dir) => {
                debug!("depth {} chose {} after {} nodes", self.stats.depth, dir, self.stats.nodes);
                dir
            }
            None => {
                warn!("no legal move on {:?}; falling back to {}", board, FALLBACK_MOVE);
                FALLBACK_MOVE
            }
        }
    }

    /// Expected value for each direction at the adaptive depth.
    ///
    /// Returns a fixed array in `Move::ALL` order and marks no-op moves as
    /// `legal = false` with `ev = LOSS_SCORE`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = self.depth_for(board);
        self.branch_evals_at_depth(board, depth)
    }

    /// Expected value for each direction with an explicit depth.
    pub fn branch_evals_at_depth(&mut self, board: Board, depth: u32) -> [BranchEval; 4] {
        let mut state_count = 0u64;
        let out = Move::ALL.map(|dir| {
            let res = apply_move(board, dir);
            if res.changed {
                let ev = self.evaluate_chance(res.board, depth, &mut state_count);
                BranchEval { dir, ev, legal: true }
            } else {
                BranchEval { dir, ev: LOSS_SCORE, legal: false }
            }
        });
        self.record(state_count, depth);
        out
    }

    /// Root value at the adaptive depth: the best branch EV, or
    /// [`LOSS_SCORE`] if nothing is legal.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let depth = self.depth_for(board);
        self.state_value_at_depth(board, depth)
    }

    pub fn state_value_at_depth(&mut self, board: Board, depth: u32) -> f64 {
        self.branch_evals_at_depth(board, depth)
            .iter()
            .filter(|b| b.legal)
            .map(|b| b.ev)
            .fold(LOSS_SCORE, f64::max)
    }

    /// Statistics from the last search.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    fn record(&mut self, nodes: u64, depth: u32) {
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
        self.stats.depth = depth;
    }

    fn evaluate_max(&self, board: Board, depth: u32, state_count: &mut u64) -> f64 {
        *state_count += 1;
        if depth == 0 {
            return self.evaluator.evaluate(board);
        }
        let mut best = None;
        for dir in Move::ALL {
            let res = apply_move(board, dir);
            if res.changed {
                let score = self.evaluate_chance(res.board, depth - 1, state_count);
                best = Some(best.map_or(score, |b: f64| b.max(score)));
            }
        }
        best.unwrap_or(LOSS_SCORE)
    }

    fn evaluate_chance(&self, board: Board, depth: u32, state_count: &mut u64) -> f64 {
        *state_count += 1;
        if depth == 0 {
            return self.evaluator.evaluate(board);
        }
        let num_empty = board.count_empty();
        if num_empty == 0 {
            return self.evaluator.evaluate(board);
        }
        let mut score = 0.0;
        for (r, c) in board.empty_cells() {
            for (value, prob) in SPAWN_OUTCOMES {
                score += prob * self.evaluate_max(board.with_tile(r, c, value), depth - 1, state_count);
            }
        }
        score / num_empty as f64
    }
}

/// Pick the legal branch with the highest EV under `policy`.
fn select(branches: &[BranchEval; 4], policy: TieBreak, rng: Option<&mut dyn RngCore>) -> Option<Move> {
    let best = branches.iter().filter(|b| b.legal).map(|b| b.ev).fold(None, |acc: Option<f64>, ev| {
        Some(acc.map_or(ev, |a| a.max(ev)))
    })?;
    let tied: Vec<Move> = branches.iter().filter(|b| b.legal && b.ev == best).map(|b| b.dir).collect();
    match (policy, rng) {
        (TieBreak::Random, Some(rng)) => tied.choose(rng).copied(),
        _ => tied.first().copied(),
    }
}
