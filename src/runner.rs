//! Headless autoplay: one seeded game from the opening to a stop condition.

use std::time::Instant;

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::engine::{BestScoreStore, Game, Move};
use crate::expectimax::{Expectimax, SearchConfig, SearchStats};
use crate::trace::{self, Meta, Run};

/// Optional early stops. A game always stops once it is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    pub max_moves: Option<u64>,
    pub stop_tile: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GameReport {
    pub game: Game,
    pub moves: u64,
    pub run: Run,
    pub stats: SearchStats,
}

impl GameReport {
    #[inline]
    pub fn highest_tile(&self) -> u32 { self.game.board().highest_tile() }
}

pub fn engine_string() -> String {
    format!("autoplay-2048/{} expectimax", env!("CARGO_PKG_VERSION"))
}

/// Play one game with a `StdRng` seeded from `seed`. Spawns and random
/// tie-breaks share that RNG, so everything except the timing fields of the
/// trace is a function of `seed`, `cfg` and `limits`.
///
/// ```
/// use autoplay_2048::expectimax::SearchConfig;
/// use autoplay_2048::runner::{run_game, RunLimits};
/// use autoplay_2048::trace::verify_run;
///
/// let cfg = SearchConfig { depth_cap: Some(1), ..Default::default() };
/// let limits = RunLimits { max_moves: Some(20), ..Default::default() };
/// let report = run_game(7, &cfg, limits);
/// assert_eq!(report.moves, 20);
/// assert_eq!(verify_run(&report.run).unwrap(), report.game.score());
/// ```
pub fn run_game(seed: u64, cfg: &SearchConfig, limits: RunLimits) -> GameReport {
    run_game_observed(seed, cfg, limits, |_, _| {})
}

/// [`run_game`], calling `on_move` with each accepted move and the snapshot it produced.
pub fn run_game_observed<F: FnMut(Move, &Game)>(
    seed: u64,
    cfg: &SearchConfig,
    limits: RunLimits,
    mut on_move: F,
) -> GameReport {
    let start = Instant::now();
    let start_wall = trace::now_unix_seconds();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut search = Expectimax::with_config(cfg.clone());
    let mut game = Game::new(&mut rng, 0);

    let mut states = Vec::with_capacity(1024);
    let mut moves: Vec<Move> = Vec::with_capacity(1024);
    states.push(game.board());

    while !game.is_terminal() {
        if limits.max_moves.is_some_and(|limit| moves.len() as u64 >= limit) {
            break;
        }
        if limits.stop_tile.is_some_and(|tile| game.board().highest_tile() >= tile) {
            break;
        }
        let dir = search.choose_move_with_rng(game.board(), &mut rng);
        let (next, transition) = game.play(dir, &mut rng);
        if !transition.accepted {
            break;
        }
        game = next;
        moves.push(dir);
        states.push(game.board());
        on_move(dir, &game);
    }

    let stats = search.last_stats();
    debug!("seed {seed}: peak {} nodes per move", stats.peak_nodes);
    info!("seed {seed}: {} moves, score {}, highest tile {}", moves.len(), game.score(), game.board().highest_tile());

    let meta = Meta {
        seed,
        steps: moves.len() as u32,
        start_unix_s: start_wall,
        elapsed_s: start.elapsed().as_secs_f32(),
        final_score: game.score(),
        highest_tile: game.board().highest_tile(),
        engine_str: Some(engine_string()),
    };
    GameReport { game, moves: moves.len() as u64, run: Run { meta, states, moves }, stats }
}

/// [`run_game`], then push the best score to `store`.
pub fn run_game_with_store<S: BestScoreStore + ?Sized>(
    seed: u64,
    cfg: &SearchConfig,
    limits: RunLimits,
    store: &mut S,
) -> GameReport {
    let report = run_game(seed, cfg, limits);
    let best = Game::from_board(report.game.board(), report.game.score(), store.load());
    if best.record_best(store) {
        info!("new best score {}", best.best_score());
    }
    GameReport { game: best, ..report }
}
