//! autoplay-2048: a 2048 board simulator and an Expectimax autoplayer
//!
//! This crate provides:
//! - A `Board` type with pure move, merge, spawn and terminal checks (`engine`)
//! - Game sessions with score, best score and tile provenance (`engine::Game`)
//! - An Expectimax policy with an adaptive depth and a snake heuristic (`expectimax`)
//! - A checksummed binary trace format for runs, with replay verification (`trace`)
//! - Seeded headless autoplay (`runner`) and the advisory boundary (`advice`)
//!
//! Quick start:
//! ```
//! use autoplay_2048::engine::{Board, Game, Move};
//! use autoplay_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic session with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let game = Game::new(&mut rng, 0);
//! let mut ai = Expectimax::new();
//! let dir = ai.choose_move(game.board());
//! let (next, transition) = game.play(dir, &mut rng);
//! assert!(transition.accepted);
//! assert!(next.score() >= game.score());
//! ```
pub mod advice;
pub mod engine;
pub mod expectimax;
pub mod runner;
pub mod trace;
