use std::path::PathBuf;

use anyhow::Context;
use autoplay_2048::advice::{request_advice, LocalAdvisor};
use autoplay_2048::expectimax::SearchConfig;
use autoplay_2048::runner::{run_game_observed, RunLimits};
use autoplay_2048::trace;
use clap::{Parser, Subcommand};
use log::info;

#[derive(Debug, Parser)]
#[command(name = "autoplay-2048", about = "2048 autoplayer driven by expectimax search")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play one game, printing the board after every move
    Play {
        /// RNG seed for spawns and tie-breaks (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Search config as JSON; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Stop once the highest tile reaches this value
        #[arg(long)]
        stop_tile: Option<u32>,
        /// Write a binary trace of the run to this path
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print only the final board
        #[arg(long)]
        quiet: bool,
        /// Print the advisory snapshot and local advice for the final board
        #[arg(long)]
        advice: bool,
    },
    /// Replay a trace file and check every transition
    Verify { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Args::parse().cmd {
        Cmd::Play { seed, config, steps, stop_tile, out, quiet, advice } => {
            let cfg = match config {
                Some(path) => SearchConfig::from_json_file(&path)
                    .with_context(|| format!("loading search config {}", path.display()))?,
                None => SearchConfig::default(),
            };
            let seed = seed.unwrap_or_else(rand::random);
            info!("seed {seed}");
            let limits = RunLimits { max_moves: steps, stop_tile };
            let report = run_game_observed(seed, &cfg, limits, |dir, game| {
                if !quiet {
                    println!("{dir}\n{}", game.board());
                }
            });

            let board = report.game.board();
            if quiet || report.moves == 0 {
                println!("{board}");
            }
            println!(
                "Moves made: {}, score: {}, highest tile: {}, max states considered for a move: {}",
                report.moves,
                report.game.score(),
                board.highest_tile(),
                report.stats.peak_nodes
            );
            if report.game.won() {
                println!("Reached 2048.");
            }
            if advice {
                println!("{}", board.to_advisory_text());
                println!("{}", request_advice(&LocalAdvisor::new(cfg), board));
            }
            if let Some(path) = out {
                trace::write_run_to_path(&path, &report.run)
                    .with_context(|| format!("writing trace {}", path.display()))?;
                info!("trace written to {}", path.display());
            }
            Ok(())
        }
        Cmd::Verify { path } => {
            let run = trace::parse_run_file(&path).with_context(|| format!("reading {}", path.display()))?;
            let score = trace::verify_run(&run).with_context(|| format!("verifying {}", path.display()))?;
            println!(
                "{}: {} steps, seed {}, score {}, highest tile {}: ok",
                path.display(),
                run.meta.steps,
                run.meta.seed,
                score,
                run.meta.highest_tile
            );
            Ok(())
        }
    }
}
