use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use autoplay_2048::expectimax::SearchConfig;
use autoplay_2048::runner::{run_game, GameReport, RunLimits};
use autoplay_2048::trace;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "parallel", about = "Run independent seeded 2048 games across a rayon pool")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 8)]
    games: u64,

    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads (rayon default if omitted)
    #[arg(long)]
    threads: Option<usize>,

    /// Search config as JSON; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per game: stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Per game: stop once the highest tile reaches this value
    #[arg(long)]
    stop_tile: Option<u32>,

    /// Write one trace per game into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => SearchConfig::from_json_file(path)
            .with_context(|| format!("loading search config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let limits = RunLimits { max_moves: args.steps, stop_tile: args.stop_tile };

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:30}] {pos}/{len} games | {msg}")?
                .progress_chars("=> "),
        );
        pb
    };

    let start = std::time::Instant::now();
    let reports = (0..args.games)
        .into_par_iter()
        .map(|i| -> anyhow::Result<GameReport> {
            let seed = args.seed.wrapping_add(i);
            let report = run_game(seed, &cfg, limits);
            if let Some(dir) = &args.out_dir {
                let path = dir.join(format!("seed-{seed:020}.a2run"));
                trace::write_run_to_path(&path, &report.run)
                    .with_context(|| format!("writing trace {}", path.display()))?;
            }
            pb.set_message(format!("last: seed {seed}, score {}", report.game.score()));
            pb.inc(1);
            Ok(report)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();

    print_summary(&reports, start.elapsed().as_secs_f64());
    Ok(())
}

fn print_summary(reports: &[GameReport], elapsed: f64) {
    if reports.is_empty() {
        println!("No games played.");
        return;
    }
    let scores: Vec<u64> = reports.iter().map(|r| r.game.score()).collect();
    let total_moves: u64 = reports.iter().map(|r| r.moves).sum();
    let mean = scores.iter().sum::<u64>() as f64 / scores.len() as f64;
    let (best_seed, best_score) = reports
        .iter()
        .map(|r| (r.run.meta.seed, r.game.score()))
        .max_by_key(|&(_, s)| s)
        .unwrap_or_default();
    let worst = scores.iter().copied().min().unwrap_or(0);

    println!(
        "Games: {} | moves: {} | moves/sec: {:.1} | elapsed: {:.1}s",
        reports.len(),
        total_moves,
        total_moves as f64 / elapsed.max(1e-6),
        elapsed
    );
    println!("Score: mean {mean:.1} | min {worst} | max {best_score} (seed {best_seed})");

    let mut tiles: BTreeMap<u32, usize> = BTreeMap::new();
    for r in reports {
        *tiles.entry(r.highest_tile()).or_default() += 1;
    }
    println!("Highest tile:");
    for (tile, count) in tiles.iter().rev() {
        println!("{tile:>7} | {count:>5} ({:.1}%)", 100.0 * *count as f64 / reports.len() as f64);
    }
    info!("{} games finished", reports.len());
}
