//! Command-line front end for puzzle authors.
//!
//! Deals puzzles headlessly so layouts and difficulty tiers can be checked
//! without a renderer.
//!
//! # Examples
//!
//! List the tiers and layouts, and audit the bundled assets:
//!
//! ```text
//! $ neuron-graph --ls
//! ```
//!
//! Deal five puzzles for level 14 and check that each one is solvable:
//!
//! ```text
//! $ neuron-graph --level 14 --count 5 --seed 7 --verify
//! ```
//!
//! Play a scripted session for 60 seconds of game time:
//!
//! ```text
//! $ neuron-graph --simulate 60 --json
//! ```
//!
//! Session settings are read from a JSON file; missing fields keep their
//! defaults:
//!
//! ```text
//! $ echo '{ "countdown": 3.0, "grace_on_timeout": true }' > settings.json
//! $ neuron-graph --simulate 90 --settings settings.json
//! ```

use clap::Parser;
use log::{debug, error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use neuron_graph::config::SessionSettings;
use neuron_graph::game::{
    DifficultyConfig, DifficultyResolver, DifficultyTable, EventLog, LayoutLibrary, LayoutStore,
    Puzzle, PuzzleGenerator, PuzzleSnapshot, SessionController, SessionPhase,
};
use neuron_graph::graph::NodeId;

/// Simulated frame length for `--simulate`, in seconds
const SIMULATION_STEP: f32 = 0.5;

/// Deal and inspect Neuron Graph puzzles.
#[derive(Parser)]
#[command(about, long_about = None, version)]
struct Args {
    /// List the difficulty tiers and layouts, then audit them
    #[arg(short, long, default_value_t = false)]
    ls: bool,

    /// Level to deal puzzles for
    #[arg(short = 'L', long, default_value_t = 1)]
    level: u32,

    /// Number of puzzles to deal
    #[arg(short, long, default_value_t = 1)]
    count: usize,

    /// Seed for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print puzzles or session events as JSON lines
    #[arg(short, long, default_value_t = false)]
    json: bool,

    /// Check that every dealt puzzle can be solved
    #[arg(short, long, default_value_t = false)]
    verify: bool,

    /// Play a scripted session for this many seconds of game time
    #[arg(long, value_name = "SECONDS", conflicts_with_all = ["ls", "verify"])]
    simulate: Option<f32>,

    /// JSON file with session settings for `--simulate`
    #[arg(long, value_name = "FILE", requires = "simulate")]
    settings: Option<PathBuf>,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

#[derive(Serialize)]
struct DealtPuzzle<'a> {
    config: &'a DifficultyConfig,
    puzzle: PuzzleSnapshot,
    shuffle: &'a [NodeId],
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let table = match DifficultyTable::load() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: difficulty table: {e}");
            return ExitCode::FAILURE;
        }
    };
    let library = match LayoutLibrary::load() {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: layouts: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    if args.ls {
        return list(&table, &library, args.level);
    }
    if let Some(seconds) = args.simulate {
        let settings = match &args.settings {
            Some(path) => match load_settings(path) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error: {}: {e}", path.display());
                    return ExitCode::FAILURE;
                }
            },
            None => SessionSettings::default(),
        };
        return simulate(table, library, rng, settings, args.level, seconds, args.json);
    }
    deal(&table, library, rng, &args)
}

fn load_settings(path: &Path) -> Result<SessionSettings, String> {
    let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
    SessionSettings::from_json(&json).map_err(|e| e.to_string())
}

/// Print tiers and layouts, then every inconsistency between them
fn list(table: &DifficultyTable, library: &LayoutLibrary, level: u32) -> ExitCode {
    println!("Tiers:");
    for tier in table.tiers() {
        let marker = if tier.contains(level) { '*' } else { ' ' };
        println!(
            "{marker} {:<10} levels {:>2}-{:<3} {:>2} nodes, {} colors, {:>2} shuffles, {}s per puzzle: {}",
            tier.name,
            tier.min_level,
            tier.max_level,
            tier.node_count,
            tier.color_count,
            tier.shuffle_moves,
            tier.time_per_puzzle,
            tier.layout_pool.join(", ")
        );
    }

    println!("Layouts:");
    for name in library.names() {
        let Some(spec) = library.spec(name) else {
            continue;
        };
        let edges = spec.connections.as_ref().map_or(0, Vec::len);
        let residency = library
            .residency(name)
            .map(|r| format!("{r:?}"))
            .unwrap_or_default();
        println!(
            "  {:<10} {:>2} nodes, {:>2} edges, {}",
            name,
            spec.nodes.len(),
            edges,
            residency
        );
    }

    let problems = library.audit(table);
    if problems.is_empty() {
        return ExitCode::SUCCESS;
    }
    for problem in &problems {
        eprintln!("Problem: {problem}");
    }
    ExitCode::FAILURE
}

/// Deal `--count` puzzles at `--level`
fn deal(
    table: &DifficultyTable,
    mut library: LayoutLibrary,
    mut rng: StdRng,
    args: &Args,
) -> ExitCode {
    let generator = PuzzleGenerator::new();
    let mut unsolvable = 0;

    for i in 0..args.count {
        debug!("Puzzle {i}");

        let config = table.resolve(args.level, &mut rng);
        let puzzle = match generator.generate(&config, &mut library, &mut rng) {
            Ok(puzzle) => puzzle,
            Err(e) => {
                eprintln!("Error: level {}: {e}", args.level);
                return ExitCode::FAILURE;
            }
        };

        if args.json {
            let dealt = DealtPuzzle {
                config: &config,
                puzzle: puzzle.snapshot(),
                shuffle: puzzle.shuffle(),
            };
            match serde_json::to_string(&dealt) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!(
                "{} (level {}, {}): target {} of {}, colors {:?}, shuffle {:?}",
                puzzle.layout().name(),
                config.level,
                config.tier,
                puzzle.target_color(),
                puzzle.color_count(),
                puzzle.colors(),
                puzzle
                    .shuffle()
                    .iter()
                    .map(|n| n.index())
                    .collect::<Vec<_>>()
            );
        }

        if args.verify && !replay_solves(&puzzle) {
            eprintln!(
                "Unsolvable puzzle on '{}': {:?}",
                puzzle.layout().name(),
                puzzle.colors()
            );
            unsolvable += 1;
        }

        library.release(puzzle.into_layout());
    }

    if args.verify {
        println!("{} of {} puzzles solvable", args.count - unsolvable, args.count);
    }
    if unsolvable > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Moves that undo a deal: the shuffle played `color_count - 1` more times
fn replay_plan(puzzle: &Puzzle) -> VecDeque<NodeId> {
    let rounds = usize::from(puzzle.color_count().saturating_sub(1));
    puzzle
        .shuffle()
        .iter()
        .copied()
        .cycle()
        .take(puzzle.shuffle().len() * rounds)
        .collect()
}

fn replay_solves(puzzle: &Puzzle) -> bool {
    let mut copy = puzzle.clone();
    for node in replay_plan(puzzle) {
        if copy.activate(node).is_err() {
            return false;
        }
    }
    copy.is_solved()
}

/// Run a session where the player taps one node per frame along the replay plan
fn simulate(
    table: DifficultyTable,
    library: LayoutLibrary,
    rng: StdRng,
    settings: SessionSettings,
    level: u32,
    seconds: f32,
    json: bool,
) -> ExitCode {
    let max_level = table.max_level();
    let mut session = SessionController::new(table, library, EventLog::new(), settings, rng);

    if let Err(e) = session.start_session(level) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut plan = VecDeque::new();
    let mut elapsed = 0.0;
    while elapsed < seconds && session.phase() != SessionPhase::Ended {
        match session.phase() {
            SessionPhase::PuzzleActive => {}
            SessionPhase::Countdown => {
                session.tick(SIMULATION_STEP);
                elapsed += SIMULATION_STEP;
                continue;
            }
            SessionPhase::PuzzleSolved => {
                // Presentation pause over
                if let Err(e) = session.next_puzzle() {
                    error!("Cannot continue: {e}");
                    break;
                }
                continue;
            }
            SessionPhase::TimedOut if session.settings().grace_on_timeout => {}
            _ => break,
        }

        if plan.is_empty() {
            if let Some(puzzle) = session.puzzle() {
                plan = replay_plan(puzzle);
            }
        }

        match plan.pop_front() {
            Some(node) => match session.on_node_activated(node) {
                Ok(true) => plan.clear(),
                Ok(false) => {}
                Err(e) => {
                    error!("Scripted move rejected: {e}");
                    break;
                }
            },
            None if session.phase() == SessionPhase::TimedOut => break,
            None => {
                info!("Nothing to replay, skipping puzzle");
                if let Err(e) = session.skip_puzzle() {
                    error!("Cannot skip: {e}");
                    break;
                }
            }
        }

        session.tick(SIMULATION_STEP);
        elapsed += SIMULATION_STEP;
    }

    let inert = session.phase() == SessionPhase::Inert;
    let solved = session.puzzles_solved();
    let final_score = session.end_session().unwrap_or(0);

    if json {
        for event in session.sink().events() {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    } else {
        let progression = session.progression();
        println!(
            "Score {} after {:.1}s: {} puzzles solved, reached level {} (+{}, {:.0}% of {} authored levels)",
            final_score,
            elapsed,
            solved,
            progression.current_level,
            progression.levels_gained(),
            progression.progress_percentage(max_level),
            max_level
        );
    }

    if inert {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
