//! Thomson Problem Explorer
//!
//! Drives the population searcher until the best energy stabilizes,
//! then reports the edge classes of the resulting polyhedron.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use thomson::geometry::Vec3;
use thomson::hull::{edge_groups, format_edge_report, EdgeGroup};
use thomson::population::{
    format_step_line, SearchConfig, SearchStatus, StepStats, ThomsonSearcher,
};

#[derive(Parser, Debug)]
#[command(name = "thomson")]
#[command(about = "Genetic search for minimum-energy charge arrangements on a sphere")]
struct Args {
    /// Number of charges on the sphere
    #[arg(short = 'n', long, default_value_t = 12)]
    charges: usize,

    /// Population size
    #[arg(short = 'p', long, default_value_t = 20)]
    population: usize,

    /// Probability of mutating a fresh child
    #[arg(long, default_value_t = 0.3)]
    mutation_rate: f64,

    /// Gradient step size for the local optimizer
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    /// Stop once a step improves the best energy by less than this
    #[arg(long, default_value_t = 1e-6)]
    threshold: f64,

    /// Deterministic seed (omit for entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Hard cap on steps in case the search never stabilizes
    #[arg(long, default_value_t = 200)]
    max_steps: usize,

    /// Write the final report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Everything the presentation layer consumes, in one document.
#[derive(Serialize)]
struct RunReport {
    config: SearchConfig,
    status: SearchStatus,
    steps: usize,
    best_energy: f64,
    best_points: Vec<Vec3>,
    edge_groups: Vec<EdgeGroup>,
    history: Vec<StepStats>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.charges < 1 {
        eprintln!("error: need at least one charge");
        std::process::exit(1);
    }
    if args.population < 2 {
        eprintln!("error: need a population of at least two");
        std::process::exit(1);
    }

    let config = SearchConfig {
        charge_count: args.charges,
        population_size: args.population,
        mutation_rate: args.mutation_rate,
        learning_rate: args.learning_rate,
        convergence_threshold: args.threshold,
        seed: args.seed,
        ..SearchConfig::default()
    };

    println!("═══════════════════════════════════════════════════════════════");
    println!("  THOMSON PROBLEM EXPLORER");
    println!("  {} charges, population {}", args.charges, args.population);
    println!("═══════════════════════════════════════════════════════════════");
    if let Some(seed) = args.seed {
        println!("  Using deterministic seed: {seed}");
    }
    println!();

    let mut searcher = ThomsonSearcher::new(config);

    while searcher.status == SearchStatus::Running && searcher.step_count < args.max_steps {
        searcher.step();
        println!(
            "Step {:4} | {}",
            searcher.step_count,
            format_step_line(&searcher)
        );
    }

    println!();
    match searcher.status {
        SearchStatus::Converged => println!(
            "Converged after {} steps: E = {:.6}",
            searcher.step_count, searcher.best_ever.energy
        ),
        SearchStatus::Running => println!(
            "Step cap reached at {} steps: E = {:.6}",
            searcher.step_count, searcher.best_ever.energy
        ),
    }

    let groups = edge_groups(&searcher.best_ever.points);
    println!();
    print!("{}", format_edge_report(&groups));

    if let Some(path) = args.output {
        let report = RunReport {
            config: searcher.config.clone(),
            status: searcher.status,
            steps: searcher.step_count,
            best_energy: searcher.best_ever.energy,
            best_points: searcher.best_ever.points.clone(),
            edge_groups: groups,
            history: searcher.history.clone(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    eprintln!("Failed to write {}: {e}", path.display());
                    std::process::exit(1);
                }
                println!();
                println!("Report written to {}", path.display());
            }
            Err(e) => {
                eprintln!("Failed to serialize report: {e}");
                std::process::exit(1);
            }
        }
    }
}
