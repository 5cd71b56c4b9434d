//! Prosperous Universe Expansion Planner
//!
//! Command-line front end: imports game exports into SQLite and plans
//! production expansions from the stored snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;
use tracing::info;

use prun_planner::housing::OptimizationGoal;
use prun_planner::planner::{Planner, format_chain};
use prun_planner::production::current_production;
use prun_planner::trace::SimulationLog;
use prun_planner::{PlannerConfig, SimulationState, db, import, logging};

#[derive(Parser)]
#[command(name = "prun-planner")]
#[command(about = "Production expansion planner for Prosperous Universe")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "prun_data.db")]
    database: PathBuf,

    /// Planner configuration overrides (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import raw game-data JSON exports into the database
    Import {
        /// Directory holding the exports
        source_dir: PathBuf,

        /// Clear the stored snapshot before importing
        #[arg(long)]
        clear: bool,
    },

    /// Plan the expansion needed to reach a daily production rate
    Plan {
        /// Material ticker (e.g. "RAT")
        ticker: String,

        /// Target production rate in units/day
        #[arg(short, long)]
        rate: f64,

        /// Housing goal: lower-cost or less-area
        #[arg(short, long)]
        goal: Option<OptimizationGoal>,

        /// Seed for planet shuffling and site ids
        #[arg(long)]
        seed: Option<u64>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve the cheapest way to acquire one unit of a material
    Cost {
        /// Material ticker
        ticker: String,

        /// Seed for planet shuffling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the company's current production rate of a material
    Current {
        /// Material ticker
        ticker: String,

        /// Only count this site
        #[arg(long)]
        site: Option<String>,
    },

    /// List all producible materials
    ListMaterials,

    /// List all planets in the database
    ListPlanets,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("opening database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { source_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_snapshot(&conn)?;
            }

            let now_ms = chrono::Utc::now().timestamp_millis();
            let (state, stats) = import::import_dir(&source_dir, now_ms)
                .with_context(|| format!("importing {}", source_dir.display()))?;
            db::save_snapshot(&mut conn, &state).context("saving snapshot")?;
            println!("\n{}", stats);
        }

        Commands::Plan {
            ticker,
            rate,
            goal,
            seed,
            json,
        } => {
            let planner = Planner::new(load_config(cli.config.as_deref())?)?;
            let state = load_state(&conn)?;
            let seed = seed.unwrap_or_else(rand::random);
            info!(seed, "planning {}", ticker);

            let rec = planner.run_seeded(&state, &ticker, rate, goal, seed)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rec)?);
            } else {
                println!("Decision log:");
                for line in &rec.log {
                    println!("{}", line);
                }
                println!();
                println!("{}", rec);
            }
        }

        Commands::Cost { ticker, seed } => {
            let planner = Planner::new(load_config(cli.config.as_deref())?)?;
            let state = load_state(&conn)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random));

            let (resolution, log) = planner.resolve_cost(&state, &ticker, &mut rng);
            for line in &log {
                println!("{}", line);
            }
            println!();
            if resolution.is_acquirable() {
                println!(
                    "{}: {} at {:.2}/unit",
                    ticker, resolution.source, resolution.cost_per_unit
                );
            } else {
                println!("{}: {} (no price or recipe found)", ticker, resolution.source);
            }
            if let Some(recipe) = &resolution.recipe {
                println!("Recipe: {}", recipe);
            }
            if !resolution.buildings.is_empty() {
                println!("Building chain:");
                print!("{}", format_chain(&resolution.buildings));
            }
        }

        Commands::Current { ticker, site } => {
            let state = load_state(&conn)?;
            let mut log = SimulationLog::new();
            let rate = current_production(&state, &ticker, site.as_deref(), &mut log);
            for line in log.lines() {
                println!("{}", line);
            }
            println!("\n{}: {:.2} units/day", ticker, rate);
        }

        Commands::ListMaterials => {
            let materials = db::list_producible_materials(&conn)?;
            if materials.is_empty() {
                println!("No materials in database. Run 'import' first.");
            } else {
                println!("Producible materials:");
                for m in materials {
                    println!("  {}", m);
                }
            }
        }

        Commands::ListPlanets => {
            let planets = db::list_planets(&conn)?;
            if planets.is_empty() {
                println!("No planets in database. Run 'import' first.");
            } else {
                println!(
                    "{:<12} {:<20} {:>9} {:>6} {:>4} {:<10}",
                    "ID", "Name", "Fertility", "Market", "CoC", "COGC"
                );
                println!("{}", "-".repeat(66));
                for p in planets {
                    println!(
                        "{:<12} {:<20} {:>9.2} {:>6} {:>4} {:<10}",
                        p.natural_id,
                        p.name,
                        p.fertility,
                        if p.has_local_market { "yes" } else { "no" },
                        if p.has_chamber_of_commerce { "yes" } else { "no" },
                        p.cogc_status.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    match path {
        Some(path) => PlannerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PlannerConfig::default()),
    }
}

/// Load the stored snapshot, using the wall clock as the reference time
fn load_state(conn: &Connection) -> Result<SimulationState> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let state = db::load_snapshot(conn, now_ms).context("loading snapshot")?;
    if state.recipes.is_empty() {
        println!("No recipes in database. Run 'import' first.");
    }
    Ok(state)
}
