#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a maze, plans a route and prints it.

mod config;
mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use battery_maze_core::{Command, Event, GridView, Position, PruningStrategy, TerrainKind};
use battery_maze_system_solver::Solver;
use battery_maze_world::{self as world, query, Grid, World};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{FileSettings, Settings};

/// Plan a battery-constrained route across a generated terrain grid.
#[derive(Debug, Parser)]
#[command(name = "battery-maze", version, long_about = None)]
struct Cli {
    /// TOML file supplying defaults for the options below.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text grid to load instead of generating one.
    #[arg(long, conflicts_with_all = ["rows", "columns", "seed"])]
    grid: Option<PathBuf>,

    /// Number of grid rows.
    #[arg(long)]
    rows: Option<u32>,

    /// Number of grid columns.
    #[arg(long)]
    columns: Option<u32>,

    /// Seed for terrain generation.
    #[arg(long)]
    seed: Option<u64>,

    /// Battery available at the start.
    #[arg(long)]
    battery: Option<u32>,

    /// Start cell written as `row,column`.
    #[arg(long, value_parser = parse_cell)]
    start: Option<[u32; 2]>,

    /// Goal cell written as `row,column`.
    #[arg(long, value_parser = parse_cell)]
    goal: Option<[u32; 2]>,

    /// How duplicate frontier entries are pruned.
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Compare against live frontier entries only.
    FrontierScan,
    /// Compare against the best score ever queued per cell.
    BestScoreMap,
}

impl From<Strategy> for PruningStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::FrontierScan => PruningStrategy::FrontierScan,
            Strategy::BestScoreMap => PruningStrategy::BestScoreMap,
        }
    }
}

/// Entry point for the battery maze command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let loaded = cli.grid.as_deref().map(load_grid).transpose()?;

    let overrides = FileSettings {
        rows: loaded.as_ref().map(Grid::rows).or(cli.rows),
        columns: loaded.as_ref().map(Grid::columns).or(cli.columns),
        seed: cli.seed,
        battery: cli.battery,
        strategy: cli.strategy.map(PruningStrategy::from),
        start: cli.start,
        goal: cli.goal,
    };
    let settings = file.merged(overrides).resolve()?;

    let mut world = match loaded {
        Some(grid) => World::with_grid(grid),
        None => World::generated(settings.rows, settings.columns, settings.seed)
            .context("failed to generate terrain grid")?,
    };

    println!("{}", query::welcome_banner(&world));
    run(&mut world, &settings)
}

fn run(world: &mut World, settings: &Settings) -> Result<()> {
    let view = query::grid_view(world);
    let start = match settings.start {
        Some(cell) => cell,
        None => nearest_open_cell(view, Position::new(0, 0))?,
    };
    let goal = match settings.goal {
        Some(cell) => cell,
        None => nearest_open_cell(
            view,
            Position::new(
                view.rows().saturating_sub(1),
                view.columns().saturating_sub(1),
            ),
        )?,
    };

    let mut solver = Solver::new(settings.strategy);
    let commands = [
        Command::SelectStart { cell: start },
        Command::SelectGoal { cell: goal },
        Command::RequestSolve {
            battery: settings.battery,
        },
    ];

    let mut announced = Vec::new();
    for command in commands {
        let mut events = Vec::new();
        world::apply(world, command, &mut events);

        let mut answers = Vec::new();
        solver.handle(&events, query::grid_view(world), &mut answers);
        for answer in answers {
            world::apply(world, answer, &mut events);
        }

        for event in &events {
            match event {
                Event::SelectionRejected { cell, reason } => {
                    bail!("cannot use {cell} as an endpoint: {reason}")
                }
                Event::SolveRejected { reason } => bail!("cannot solve: {reason}"),
                _ => {}
            }
        }
        announced.extend(events);
    }

    let path = query::last_outcome(world)
        .map(|outcome| outcome.path().cells().to_vec())
        .unwrap_or_default();
    print!("{}", render::overlay(query::grid_view(world), &path, start, goal));

    for event in announced {
        match event {
            Event::PathFound {
                path,
                final_battery,
            } => {
                println!("Solution: {path}");
                println!("Final battery remaining: {final_battery}");
            }
            Event::PathNotFound { battery } => {
                println!("No path found or battery depleted (initial battery: {battery})");
            }
            _ => {}
        }
    }

    Ok(())
}

/// Passable cell closest to `corner`, preferring earlier rows on ties.
fn nearest_open_cell(view: GridView<'_>, corner: Position) -> Result<Position> {
    let cell = (0..view.rows())
        .flat_map(|row| (0..view.columns()).map(move |column| Position::new(row, column)))
        .filter(|cell| view.terrain_at(*cell).is_ok_and(TerrainKind::is_passable))
        .min_by_key(|cell| cell.manhattan_distance(corner))
        .context("grid has no passable cell to use as an endpoint")?;
    if cell != corner {
        info!(%corner, %cell, "corner is a wall, using nearest passable cell");
    }
    Ok(cell)
}

fn load_grid(path: &std::path::Path) -> Result<Grid> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grid file at {}", path.display()))?;
    contents
        .parse::<Grid>()
        .with_context(|| format!("failed to parse grid file at {}", path.display()))
}

fn parse_cell(value: &str) -> Result<[u32; 2], String> {
    let (row, column) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `row,column`, got `{value}`"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    Ok([row, column])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn settings(rows: u32, columns: u32, battery: u32) -> Settings {
        Settings {
            rows,
            columns,
            seed: 0,
            battery,
            strategy: PruningStrategy::FrontierScan,
            start: None,
            goal: None,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_cell_accepts_row_column_pairs() {
        assert_eq!(parse_cell("3, 4"), Ok([3, 4]));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("a,1").is_err());
    }

    #[test]
    fn run_records_outcome_for_loaded_grid() {
        let grid: Grid = "...\n.#.\n...".parse().expect("grid parses");
        let mut world = World::with_grid(grid);

        run(&mut world, &settings(3, 3, 100)).expect("run succeeds");

        assert_eq!(query::start(&world), Some(Position::new(0, 0)));
        assert_eq!(query::goal(&world), Some(Position::new(2, 2)));
        let outcome = query::last_outcome(&world).expect("outcome recorded");
        assert_eq!(outcome.final_battery(), 96);
    }

    #[test]
    fn run_rejects_explicit_wall_endpoints() {
        let grid: Grid = ".#".parse().expect("grid parses");
        let mut world = World::with_grid(grid);
        let settings = Settings {
            goal: Some(Position::new(0, 1)),
            ..settings(1, 2, 10)
        };

        assert!(run(&mut world, &settings).is_err());
    }

    #[test]
    fn walled_corners_fall_back_to_nearest_open_cells() {
        let grid: Grid = "#..\n...\n..#".parse().expect("grid parses");
        let mut world = World::with_grid(grid);

        run(&mut world, &settings(3, 3, 100)).expect("run succeeds");

        assert_eq!(query::start(&world), Some(Position::new(0, 1)));
        assert_eq!(query::goal(&world), Some(Position::new(1, 2)));
        assert!(query::last_outcome(&world).is_some_and(|outcome| outcome.is_found()));
    }

    #[test]
    fn all_wall_grid_reports_missing_endpoint() {
        let grid: Grid = "##\n##".parse().expect("grid parses");
        let mut world = World::with_grid(grid);

        let error = run(&mut world, &settings(2, 2, 100)).expect_err("no open cell");
        assert!(error.to_string().contains("no passable cell"));
    }

    #[test]
    fn default_settings_run_end_to_end() {
        let defaults = FileSettings::default().resolve().expect("defaults are valid");
        let sized = FileSettings {
            rows: Some(4),
            columns: Some(4),
            seed: Some(2),
            ..FileSettings::default()
        }
        .resolve()
        .expect("settings are valid");

        for settings in [defaults, sized] {
            let mut world = World::generated(settings.rows, settings.columns, settings.seed)
                .expect("dimensions are valid");

            run(&mut world, &settings).expect("default endpoints are usable");

            let grid = query::grid(&world);
            for cell in [query::start(&world), query::goal(&world)] {
                let cell = cell.expect("endpoint selected");
                assert!(grid.terrain_at(cell).is_ok_and(TerrainKind::is_passable));
            }
            assert!(query::last_outcome(&world).is_some());
        }
    }
}
