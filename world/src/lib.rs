#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the battery maze.

mod grid;

pub use grid::{Grid, ParseGridError};

use std::num::NonZeroU32;

use battery_maze_core::{
    Command, Event, GridError, GridRevision, Position, SelectionError, SolveOutcome,
    SolveRejection, SolveRequest, TerrainKind, MAX_GRID_DIMENSION, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Seed used for the grid a new world starts with.
pub const GRID_GENERATION_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

const DEFAULT_GRID_ROWS: NonZeroU32 = NonZeroU32::MIN.saturating_add(MAX_GRID_DIMENSION - 1);
const DEFAULT_GRID_COLUMNS: NonZeroU32 = NonZeroU32::MIN.saturating_add(MAX_GRID_DIMENSION - 1);

/// Represents the authoritative battery maze session.
///
/// The world owns the terrain grid exclusively. Systems only ever see it
/// through [`query::grid_view`], and every regeneration bumps the grid
/// revision so outcomes computed against an older layout are discarded.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    revision: GridRevision,
    start: Option<Position>,
    goal: Option<Position>,
    last_outcome: Option<SolveOutcome>,
}

impl World {
    /// Creates a new world populated with the default generated grid.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(GRID_GENERATION_SEED);
        Self::with_grid(Grid::generate_sized(
            DEFAULT_GRID_ROWS,
            DEFAULT_GRID_COLUMNS,
            &mut rng,
        ))
    }

    /// Creates a world around a grid generated from `seed`.
    ///
    /// Produces the same layout as applying [`Command::GenerateGrid`] with
    /// identical arguments.
    pub fn generated(rows: u32, columns: u32, seed: u64) -> Result<Self, GridError> {
        seeded_grid(rows, columns, seed).map(Self::with_grid)
    }

    /// Creates a world around an explicit grid, typically a text fixture.
    #[must_use]
    pub fn with_grid(grid: Grid) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid,
            revision: GridRevision::default(),
            start: None,
            goal: None,
            last_outcome: None,
        }
    }

    fn replace_grid(&mut self, grid: Grid) {
        self.grid = grid;
        self.revision = self.revision.next();
        self.start = None;
        self.goal = None;
        self.last_outcome = None;
    }

    fn validate_selection(&self, cell: Position) -> Result<(), SelectionError> {
        match self.grid.terrain_at(cell) {
            Ok(TerrainKind::Wall) => Err(SelectionError::Wall),
            Ok(_) => Ok(()),
            Err(_) => Err(SelectionError::OutOfBounds),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn seeded_grid(rows: u32, columns: u32, seed: u64) -> Result<Grid, GridError> {
    Grid::generate(rows, columns, &mut ChaCha8Rng::seed_from_u64(seed))
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateGrid {
            rows,
            columns,
            seed,
        } => {
            match seeded_grid(rows, columns, seed) {
                Ok(grid) => {
                    world.replace_grid(grid);
                    info!(
                        rows,
                        columns,
                        seed,
                        revision = world.revision.get(),
                        "generated terrain grid"
                    );
                    out_events.push(Event::GridGenerated {
                        rows,
                        columns,
                        revision: world.revision,
                    });
                }
                Err(reason) => {
                    warn!(%reason, "grid generation rejected");
                    out_events.push(Event::GenerationRejected { reason });
                }
            }
        }
        Command::SelectStart { cell } => match world.validate_selection(cell) {
            Ok(()) => {
                world.start = Some(cell);
                world.last_outcome = None;
                out_events.push(Event::StartSelected { cell });
            }
            Err(reason) => {
                debug!(%cell, %reason, "start selection rejected");
                out_events.push(Event::SelectionRejected { cell, reason });
            }
        },
        Command::SelectGoal { cell } => match world.validate_selection(cell) {
            Ok(()) => {
                world.goal = Some(cell);
                world.last_outcome = None;
                out_events.push(Event::GoalSelected { cell });
            }
            Err(reason) => {
                debug!(%cell, %reason, "goal selection rejected");
                out_events.push(Event::SelectionRejected { cell, reason });
            }
        },
        Command::RequestSolve { battery } => {
            let Some(start) = world.start else {
                out_events.push(Event::SolveRejected {
                    reason: SolveRejection::MissingStart,
                });
                return;
            };
            let Some(goal) = world.goal else {
                out_events.push(Event::SolveRejected {
                    reason: SolveRejection::MissingGoal,
                });
                return;
            };

            out_events.push(Event::SolveRequested {
                revision: world.revision,
                request: SolveRequest {
                    start,
                    goal,
                    battery,
                },
            });
        }
        Command::RecordPath { revision, outcome } => {
            if revision != world.revision {
                warn!(
                    stale = revision.get(),
                    current = world.revision.get(),
                    "discarding outcome computed for a replaced grid"
                );
                return;
            }

            if outcome.is_found() {
                info!(
                    steps = outcome.path().len().saturating_sub(1),
                    final_battery = outcome.final_battery(),
                    "path recorded"
                );
                out_events.push(Event::PathFound {
                    path: outcome.path().clone(),
                    final_battery: outcome.final_battery(),
                });
            } else {
                info!(battery = outcome.final_battery(), "no path within budget");
                out_events.push(Event::PathNotFound {
                    battery: outcome.final_battery(),
                });
            }
            world.last_outcome = Some(outcome);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use battery_maze_core::{GridRevision, GridView, Position, SolveOutcome};

    use super::{Grid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's terrain grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Exposes a read-only view of the terrain grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Revision of the grid currently held by the world.
    #[must_use]
    pub fn revision(world: &World) -> GridRevision {
        world.revision
    }

    /// Start cell chosen by the player, if any.
    #[must_use]
    pub fn start(world: &World) -> Option<Position> {
        world.start
    }

    /// Goal cell chosen by the player, if any.
    #[must_use]
    pub fn goal(world: &World) -> Option<Position> {
        world.goal
    }

    /// Outcome recorded for the current grid and endpoints, if any.
    #[must_use]
    pub fn last_outcome(world: &World) -> Option<&SolveOutcome> {
        world.last_outcome.as_ref()
    }
}
