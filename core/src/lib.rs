#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the battery maze engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. The solver system reads the terrain through a borrowed
//! [`GridView`] and answers with a [`Command::RecordPath`] carrying its
//! [`SolveOutcome`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Battery Maze.";

/// Smallest number of rows or columns a grid may be generated with.
pub const MIN_GRID_DIMENSION: u32 = 1;

/// Largest number of rows or columns offered to players by adapters.
pub const MAX_GRID_DIMENSION: u32 = 10;

/// Battery budgets offered to players by adapters.
pub const BATTERY_CHOICES: [u32; 9] = [10, 20, 30, 40, 50, 60, 70, 90, 100];

/// Battery budget selected when the player has not chosen one.
pub const DEFAULT_BATTERY: u32 = 100;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the terrain grid with a freshly generated one.
    GenerateGrid {
        /// Number of rows in the generated grid.
        rows: u32,
        /// Number of columns in the generated grid.
        columns: u32,
        /// Seed feeding the terrain random number generator.
        seed: u64,
    },
    /// Chooses the cell the agent departs from.
    SelectStart {
        /// Cell requested as the start.
        cell: Position,
    },
    /// Chooses the cell the agent must reach.
    SelectGoal {
        /// Cell requested as the goal.
        cell: Position,
    },
    /// Asks for a path between the selected endpoints under the given budget.
    RequestSolve {
        /// Battery available when the agent departs.
        battery: u32,
    },
    /// Stores the outcome produced by the solver for a given grid revision.
    RecordPath {
        /// Grid revision the outcome was computed against.
        revision: GridRevision,
        /// Result of the search.
        outcome: SolveOutcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new terrain grid replaced the previous one.
    GridGenerated {
        /// Number of rows in the new grid.
        rows: u32,
        /// Number of columns in the new grid.
        columns: u32,
        /// Revision assigned to the new grid.
        revision: GridRevision,
    },
    /// Reports that grid generation was refused.
    GenerationRejected {
        /// Specific reason generation failed.
        reason: GridError,
    },
    /// Confirms the start cell selection.
    StartSelected {
        /// Cell the agent departs from.
        cell: Position,
    },
    /// Confirms the goal cell selection.
    GoalSelected {
        /// Cell the agent must reach.
        cell: Position,
    },
    /// Reports that a start or goal selection was refused.
    SelectionRejected {
        /// Cell that was requested.
        cell: Position,
        /// Specific reason the selection failed.
        reason: SelectionError,
    },
    /// Asks systems to search for a path on the current grid.
    SolveRequested {
        /// Grid revision the request refers to.
        revision: GridRevision,
        /// Endpoints and budget of the search.
        request: SolveRequest,
    },
    /// Reports that a solve request could not be issued.
    SolveRejected {
        /// Specific reason the request was refused.
        reason: SolveRejection,
    },
    /// Announces a path between the selected endpoints.
    PathFound {
        /// Cells visited from start to goal inclusive.
        path: Path,
        /// Battery left after entering the goal.
        final_battery: u32,
    },
    /// Announces that the goal cannot be reached with the given budget.
    PathNotFound {
        /// Battery the search started with.
        battery: u32,
    },
}

/// Monotonic counter identifying one generated grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridRevision(u32);

impl GridRevision {
    /// Creates a revision with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the revision.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Revision that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Cardinal movement directions available to the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
    /// Movement toward increasing column indices.
    East,
}

impl Direction {
    /// Every direction in the order neighbours are expanded.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: u32,
    column: u32,
}

impl Position {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Cell reached by stepping once in `direction`, if it stays inside a
    /// grid of `rows` by `columns`.
    #[must_use]
    pub fn neighbor(self, direction: Direction, rows: u32, columns: u32) -> Option<Position> {
        let (row, column) = match direction {
            Direction::North => (self.row.checked_sub(1)?, self.column),
            Direction::South => (self.row.checked_add(1)?, self.column),
            Direction::West => (self.row, self.column.checked_sub(1)?),
            Direction::East => (self.row, self.column.checked_add(1)?),
        };

        if row < rows && column < columns {
            Some(Position::new(row, column))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Battery drained by entering a wall. Walls are filtered before charging.
pub const WALL_CONSUMPTION: u32 = 10_000;

/// Category of a grid cell determining traversal cost and battery drain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Impassable cell.
    Wall,
    /// Most expensive passable terrain; never entered twice in a row.
    Water,
    /// Costly terrain.
    Sand,
    /// Slightly costly terrain.
    Grass,
    /// Open floor.
    Empty,
}

impl TerrainKind {
    /// Maps a uniform sample in `[0, 1)` onto a terrain kind.
    ///
    /// The cumulative thresholds are 15% wall, 20% water, 20% sand,
    /// 20% grass and 25% empty.
    #[must_use]
    pub fn from_sample(sample: f64) -> Self {
        if sample < 0.15 {
            Self::Wall
        } else if sample < 0.35 {
            Self::Water
        } else if sample < 0.55 {
            Self::Sand
        } else if sample < 0.75 {
            Self::Grass
        } else {
            Self::Empty
        }
    }

    /// Step cost used when ranking frontier nodes. Walls are infinite.
    #[must_use]
    pub const fn movement_cost(self) -> f64 {
        match self {
            Self::Wall => f64::INFINITY,
            Self::Water => 4.0,
            Self::Sand => 3.0,
            Self::Grass => 2.0,
            Self::Empty => 1.0,
        }
    }

    /// Battery drained by entering a cell of this terrain.
    #[must_use]
    pub const fn resource_consumption(self) -> u32 {
        match self {
            Self::Wall => WALL_CONSUMPTION,
            Self::Water => 5,
            Self::Sand => 3,
            Self::Grass => 2,
            Self::Empty => 1,
        }
    }

    /// Reports whether the agent may ever enter this terrain.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// Single-character form used by text fixtures and terminal output.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Water => '~',
            Self::Sand => ':',
            Self::Grass => '"',
            Self::Empty => '.',
        }
    }

    /// Parses the single-character form produced by [`TerrainKind::glyph`].
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '#' => Some(Self::Wall),
            '~' => Some(Self::Water),
            ':' => Some(Self::Sand),
            '"' => Some(Self::Grass),
            '.' => Some(Self::Empty),
            _ => None,
        }
    }
}

/// Failures raised by grid construction and lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The position lies outside the grid.
    #[error("position {position} lies outside the {rows}x{columns} grid")]
    OutOfBounds {
        /// Offending position.
        position: Position,
        /// Number of rows in the grid.
        rows: u32,
        /// Number of columns in the grid.
        columns: u32,
    },
    /// The requested grid has zero rows or columns, or its cells do not match
    /// the declared shape.
    #[error("grid dimensions {rows}x{columns} are invalid")]
    InvalidDimensions {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
}

/// Reasons a start or goal selection may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SelectionError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is a wall.
    #[error("walls cannot be selected")]
    Wall,
}

/// Reasons a solve request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SolveRejection {
    /// No start cell has been selected.
    #[error("no start cell has been selected")]
    MissingStart,
    /// No goal cell has been selected.
    #[error("no goal cell has been selected")]
    MissingGoal,
}

/// Read-only view into the dense terrain grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [TerrainKind],
    rows: u32,
    columns: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [TerrainKind], rows: u32, columns: u32) -> Self {
        Self {
            cells,
            rows,
            columns,
        }
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn is_within_bounds(&self, position: Position) -> bool {
        position.row() < self.rows && position.column() < self.columns
    }

    /// Terrain stored at the position.
    pub fn terrain_at(&self, position: Position) -> Result<TerrainKind, GridError> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
            .ok_or(GridError::OutOfBounds {
                position,
                rows: self.rows,
                columns: self.columns,
            })
    }

    /// Row-major offset of the position, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, position: Position) -> Option<usize> {
        if !self.is_within_bounds(position) {
            return None;
        }
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Iterates over every row as a slice of terrain kinds.
    pub fn iter_rows(&self) -> impl Iterator<Item = &'a [TerrainKind]> + 'a {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        self.cells.chunks(width)
    }
}

/// Ordered sequence of cells from start to goal inclusive.
///
/// An empty path signals that no route exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    cells: Vec<Position>,
}

impl Path {
    /// Creates a path visiting the provided cells in order.
    #[must_use]
    pub fn from_cells(cells: Vec<Position>) -> Self {
        Self { cells }
    }

    /// Path that signals the absence of a route.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cells visited in order.
    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Number of cells in the path, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path carries no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First cell of the path.
    #[must_use]
    pub fn first(&self) -> Option<Position> {
        self.cells.first().copied()
    }

    /// Last cell of the path.
    #[must_use]
    pub fn last(&self) -> Option<Position> {
        self.cells.last().copied()
    }

    /// Reports whether consecutive cells are 4-directionally adjacent.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.cells
            .windows(2)
            .all(|pair| pair[0].manhattan_distance(pair[1]) == 1)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut cells = self.cells.iter();
        if let Some(first) = cells.next() {
            write!(f, "{first}")?;
        }
        for cell in cells {
            write!(f, " -> {cell}")?;
        }
        Ok(())
    }
}

/// Endpoints and budget for a single search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolveRequest {
    /// Cell the agent departs from.
    pub start: Position,
    /// Cell the agent must reach.
    pub goal: Position,
    /// Battery available at the start.
    pub battery: u32,
}

/// Controls how the solver discards duplicate frontier entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruningStrategy {
    /// Drop a candidate when a live frontier entry for the same cell already
    /// scores at least as well.
    #[default]
    FrontierScan,
    /// Drop a candidate when any earlier entry for the same cell, live or
    /// expanded, scored at least as well.
    BestScoreMap,
}

/// Result of one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    path: Path,
    final_battery: u32,
    expanded: usize,
}

impl SolveOutcome {
    /// Outcome describing a route that reached the goal.
    #[must_use]
    pub fn found(path: Path, final_battery: u32, expanded: usize) -> Self {
        Self {
            path,
            final_battery,
            expanded,
        }
    }

    /// Outcome describing an unreachable goal. The battery is left untouched.
    #[must_use]
    pub fn not_found(battery: u32, expanded: usize) -> Self {
        Self {
            path: Path::empty(),
            final_battery: battery,
            expanded,
        }
    }

    /// Reports whether the goal was reached.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.path.is_empty()
    }

    /// Cells visited from start to goal; empty when no route exists.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Battery left on arrival, or the initial budget when no route exists.
    #[must_use]
    pub const fn final_battery(&self) -> u32 {
        self.final_battery
    }

    /// Number of nodes taken off the frontier during the search.
    #[must_use]
    pub const fn expanded(&self) -> usize {
        self.expanded
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, GridError, GridView, Path, Position, TerrainKind};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Position::new(1, 1);
        let destination = Position::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn neighbor_stays_inside_grid() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.neighbor(Direction::North, 3, 3), None);
        assert_eq!(corner.neighbor(Direction::West, 3, 3), None);
        assert_eq!(
            corner.neighbor(Direction::South, 3, 3),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            corner.neighbor(Direction::East, 3, 3),
            Some(Position::new(0, 1))
        );

        let far = Position::new(2, 2);
        assert_eq!(far.neighbor(Direction::South, 3, 3), None);
        assert_eq!(far.neighbor(Direction::East, 3, 3), None);
    }

    #[test]
    fn samples_map_onto_cumulative_thresholds() {
        assert_eq!(TerrainKind::from_sample(0.0), TerrainKind::Wall);
        assert_eq!(TerrainKind::from_sample(0.149), TerrainKind::Wall);
        assert_eq!(TerrainKind::from_sample(0.15), TerrainKind::Water);
        assert_eq!(TerrainKind::from_sample(0.35), TerrainKind::Sand);
        assert_eq!(TerrainKind::from_sample(0.55), TerrainKind::Grass);
        assert_eq!(TerrainKind::from_sample(0.75), TerrainKind::Empty);
        assert_eq!(TerrainKind::from_sample(0.999), TerrainKind::Empty);
    }

    #[test]
    fn cost_and_consumption_are_independent_tables() {
        assert!(TerrainKind::Wall.movement_cost().is_infinite());
        assert_eq!(TerrainKind::Water.movement_cost(), 4.0);
        assert_eq!(TerrainKind::Water.resource_consumption(), 5);
        assert_eq!(TerrainKind::Sand.movement_cost(), 3.0);
        assert_eq!(TerrainKind::Sand.resource_consumption(), 3);
        assert_eq!(TerrainKind::Grass.movement_cost(), 2.0);
        assert_eq!(TerrainKind::Grass.resource_consumption(), 2);
        assert_eq!(TerrainKind::Empty.movement_cost(), 1.0);
        assert_eq!(TerrainKind::Empty.resource_consumption(), 1);
    }

    #[test]
    fn glyphs_parse_back_to_terrain() {
        for kind in [
            TerrainKind::Wall,
            TerrainKind::Water,
            TerrainKind::Sand,
            TerrainKind::Grass,
            TerrainKind::Empty,
        ] {
            assert_eq!(TerrainKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(TerrainKind::from_glyph('x'), None);
    }

    #[test]
    fn terrain_at_rejects_positions_outside_grid() {
        let cells = [TerrainKind::Empty, TerrainKind::Wall];
        let view = GridView::new(&cells, 1, 2);

        assert_eq!(
            view.terrain_at(Position::new(0, 1)),
            Ok(TerrainKind::Wall)
        );
        assert_eq!(
            view.terrain_at(Position::new(1, 0)),
            Err(GridError::OutOfBounds {
                position: Position::new(1, 0),
                rows: 1,
                columns: 2,
            })
        );
        assert!(!view.is_within_bounds(Position::new(0, 2)));
    }

    #[test]
    fn path_contiguity_detects_jumps() {
        let contiguous = Path::from_cells(vec![
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(1, 1),
        ]);
        assert!(contiguous.is_contiguous());

        let jumping = Path::from_cells(vec![Position::new(0, 0), Position::new(1, 1)]);
        assert!(!jumping.is_contiguous());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn path_round_trips_through_bincode() {
        let path = Path::from_cells(vec![Position::new(3, 4), Position::new(3, 5)]);
        assert_round_trip(&path);
    }
}
