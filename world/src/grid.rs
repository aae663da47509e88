//! Dense terrain grid owned by the world.

use std::{num::NonZeroU32, str::FromStr};

use battery_maze_core::{GridError, GridView, Position, TerrainKind};
use rand::Rng;
use thiserror::Error;

/// Row-major matrix of terrain kinds with a fixed shape.
///
/// The grid is generated once and then only read. Regenerating produces a
/// brand new grid rather than mutating cells in place, so views handed to the
/// solver always describe a consistent layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: u32,
    columns: u32,
    cells: Vec<TerrainKind>,
}

impl Grid {
    /// Generates a grid by drawing every cell independently from `rng`.
    pub fn generate<R>(rows: u32, columns: u32, rng: &mut R) -> Result<Self, GridError>
    where
        R: Rng + ?Sized,
    {
        match (NonZeroU32::new(rows), NonZeroU32::new(columns)) {
            (Some(rows), Some(columns)) => Ok(Self::generate_sized(rows, columns, rng)),
            _ => Err(GridError::InvalidDimensions { rows, columns }),
        }
    }

    /// Generates a grid whose dimensions are known to be non-zero.
    ///
    /// Cells are drawn in row-major order, so a seeded `rng` yields the same
    /// layout as [`Grid::generate`].
    pub fn generate_sized<R>(rows: NonZeroU32, columns: NonZeroU32, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let cells = (0..rows.get())
            .flat_map(|_| 0..columns.get())
            .map(|_| TerrainKind::from_sample(rng.gen::<f64>()))
            .collect();

        Self {
            rows: rows.get(),
            columns: columns.get(),
            cells,
        }
    }

    /// Builds a grid from explicit row-major cells.
    pub fn from_cells(rows: u32, columns: u32, cells: Vec<TerrainKind>) -> Result<Self, GridError> {
        if cell_count(rows, columns)? != cells.len() {
            return Err(GridError::InvalidDimensions { rows, columns });
        }

        Ok(Self {
            rows,
            columns,
            cells,
        })
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

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub fn is_within_bounds(&self, position: Position) -> bool {
        self.view().is_within_bounds(position)
    }

    /// Terrain stored at the position.
    pub fn terrain_at(&self, position: Position) -> Result<TerrainKind, GridError> {
        self.view().terrain_at(position)
    }

    /// Captures a read-only view of the terrain.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.rows, self.columns)
    }
}

fn cell_count(rows: u32, columns: u32) -> Result<usize, GridError> {
    if rows == 0 || columns == 0 {
        return Err(GridError::InvalidDimensions { rows, columns });
    }

    usize::try_from(rows)
        .ok()
        .zip(usize::try_from(columns).ok())
        .and_then(|(rows, columns)| rows.checked_mul(columns))
        .ok_or(GridError::InvalidDimensions { rows, columns })
}

/// Errors that can occur while parsing a grid from its glyph form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseGridError {
    /// The text contained no rows.
    #[error("grid text is empty")]
    Empty,
    /// A character did not correspond to any terrain kind.
    #[error("unknown terrain glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Row containing the character.
        row: usize,
        /// Column containing the character.
        column: usize,
    },
    /// A row had a different width than the first row.
    #[error("row {row} has {found} cells but {expected} were expected")]
    Ragged {
        /// Row with the unexpected width.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The parsed shape could not be represented.
    #[error(transparent)]
    Shape(#[from] GridError),
}

impl FromStr for Grid {
    type Err = ParseGridError;

    /// Parses one row per non-blank line using [`TerrainKind::glyph`]
    /// characters. Surrounding whitespace on each line is ignored.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(ParseGridError::Empty);
        };
        let width = first.chars().count();

        let mut cells = Vec::with_capacity(width * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(ParseGridError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                let terrain = TerrainKind::from_glyph(glyph).ok_or(ParseGridError::UnknownGlyph {
                    glyph,
                    row,
                    column,
                })?;
                cells.push(terrain);
            }
        }

        let rows = u32::try_from(lines.len()).unwrap_or(u32::MAX);
        let columns = u32::try_from(width).unwrap_or(u32::MAX);
        Ok(Self::from_cells(rows, columns, cells)?)
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.view().iter_rows() {
            for terrain in row {
                write!(f, "{}", terrain.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
