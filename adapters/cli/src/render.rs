//! Plain-text rendering of the terrain with the planned route overlaid.

use battery_maze_core::{GridView, Position};

const START_GLYPH: char = 'S';
const GOAL_GLYPH: char = 'G';
const ROUTE_GLYPH: char = '*';

/// Renders one line per grid row. Route cells replace the terrain glyph.
pub(crate) fn overlay(
    view: GridView<'_>,
    route: &[Position],
    start: Position,
    goal: Position,
) -> String {
    let mut output = String::new();
    for (row, cells) in (0_u32..).zip(view.iter_rows()) {
        for (column, terrain) in (0_u32..).zip(cells) {
            let cell = Position::new(row, column);
            let glyph = if cell == start {
                START_GLYPH
            } else if cell == goal {
                GOAL_GLYPH
            } else if route.contains(&cell) {
                ROUTE_GLYPH
            } else {
                terrain.glyph()
            };
            output.push(glyph);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use battery_maze_core::TerrainKind::{Empty, Wall, Water};

    #[test]
    fn overlay_marks_endpoints_and_route() {
        let cells = [Empty, Water, Empty, Wall, Empty, Empty];
        let view = GridView::new(&cells, 2, 3);
        let route = [
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(1, 2),
        ];

        let rendered = overlay(view, &route, Position::new(0, 0), Position::new(1, 2));
        assert_eq!(rendered, "S**\n#.G\n");
    }
}
