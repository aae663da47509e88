#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resource-constrained A* search over the battery maze terrain.
//!
//! Nodes are ranked by the step cost of the cell being entered plus the
//! Manhattan distance to the goal; the cost accumulated along the way is not
//! part of the score. Battery drain is tracked separately and a neighbour is
//! only generated when entering it leaves a non-negative budget.

mod node;

use std::collections::HashMap;

use battery_maze_core::{
    Command, Direction, Event, GridError, GridView, Path, Position, PruningStrategy, SolveOutcome,
    SolveRequest, TerrainKind,
};
use tracing::{debug, info, warn};

use node::{Frontier, NodeArena, NodeId, SearchNode};

/// Pure system that answers solve requests with recorded paths.
#[derive(Debug, Default)]
pub struct Solver {
    strategy: PruningStrategy,
}

impl Solver {
    /// Creates a solver that prunes duplicate frontier entries with `strategy`.
    #[must_use]
    pub fn new(strategy: PruningStrategy) -> Self {
        Self { strategy }
    }

    /// Consumes world events and emits a [`Command::RecordPath`] for every
    /// solve request.
    pub fn handle(&mut self, events: &[Event], grid: GridView<'_>, out: &mut Vec<Command>) {
        for event in events {
            let Event::SolveRequested { revision, request } = event else {
                continue;
            };

            let outcome = match solve(grid, *request, self.strategy) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(%error, "solve request does not fit the grid");
                    SolveOutcome::not_found(request.battery, 0)
                }
            };

            out.push(Command::RecordPath {
                revision: *revision,
                outcome,
            });
        }
    }
}

/// Searches for a path from `request.start` to `request.goal`.
///
/// Fails only when an endpoint lies outside the grid. An unreachable goal,
/// including one that would exhaust the battery, is reported through
/// [`SolveOutcome::is_found`].
pub fn solve(
    grid: GridView<'_>,
    request: SolveRequest,
    strategy: PruningStrategy,
) -> Result<SolveOutcome, GridError> {
    solve_until(grid, request, strategy, || false)
}

/// Same as [`solve`], but polls `should_abort` before every expansion.
///
/// An aborted search reports the goal as unreachable rather than returning a
/// partial path.
pub fn solve_until<F>(
    grid: GridView<'_>,
    request: SolveRequest,
    strategy: PruningStrategy,
    should_abort: F,
) -> Result<SolveOutcome, GridError>
where
    F: FnMut() -> bool,
{
    let start_terrain = grid.terrain_at(request.start)?;
    let goal_terrain = grid.terrain_at(request.goal)?;

    if !start_terrain.is_passable() || !goal_terrain.is_passable() {
        debug!(start = %request.start, goal = %request.goal, "endpoint is a wall");
        return Ok(SolveOutcome::not_found(request.battery, 0));
    }

    let outcome = Search::new(grid, request, strategy).run(should_abort);
    if outcome.is_found() {
        info!(
            start = %request.start,
            goal = %request.goal,
            expanded = outcome.expanded(),
            final_battery = outcome.final_battery(),
            "path found"
        );
    } else {
        info!(
            start = %request.start,
            goal = %request.goal,
            expanded = outcome.expanded(),
            battery = request.battery,
            "no path found or battery depleted"
        );
    }
    Ok(outcome)
}

fn heuristic(cell: Position, goal: Position) -> f64 {
    f64::from(cell.manhattan_distance(goal))
}

struct Search<'a> {
    grid: GridView<'a>,
    request: SolveRequest,
    strategy: PruningStrategy,
    arena: NodeArena,
    frontier: Frontier,
    closed: Vec<bool>,
    best_scores: HashMap<Position, f64>,
    expanded: usize,
}

impl<'a> Search<'a> {
    fn new(grid: GridView<'a>, request: SolveRequest, strategy: PruningStrategy) -> Self {
        Self {
            grid,
            request,
            strategy,
            arena: NodeArena::default(),
            frontier: Frontier::default(),
            closed: vec![false; grid.cell_count()],
            best_scores: HashMap::new(),
            expanded: 0,
        }
    }

    fn run<F>(mut self, mut should_abort: F) -> SolveOutcome
    where
        F: FnMut() -> bool,
    {
        let start = self.request.start;
        self.enqueue(SearchNode {
            position: start,
            priority: heuristic(start, self.request.goal),
            parent: None,
            battery: self.request.battery,
        });

        loop {
            if should_abort() {
                debug!(expanded = self.expanded, "search aborted");
                return SolveOutcome::not_found(self.request.battery, self.expanded);
            }

            let Some(current) = self.frontier.pop() else {
                return SolveOutcome::not_found(self.request.battery, self.expanded);
            };
            self.expanded += 1;

            let node = *self.arena.get(current);
            if node.position == self.request.goal {
                let path = Path::from_cells(self.arena.trace(current));
                return SolveOutcome::found(path, node.battery, self.expanded);
            }

            let Some(closed) = self
                .grid
                .index(node.position)
                .and_then(|index| self.closed.get_mut(index))
            else {
                continue;
            };
            if *closed {
                continue;
            }
            *closed = true;

            debug!(
                cell = %node.position,
                priority = node.priority,
                battery = node.battery,
                "expanding node"
            );
            self.expand(current, node);
        }
    }

    fn expand(&mut self, current: NodeId, node: SearchNode) {
        let rows = self.grid.rows();
        let columns = self.grid.columns();
        let Ok(current_terrain) = self.grid.terrain_at(node.position) else {
            return;
        };

        for direction in Direction::ALL {
            let Some(neighbor) = node.position.neighbor(direction, rows, columns) else {
                continue;
            };
            let Ok(terrain) = self.grid.terrain_at(neighbor) else {
                continue;
            };
            if !terrain.is_passable() || self.is_closed(neighbor) {
                continue;
            }

            if current_terrain == TerrainKind::Water && terrain == TerrainKind::Water {
                debug!(cell = %neighbor, "neighbor rejected: consecutive water");
                continue;
            }

            let Some(battery) = node.battery.checked_sub(terrain.resource_consumption()) else {
                debug!(cell = %neighbor, battery = node.battery, "neighbor rejected: battery depleted");
                continue;
            };

            let priority = terrain.movement_cost() + heuristic(neighbor, self.request.goal);
            if self.is_redundant(neighbor, priority) {
                continue;
            }

            self.enqueue(SearchNode {
                position: neighbor,
                priority,
                parent: Some(current),
                battery,
            });
        }
    }

    fn is_closed(&self, position: Position) -> bool {
        self.grid
            .index(position)
            .and_then(|index| self.closed.get(index))
            .is_some_and(|closed| *closed)
    }

    fn is_redundant(&self, position: Position, priority: f64) -> bool {
        match self.strategy {
            PruningStrategy::FrontierScan => {
                self.frontier.holds_at_most(&self.arena, position, priority)
            }
            PruningStrategy::BestScoreMap => self
                .best_scores
                .get(&position)
                .is_some_and(|best| *best <= priority),
        }
    }

    fn enqueue(&mut self, node: SearchNode) {
        if self.strategy == PruningStrategy::BestScoreMap {
            let _ = self.best_scores.insert(node.position, node.priority);
        }
        let id = self.arena.insert(node);
        self.frontier.push(id, node.priority);
    }
}
