use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use battery_maze_core::{Command, Event, Position, TerrainKind};
use battery_maze_system_solver::Solver;
use battery_maze_world::{self as world, query, World};

#[test]
fn session_replay_is_deterministic() {
    let first = replay(script());
    let second = replay(script());

    assert_eq!(first, second, "session replay diverged");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, Event::GridGenerated { .. })),
        "expected the scripted grid to be generated"
    );
}

#[test]
fn regeneration_discards_in_flight_outcomes() {
    let mut world = World::new();
    let mut solver = Solver::default();
    let (start, goal) = endpoints(&world).expect("default grid has two open cells");

    let mut events = Vec::new();
    world::apply(&mut world, Command::SelectStart { cell: start }, &mut events);
    world::apply(&mut world, Command::SelectGoal { cell: goal }, &mut events);
    world::apply(&mut world, Command::RequestSolve { battery: 100 }, &mut events);

    let mut commands = Vec::new();
    solver.handle(&events, query::grid_view(&world), &mut commands);
    assert_eq!(commands.len(), 1);

    let mut regenerated = Vec::new();
    world::apply(
        &mut world,
        Command::GenerateGrid {
            rows: 6,
            columns: 6,
            seed: 0xdead_beef,
        },
        &mut regenerated,
    );

    let mut recorded = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut recorded);
    }

    assert!(recorded.is_empty(), "stale outcome must not be announced");
    assert!(query::last_outcome(&world).is_none());
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            match event {
                Event::PathFound {
                    path,
                    final_battery,
                } => {
                    path.cells().hash(&mut hasher);
                    final_battery.hash(&mut hasher);
                }
                Event::PathNotFound { battery } => battery.hash(&mut hasher),
                other => format!("{other:?}").hash(&mut hasher),
            }
        }
        hasher.finish()
    }
}

enum Step {
    Apply(Command),
    SelectEndpoints,
}

fn script() -> Vec<Step> {
    let mut steps = Vec::new();
    for (seed, battery) in [(1_u64, 10_u32), (2, 40), (3, 100), (4, 70), (5, 20)] {
        steps.push(Step::Apply(Command::GenerateGrid {
            rows: 10,
            columns: 10,
            seed,
        }));
        steps.push(Step::SelectEndpoints);
        steps.push(Step::Apply(Command::RequestSolve { battery }));
    }
    steps
}

fn replay(steps: Vec<Step>) -> ReplayOutcome {
    let mut world = World::new();
    let mut solver = Solver::default();
    let mut log = Vec::new();

    for step in steps {
        let commands = match step {
            Step::Apply(command) => vec![command],
            Step::SelectEndpoints => match endpoints(&world) {
                Some((start, goal)) => vec![
                    Command::SelectStart { cell: start },
                    Command::SelectGoal { cell: goal },
                ],
                None => Vec::new(),
            },
        };

        for command in commands {
            let mut generated = Vec::new();
            world::apply(&mut world, command, &mut generated);

            let mut answers = Vec::new();
            solver.handle(&generated, query::grid_view(&world), &mut answers);
            log.extend(generated);

            for answer in answers {
                world::apply(&mut world, answer, &mut log);
            }
        }
    }

    ReplayOutcome { events: log }
}

fn endpoints(world: &World) -> Option<(Position, Position)> {
    let view = query::grid_view(world);
    let open: Vec<Position> = (0..view.rows())
        .flat_map(|row| (0..view.columns()).map(move |column| Position::new(row, column)))
        .filter(|cell| view.terrain_at(*cell).is_ok_and(TerrainKind::is_passable))
        .collect();
    let start = *open.first()?;
    let goal = *open.last()?;
    (start != goal).then_some((start, goal))
}
