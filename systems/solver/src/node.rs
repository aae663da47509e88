//! Arena-backed search nodes and the frontier that orders them.

use std::{cmp::Ordering, collections::BinaryHeap};

use battery_maze_core::Position;

/// Handle into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

/// One point on an explored path.
///
/// Nodes are written once and never mutated, so the parent links always form
/// a tree rooted at the start node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchNode {
    pub(crate) position: Position,
    pub(crate) priority: f64,
    pub(crate) parent: Option<NodeId>,
    pub(crate) battery: u32,
}

/// Flat storage for every node created during one search.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<SearchNode>,
}

impl NodeArena {
    pub(crate) fn insert(&mut self, node: SearchNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    /// Walks parent links from `tail` back to the root and returns the
    /// positions in root-to-tail order.
    pub(crate) fn trace(&self, tail: NodeId) -> Vec<Position> {
        let mut cells = Vec::new();
        let mut cursor = Some(tail);
        while let Some(id) = cursor {
            let node = self.get(id);
            cells.push(node.position);
            cursor = node.parent;
        }
        cells.reverse();
        cells
    }
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    priority: f64,
    sequence: u64,
    node: NodeId,
}

// `BinaryHeap` is a max-heap, so both keys are flipped: the lowest priority
// wins and equal priorities fall back to insertion order.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

/// Min-priority queue of node handles with deterministic tie breaking.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_sequence: u64,
}

impl Frontier {
    pub(crate) fn push(&mut self, id: NodeId, priority: f64) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(FrontierEntry {
            priority,
            sequence,
            node: id,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|entry| entry.node)
    }

    /// Reports whether a queued entry for `position` already scores at most
    /// `priority`.
    pub(crate) fn holds_at_most(&self, arena: &NodeArena, position: Position, priority: f64) -> bool {
        self.heap
            .iter()
            .any(|entry| entry.priority <= priority && arena.get(entry.node).position == position)
    }
}
