use serde::{Deserialize, Serialize};

use crate::define_entity;
use crate::entity::Arena;

use super::block::BlockId;

define_entity! {
    /// Arena id of an interval within a derived sequence.
    IntervalId
}

/// A node of a derived-sequence graph: an original block in G1, or a
/// collapsed interval of the previous level above that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalNode {
    Block(BlockId),
    Interval(IntervalId),
}

/// A single-entry group of nodes at one derived-sequence level.
/// The header is the first node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    pub nodes: Vec<IntervalNode>,
}

/// The derived sequence G1, G2, … of a procedure. Level `k` holds the
/// intervals the graph G(k+1) was collapsed from; level 0 partitions the
/// original blocks. The sequence is computed by the interval pass upstream
/// and only consumed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedSeq {
    pub intervals: Arena<IntervalId, Interval>,
    pub levels: Vec<Vec<IntervalId>>,
}

impl DerivedSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interval to `level` (0-based), growing the sequence as
    /// needed. Level-0 nodes must be blocks; higher levels collapse
    /// intervals of the level below.
    pub fn add_interval(&mut self, level: usize, nodes: Vec<IntervalNode>) -> IntervalId {
        assert!(!nodes.is_empty(), "an interval needs at least a header");
        if level == 0 {
            debug_assert!(nodes.iter().all(|n| matches!(n, IntervalNode::Block(_))));
        }
        let id = self.intervals.push(Interval { nodes });
        if level >= self.levels.len() {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(id);
        id
    }

    /// The interval's header as an original G1 block, found by descending
    /// through first nodes.
    pub fn g1_header(&self, id: IntervalId) -> BlockId {
        match self.intervals[id].nodes[0] {
            IntervalNode::Block(b) => b,
            IntervalNode::Interval(inner) => self.g1_header(inner),
        }
    }

    /// Every original G1 block contained in the interval, in traversal order.
    pub fn g1_members(&self, id: IntervalId) -> Vec<BlockId> {
        let mut out = Vec::new();
        self.collect_members(id, &mut out);
        out
    }

    fn collect_members(&self, id: IntervalId, out: &mut Vec<BlockId>) {
        for node in &self.intervals[id].nodes {
            match *node {
                IntervalNode::Block(b) => out.push(b),
                IntervalNode::Interval(inner) => self.collect_members(inner, out),
            }
        }
    }
}
