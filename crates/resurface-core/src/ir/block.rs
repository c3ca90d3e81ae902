use serde::{Deserialize, Serialize};

use crate::define_entity;

define_entity! {
    /// Arena id of a basic block within its procedure.
    BlockId
}

/// Out-edge index of the THEN branch of a two-way block.
pub const THEN: usize = 0;
/// Out-edge index of the ELSE branch of a two-way block.
pub const ELSE: usize = 1;

/// Terminator classification of a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Unconditional jump.
    OneWay,
    /// Conditional jump; out-edge [`THEN`] is taken, [`ELSE`] falls through.
    TwoWay,
    /// Indexed jump with one out-edge per case target.
    MultiWay,
    Return,
    /// Single-instruction block looping on itself (repeated string ops).
    LoopSelf,
    Call,
    FallThrough,
}

/// Loop classification assigned by the loop structurer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopType {
    /// Exit branch at the header (`while`).
    PreTest,
    /// Exit branch at the latch (`do .. while`).
    PostTest,
    /// No exit branch (`for (;;)`).
    Endless,
}

/// DFS marker used while tagging case bodies. The marker is never reset
/// within a structuring run; reverse header order relies on inner-case
/// marks stopping an outer case's traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Traversed {
    #[default]
    None,
    Case,
}

/// A basic block plus the structural annotations the structuring pass
/// fills in. Annotation indices are DFS-last numbers, the stable identity
/// of a block within its procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub node_type: NodeType,
    /// First instruction of the block in the procedure's icode store.
    pub start: usize,
    /// Number of instructions in the block.
    pub len: usize,
    pub in_edges: Vec<BlockId>,
    /// Out-edges, in [`THEN`]/[`ELSE`] order for two-way blocks and case
    /// order for multi-way blocks.
    pub edges: Vec<BlockId>,
    /// Pre-order DFS number.
    pub dfs_first_num: usize,
    /// Reverse-finish-order DFS number; also this block's slot in the
    /// procedure's `dfs_last` index.
    pub dfs_last_num: usize,
    /// Back edges targeting this block, tallied during latch discovery.
    pub num_back_edges: usize,
    /// DFS-last number of the immediate dominator; `None` for the entry.
    pub immed_dom: Option<usize>,
    /// DFS-last number of the innermost enclosing loop header.
    pub loop_head: Option<usize>,
    pub loop_type: Option<LoopType>,
    /// First block after the loop. `None` while `loop_type` is set means an
    /// endless loop with no exit at all.
    pub loop_follow: Option<usize>,
    /// DFS-last number of the latching block (set on loop headers).
    pub latch_node: Option<usize>,
    /// DFS-last number of the enclosing case header.
    pub case_head: Option<usize>,
    /// DFS-last number of the case exit block (set on case headers).
    pub case_tail: Option<usize>,
    /// DFS-last number of the follow of a two-way branch.
    pub if_follow: Option<usize>,
    pub traversed: Traversed,
    /// Set when the block is absorbed by a compound-condition merge.
    /// Invalid blocks keep their DFS numbers but are skipped downstream.
    pub invalid: bool,
    /// Set on the unique block closing each structured loop.
    pub is_latch: bool,
}

impl BasicBlock {
    pub fn new(node_type: NodeType, start: usize, len: usize) -> Self {
        BasicBlock {
            node_type,
            start,
            len,
            in_edges: Vec::new(),
            edges: Vec::new(),
            dfs_first_num: 0,
            dfs_last_num: 0,
            num_back_edges: 0,
            immed_dom: None,
            loop_head: None,
            loop_type: None,
            loop_follow: None,
            latch_node: None,
            case_head: None,
            case_tail: None,
            if_follow: None,
            traversed: Traversed::None,
            invalid: false,
            is_latch: false,
        }
    }

    /// Index of the block's final instruction, where loop flags land.
    pub fn last_icode(&self) -> usize {
        self.start + self.len - 1
    }
}
