use serde::{Deserialize, Serialize};

use crate::entity::Arena;

use super::block::{BasicBlock, BlockId};
use super::icode::IcodeStore;
use super::interval::DerivedSeq;

/// A procedure under analysis: its basic blocks, instruction store,
/// DFS-last index and derived interval sequence.
///
/// The structuring pass expects DFS numbering populated on every block and
/// `dfs_last` covering all of them; use [`CfgBuilder`](super::builder::CfgBuilder)
/// to construct well-formed procedures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub blocks: Arena<BlockId, BasicBlock>,
    pub icode: IcodeStore,
    /// Entry block — always the first block.
    pub entry: BlockId,
    /// `dfs_last[k]` is the block visited `k`-th on the last visit of the
    /// depth-first traversal. Compound-condition merges may re-point a slot
    /// at the surviving block.
    pub dfs_last: Vec<BlockId>,
    /// Whether any block is a multi-way branch.
    pub has_case: bool,
    pub derived: DerivedSeq,
}

impl Procedure {
    pub fn num_blocks(&self) -> usize {
        self.dfs_last.len()
    }

    /// The block occupying slot `n` of the DFS-last index.
    pub fn block_at(&self, n: usize) -> &BasicBlock {
        &self.blocks[self.dfs_last[n]]
    }

    pub fn block_at_mut(&mut self, n: usize) -> &mut BasicBlock {
        let id = self.dfs_last[n];
        &mut self.blocks[id]
    }
}
