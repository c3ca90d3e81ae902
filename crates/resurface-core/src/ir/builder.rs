use crate::entity::{Arena, EntityId};

use super::block::{BasicBlock, BlockId, NodeType};
use super::expr::Cond;
use super::icode::{Icode, IcodeStore};
use super::interval::DerivedSeq;
use super::proc::Procedure;

/// Builder for constructing a [`Procedure`]'s control-flow graph.
///
/// Creates blocks and edges, then assigns DFS numbering on [`finish`] —
/// the structuring pass expects both numberings populated up front. The
/// entry block is the first block created.
///
/// [`finish`]: CfgBuilder::finish
pub struct CfgBuilder {
    name: String,
    blocks: Arena<BlockId, BasicBlock>,
    icode: IcodeStore,
}

impl CfgBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        CfgBuilder {
            name: name.into(),
            blocks: Arena::new(),
            icode: IcodeStore::new(),
        }
    }

    /// Create a block with the given instructions appended to the store.
    /// A block always occupies at least one instruction slot, so an empty
    /// list still produces one raw instruction.
    pub fn block_with(&mut self, node_type: NodeType, icodes: Vec<Icode>) -> BlockId {
        let start = self.icode.len();
        let mut len = 0;
        for ic in icodes {
            self.icode.push(ic);
            len += 1;
        }
        if len == 0 {
            self.icode.push(Icode::default());
            len = 1;
        }
        self.blocks.push(BasicBlock::new(node_type, start, len))
    }

    /// Create a block with a single raw instruction.
    pub fn block(&mut self, node_type: NodeType) -> BlockId {
        self.block_with(node_type, Vec::new())
    }

    /// Create a two-way block whose single instruction is a conditional
    /// jump on `cond`.
    pub fn cond_block(&mut self, cond: Cond) -> BlockId {
        self.block_with(NodeType::TwoWay, vec![Icode::jcond(cond)])
    }

    /// Add an edge `from → to`, maintaining both edge lists. Out-edge order
    /// is THEN/ELSE order for two-way blocks.
    pub fn edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from].edges.push(to);
        self.blocks[to].in_edges.push(from);
    }

    /// Check arities, assign DFS numbering and build the procedure.
    ///
    /// # Panics
    /// Panics if a block's out-edge count does not match its node type, or
    /// if a block is unreachable from the entry.
    pub fn finish(mut self) -> Procedure {
        assert_ne!(self.blocks.len(), 0, "procedure has no blocks");
        let entry = BlockId::from_index(0);

        for (id, blk) in self.blocks.iter() {
            let ok = match blk.node_type {
                NodeType::TwoWay => blk.edges.len() == 2,
                NodeType::MultiWay => !blk.edges.is_empty(),
                NodeType::Return => blk.edges.is_empty(),
                // The implicit self-loop is not an edge; a jump target may
                // accompany the fall-through.
                NodeType::LoopSelf => matches!(blk.edges.len(), 1 | 2),
                _ => blk.edges.len() == 1,
            };
            assert!(
                ok,
                "block {id:?} has {} out-edges for node type {:?}",
                blk.edges.len(),
                blk.node_type
            );
        }

        let n = self.blocks.len();
        let mut visited = vec![false; n];
        let mut dfs_last = vec![entry; n];
        let mut first = 0;
        let mut last = n;
        dfs(
            &mut self.blocks,
            &mut visited,
            &mut dfs_last,
            &mut first,
            &mut last,
            entry,
        );
        assert!(
            visited.iter().all(|&v| v),
            "procedure contains blocks unreachable from the entry"
        );

        let has_case = self
            .blocks
            .values()
            .any(|b| b.node_type == NodeType::MultiWay);

        Procedure {
            name: self.name,
            blocks: self.blocks,
            icode: self.icode,
            entry,
            dfs_last,
            has_case,
            derived: DerivedSeq::new(),
        }
    }
}

/// Depth-first numbering: pre-order assigns `dfs_first_num`, the unwind
/// assigns `dfs_last_num` downward from the block count so the entry lands
/// at slot 0 of `dfs_last`.
fn dfs(
    blocks: &mut Arena<BlockId, BasicBlock>,
    visited: &mut [bool],
    dfs_last: &mut [BlockId],
    first: &mut usize,
    last: &mut usize,
    b: BlockId,
) {
    visited[b.index()] = true;
    blocks[b].dfs_first_num = *first;
    *first += 1;

    let succs = blocks[b].edges.clone();
    for s in succs {
        if !visited[s.index()] {
            dfs(blocks, visited, dfs_last, first, last, s);
        }
    }

    *last -= 1;
    blocks[b].dfs_last_num = *last;
    dfs_last[*last] = b;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// entry → (b, c) → d: numbering follows edge order, entry at slot 0.
    #[test]
    fn diamond_numbering() {
        let mut cb = CfgBuilder::new("diamond");
        let a = cb.block(NodeType::TwoWay);
        let b = cb.block(NodeType::OneWay);
        let c = cb.block(NodeType::OneWay);
        let d = cb.block(NodeType::Return);
        cb.edge(a, b);
        cb.edge(a, c);
        cb.edge(b, d);
        cb.edge(c, d);
        let proc = cb.finish();

        assert_eq!(proc.blocks[a].dfs_last_num, 0);
        assert_eq!(proc.blocks[c].dfs_last_num, 1);
        assert_eq!(proc.blocks[b].dfs_last_num, 2);
        assert_eq!(proc.blocks[d].dfs_last_num, 3);
        assert_eq!(proc.blocks[a].dfs_first_num, 0);
        assert_eq!(proc.blocks[b].dfs_first_num, 1);
        assert_eq!(proc.blocks[d].dfs_first_num, 2);
        assert_eq!(proc.blocks[c].dfs_first_num, 3);
        assert_eq!(proc.dfs_last, vec![a, c, b, d]);
        assert!(!proc.has_case);
        assert_eq!(proc.blocks[d].in_edges, vec![b, c]);
    }

    #[test]
    fn multiway_sets_has_case() {
        let mut cb = CfgBuilder::new("switch");
        let h = cb.block(NodeType::MultiWay);
        let c1 = cb.block(NodeType::Return);
        let c2 = cb.block(NodeType::Return);
        cb.edge(h, c1);
        cb.edge(h, c2);
        let proc = cb.finish();
        assert!(proc.has_case);
    }

    #[test]
    #[should_panic(expected = "out-edges")]
    fn two_way_needs_two_edges() {
        let mut cb = CfgBuilder::new("bad");
        let a = cb.block(NodeType::TwoWay);
        let b = cb.block(NodeType::Return);
        cb.edge(a, b);
        cb.finish();
    }

    #[test]
    #[should_panic(expected = "unreachable")]
    fn unreachable_block_rejected() {
        let mut cb = CfgBuilder::new("orphan");
        let _entry = cb.block(NodeType::Return);
        let _orphan = cb.block(NodeType::Return);
        cb.finish();
    }
}
