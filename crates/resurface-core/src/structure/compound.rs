//! Compound-condition collapser.
//!
//! Merges a two-way branch with a single-statement two-way neighbor it
//! solely feeds into one branch carrying a short-circuit condition. The
//! four shapes correspond to `X || Y`, `!X && Y`, `X && Y` and `!X || Y`.
//! Runs forward scans over the DFS-last index to a fixed point; absorbed
//! blocks are marked invalid and their expression slots emptied.

use crate::ir::{BlockId, BoolOp, Cond, NodeType, Procedure, ELSE, THEN};

pub(crate) fn compound_conds(proc: &mut Procedure) {
    let mut change = true;
    while change {
        change = false;

        // Postorder walk, so the header of a compound condition is analysed
        // before the blocks it absorbs.
        let mut i = 0;
        while i < proc.num_blocks() {
            let p = proc.dfs_last[i];
            if proc.blocks[p].invalid || proc.blocks[p].node_type != NodeType::TwoWay {
                i += 1;
                continue;
            }
            let t = proc.blocks[p].edges[THEN];
            let e = proc.blocks[p].edges[ELSE];

            let absorbed = if mergeable(proc, t) && proc.blocks[t].edges[ELSE] == e {
                // (X || Y): THEN neighbor shares the ELSE target.
                let cont = proc.blocks[t].edges[THEN];
                merge(proc, p, t, e, cont, false, BoolOp::Or, cont, e);
                Some(t)
            } else if mergeable(proc, t) && proc.blocks[t].edges[THEN] == e {
                // (!X && Y): THEN neighbor jumps back across to the ELSE
                // target, so the first condition reads inverted.
                let cont = proc.blocks[t].edges[ELSE];
                merge(proc, p, t, e, cont, true, BoolOp::And, e, cont);
                Some(t)
            } else if mergeable(proc, e) && proc.blocks[e].edges[THEN] == t {
                // (X && Y): ELSE neighbor shares the THEN target.
                let cont = proc.blocks[e].edges[ELSE];
                merge(proc, p, e, t, cont, false, BoolOp::And, t, cont);
                Some(e)
            } else if mergeable(proc, e) && proc.blocks[e].edges[ELSE] == t {
                // (!X || Y): ELSE neighbor jumps back across to the THEN
                // target.
                let cont = proc.blocks[e].edges[THEN];
                merge(proc, p, e, t, cont, true, BoolOp::Or, cont, t);
                Some(e)
            } else {
                None
            };

            match absorbed {
                Some(absorbed) => {
                    change = true;
                    if proc.blocks[p].is_latch {
                        // Keep the DFS-last index dense: the absorbed slot
                        // now answers with the surviving merger.
                        let slot = proc.blocks[absorbed].dfs_last_num;
                        proc.dfs_last[slot] = p;
                        i += 1;
                    }
                    // Otherwise stay on this index — the merged branch may
                    // chain with its new neighbor.
                }
                None => i += 1,
            }
        }
    }
}

/// A neighbor can be absorbed when it is a two-way branch holding exactly
/// one high-level instruction and the merging branch is its only
/// predecessor.
fn mergeable(proc: &Procedure, b: BlockId) -> bool {
    let blk = &proc.blocks[b];
    blk.node_type == NodeType::TwoWay
        && proc.icode.hl_count(blk.start, blk.len) == 1
        && blk.in_edges.len() == 1
}

/// Fold `absorbed`'s condition into `p`'s jump and splice the edges:
/// `cont` (the absorbed block's surviving target) inherits `p` as
/// predecessor, `shared` (the target both blocks reached) loses the
/// absorbed block's arc, and `p`'s out-edges become `new_then`/`new_else`.
#[allow(clippy::too_many_arguments)]
fn merge(
    proc: &mut Procedure,
    p: BlockId,
    absorbed: BlockId,
    shared: BlockId,
    cont: BlockId,
    invert_first: bool,
    op: BoolOp,
    new_then: BlockId,
    new_else: BlockId,
) {
    let p_jump = proc.blocks[p].last_icode();
    let a_jump = proc.blocks[absorbed].last_icode();
    let mut lhs = proc.icode.take_cond(p_jump);
    if invert_first {
        lhs.invert();
    }
    let rhs = proc.icode.take_cond(a_jump);
    proc.icode.put_cond(p_jump, Cond::combine(lhs, rhs, op));

    replace_in_edge(proc, cont, absorbed, p);
    proc.blocks[p].edges[THEN] = new_then;
    proc.blocks[p].edges[ELSE] = new_else;
    remove_in_edge(proc, shared, absorbed);
    proc.blocks[absorbed].invalid = true;
}

/// Replace the in-edge of `target` referencing `old` with `new`.
fn replace_in_edge(proc: &mut Procedure, target: BlockId, old: BlockId, new: BlockId) {
    let slot = proc.blocks[target]
        .in_edges
        .iter()
        .position(|&b| b == old)
        .expect("redirected in-edge not found");
    proc.blocks[target].in_edges[slot] = new;
}

/// Drop the in-edge of `target` coming from `pred`.
fn remove_in_edge(proc: &mut Procedure, target: BlockId, pred: BlockId) {
    let slot = proc.blocks[target]
        .in_edges
        .iter()
        .position(|&b| b == pred)
        .expect("removed in-edge not found");
    proc.blocks[target].in_edges.remove(slot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CfgBuilder, CmpKind, NodeType, Operand};

    fn cmp(kind: CmpKind, n: u32) -> Cond {
        Cond::Cmp {
            kind,
            lhs: Operand(n),
            rhs: Operand(n + 1),
        }
    }

    /// p → (t, e) with t → (x, e), t holding one statement and one in-edge:
    /// collapses to `p.cond || t.cond` targeting (x, e).
    #[test]
    fn or_pattern() {
        let mut cb = CfgBuilder::new("or");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.cond_block(cmp(CmpKind::Eq, 2));
        let e = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(t, x);
        cb.edge(t, e);
        cb.edge(e, x);
        let mut proc = cb.finish();

        compound_conds(&mut proc);

        assert!(proc.blocks[t].invalid);
        assert_eq!(proc.blocks[p].edges, vec![x, e]);
        assert_eq!(proc.blocks[e].in_edges, vec![p]);
        assert_eq!(proc.blocks[x].in_edges, vec![p, e]);
        let jump = proc.blocks[p].last_icode();
        assert_eq!(
            proc.icode.cond(jump),
            Some(&Cond::combine(
                cmp(CmpKind::Lt, 0),
                cmp(CmpKind::Eq, 2),
                BoolOp::Or
            ))
        );
        // The absorbed block's expression slot was emptied.
        assert!(proc.icode.cond(proc.blocks[t].last_icode()).is_none());
    }

    /// p → (t, e) with t → (e, y): the first condition inverts and the pair
    /// conjoins, targeting (e, y).
    #[test]
    fn not_and_pattern() {
        let mut cb = CfgBuilder::new("not_and");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.cond_block(cmp(CmpKind::Eq, 2));
        let e = cb.block(NodeType::OneWay);
        let y = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(t, e);
        cb.edge(t, y);
        cb.edge(e, y);
        let mut proc = cb.finish();

        compound_conds(&mut proc);

        assert!(proc.blocks[t].invalid);
        assert_eq!(proc.blocks[p].edges, vec![e, y]);
        assert_eq!(proc.blocks[e].in_edges, vec![p]);
        assert_eq!(proc.blocks[y].in_edges, vec![p, e]);
        let jump = proc.blocks[p].last_icode();
        assert_eq!(
            proc.icode.cond(jump),
            Some(&Cond::combine(
                cmp(CmpKind::Ge, 0),
                cmp(CmpKind::Eq, 2),
                BoolOp::And
            ))
        );
    }

    /// p → (t, e) with e → (t, z): plain conjunction on the ELSE side.
    #[test]
    fn and_pattern() {
        let mut cb = CfgBuilder::new("and");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.block(NodeType::OneWay);
        let e = cb.cond_block(cmp(CmpKind::Eq, 2));
        let z = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(e, t);
        cb.edge(e, z);
        cb.edge(t, z);
        let mut proc = cb.finish();

        compound_conds(&mut proc);

        assert!(proc.blocks[e].invalid);
        assert_eq!(proc.blocks[p].edges, vec![t, z]);
        assert_eq!(proc.blocks[t].in_edges, vec![p]);
        assert_eq!(proc.blocks[z].in_edges, vec![p, t]);
        let jump = proc.blocks[p].last_icode();
        assert_eq!(
            proc.icode.cond(jump),
            Some(&Cond::combine(
                cmp(CmpKind::Lt, 0),
                cmp(CmpKind::Eq, 2),
                BoolOp::And
            ))
        );
    }

    /// p → (t, e) with e → (w, t): the first condition inverts and the pair
    /// disjoins, targeting (w, t).
    #[test]
    fn not_or_pattern() {
        let mut cb = CfgBuilder::new("not_or");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.block(NodeType::OneWay);
        let e = cb.cond_block(cmp(CmpKind::Eq, 2));
        let w = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(e, w);
        cb.edge(e, t);
        cb.edge(t, w);
        let mut proc = cb.finish();

        compound_conds(&mut proc);

        assert!(proc.blocks[e].invalid);
        assert_eq!(proc.blocks[p].edges, vec![w, t]);
        assert_eq!(proc.blocks[t].in_edges, vec![p]);
        assert_eq!(proc.blocks[w].in_edges, vec![p, t]);
        let jump = proc.blocks[p].last_icode();
        assert_eq!(
            proc.icode.cond(jump),
            Some(&Cond::combine(
                cmp(CmpKind::Ge, 0),
                cmp(CmpKind::Eq, 2),
                BoolOp::Or
            ))
        );
    }

    /// A chain of single-statement neighbors folds into one nested
    /// disjunction by revisiting the merged branch.
    #[test]
    fn or_chain_collapses_to_fixed_point() {
        // p → (t1, e); t1 → (t2, e); t2 → (x, e).
        let mut cb = CfgBuilder::new("chain");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t1 = cb.cond_block(cmp(CmpKind::Eq, 2));
        let t2 = cb.cond_block(cmp(CmpKind::Gt, 4));
        let e = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(p, t1);
        cb.edge(p, e);
        cb.edge(t1, t2);
        cb.edge(t1, e);
        cb.edge(t2, x);
        cb.edge(t2, e);
        cb.edge(e, x);
        let mut proc = cb.finish();

        compound_conds(&mut proc);

        assert!(proc.blocks[t1].invalid);
        assert!(proc.blocks[t2].invalid);
        assert_eq!(proc.blocks[p].edges, vec![x, e]);
        assert_eq!(proc.blocks[e].in_edges, vec![p]);
        let jump = proc.blocks[p].last_icode();
        assert_eq!(
            proc.icode.cond(jump),
            Some(&Cond::combine(
                Cond::combine(cmp(CmpKind::Lt, 0), cmp(CmpKind::Eq, 2), BoolOp::Or),
                cmp(CmpKind::Gt, 4),
                BoolOp::Or
            ))
        );
    }

    /// Merging under a latch block re-points the absorbed DFS-last slot at
    /// the surviving merger instead of rescanning.
    #[test]
    fn latch_merge_repoints_dfs_slot() {
        let mut cb = CfgBuilder::new("latch");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.cond_block(cmp(CmpKind::Eq, 2));
        let e = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(t, x);
        cb.edge(t, e);
        cb.edge(e, x);
        let mut proc = cb.finish();
        proc.blocks[p].is_latch = true;

        compound_conds(&mut proc);

        assert!(proc.blocks[t].invalid);
        let t_slot = proc.blocks[t].dfs_last_num;
        assert_eq!(proc.dfs_last[t_slot], p);
    }

    /// Running the collapser again on its own output changes nothing.
    #[test]
    fn collapser_is_idempotent() {
        let mut cb = CfgBuilder::new("idem");
        let p = cb.cond_block(cmp(CmpKind::Lt, 0));
        let t = cb.cond_block(cmp(CmpKind::Eq, 2));
        let e = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(p, t);
        cb.edge(p, e);
        cb.edge(t, x);
        cb.edge(t, e);
        cb.edge(e, x);
        let mut proc = cb.finish();

        compound_conds(&mut proc);
        let once = serde_json::to_string(&proc).unwrap();
        compound_conds(&mut proc);
        let twice = serde_json::to_string(&proc).unwrap();
        assert_eq!(once, twice);
    }
}
