//! Case (multi-way selection) structurer.
//!
//! Headers are processed in reverse DFS-last order so inner cases are
//! annotated before an outer case walks over them; the traversal marker is
//! never reset, which is what stops the outer walk at inner members.

use crate::ir::{BlockId, NodeType, Procedure, Traversed};

/// Assign `case_tail` and case membership for every multi-way header.
/// Invoked only for procedures that contain a multi-way branch.
pub(crate) fn struct_cases(proc: &mut Procedure) {
    for head in (0..proc.num_blocks()).rev() {
        if proc.block_at(head).node_type != NodeType::MultiWay {
            continue;
        }

        // The exit is a descendant immediately dominated by the header but
        // not directly targeted by it; the one with the most in-edges wins,
        // first encountered on ties.
        let mut exit: Option<usize> = None;
        for j in head + 2..proc.num_blocks() {
            if is_successor(proc, j, head) || proc.block_at(j).immed_dom != Some(head) {
                continue;
            }
            match exit {
                None => exit = Some(j),
                Some(e) if proc.block_at(e).in_edges.len() < proc.block_at(j).in_edges.len() => {
                    exit = Some(j)
                }
                _ => {}
            }
        }
        proc.block_at_mut(head).case_tail = exit;

        let mut members = vec![head];
        proc.block_at_mut(head).case_head = Some(head);
        let succs = proc.block_at(head).edges.clone();
        for succ in succs {
            tag_nodes_in_case(proc, succ, &mut members, head, exit);
        }
        if let Some(e) = exit {
            proc.block_at_mut(e).case_head = Some(head);
        }
    }
}

/// Whether the block at DFS-last slot `s` is a direct successor of the
/// header at slot `h`.
fn is_successor(proc: &Procedure, s: usize, h: usize) -> bool {
    proc.block_at(h)
        .edges
        .iter()
        .any(|&e| proc.blocks[e].dfs_last_num == s)
}

/// Recursively tag descendants of a case header. A node joins the case when
/// it is not the exit, not itself a multi-way header, and its immediate
/// dominator is already a member.
fn tag_nodes_in_case(
    proc: &mut Procedure,
    bb: BlockId,
    members: &mut Vec<usize>,
    head: usize,
    tail: Option<usize>,
) {
    proc.blocks[bb].traversed = Traversed::Case;
    let current = proc.blocks[bb].dfs_last_num;
    let dominated = proc.blocks[bb]
        .immed_dom
        .is_some_and(|d| members.contains(&d));
    if Some(current) != tail && proc.blocks[bb].node_type != NodeType::MultiWay && dominated {
        members.push(current);
        proc.blocks[bb].case_head = Some(head);
        let succs = proc.blocks[bb].edges.clone();
        for succ in succs {
            if proc.blocks[succ].traversed != Traversed::Case {
                tag_nodes_in_case(proc, succ, members, head, tail);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CfgBuilder, NodeType};
    use crate::structure::dominators::find_immed_dom;

    /// h switches to c1/c2/c3, all falling through to x: every arm and the
    /// exit itself belong to the case, and x is the tail.
    #[test]
    fn three_arm_case_with_common_exit() {
        let mut cb = CfgBuilder::new("switch3");
        let h = cb.block(NodeType::MultiWay);
        let c1 = cb.block(NodeType::OneWay);
        let c2 = cb.block(NodeType::OneWay);
        let c3 = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(h, c1);
        cb.edge(h, c2);
        cb.edge(h, c3);
        cb.edge(c1, x);
        cb.edge(c2, x);
        cb.edge(c3, x);
        let mut proc = cb.finish();

        find_immed_dom(&mut proc);
        struct_cases(&mut proc);

        let head = proc.blocks[h].dfs_last_num;
        assert_eq!(
            proc.blocks[h].case_tail,
            Some(proc.blocks[x].dfs_last_num)
        );
        for id in [c1, c2, c3, x] {
            assert_eq!(proc.blocks[id].case_head, Some(head));
        }
        assert_eq!(proc.blocks[h].case_head, Some(head));
    }

    /// A direct successor of the header never qualifies as the exit, even
    /// when it is immediately dominated by the header.
    #[test]
    fn direct_successor_not_chosen_as_exit() {
        // h → (c1, c2, x); c1 → x; c2 → x. x is a direct successor (the
        // default arm) and also the join of the other arms.
        let mut cb = CfgBuilder::new("default_arm");
        let h = cb.block(NodeType::MultiWay);
        let c1 = cb.block(NodeType::OneWay);
        let c2 = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(h, c1);
        cb.edge(h, c2);
        cb.edge(h, x);
        cb.edge(c1, x);
        cb.edge(c2, x);
        let mut proc = cb.finish();

        find_immed_dom(&mut proc);
        struct_cases(&mut proc);

        assert_eq!(proc.blocks[h].case_tail, None);
        assert_eq!(proc.blocks[c1].case_head, Some(0));
        assert_eq!(proc.blocks[c2].case_head, Some(0));
    }

    /// Ties on in-edge count keep the first candidate in DFS-last order.
    #[test]
    fn exit_tie_keeps_first_candidate() {
        // h → (a, b); a → (p, q); b → (p, q). Both p and q are dominated by
        // h with two in-edges each; the smaller DFS-last number wins.
        let mut cb = CfgBuilder::new("tie");
        let h = cb.block(NodeType::MultiWay);
        let a = cb.block(NodeType::TwoWay);
        let b = cb.block(NodeType::TwoWay);
        let p = cb.block(NodeType::Return);
        let q = cb.block(NodeType::Return);
        cb.edge(h, a);
        cb.edge(h, b);
        cb.edge(a, p);
        cb.edge(a, q);
        cb.edge(b, p);
        cb.edge(b, q);
        let mut proc = cb.finish();

        find_immed_dom(&mut proc);
        struct_cases(&mut proc);

        let first = proc.blocks[p]
            .dfs_last_num
            .min(proc.blocks[q].dfs_last_num);
        assert_eq!(proc.blocks[h].case_tail, Some(first));
    }

    /// An inner case keeps its own members and exit when an outer case is
    /// structured afterwards; the outer walk stops at the inner header.
    #[test]
    fn nested_case_membership_is_preserved() {
        // outer → (inner, a); inner → (i1, i2) → ix → x; a → x.
        let mut cb = CfgBuilder::new("nested");
        let outer = cb.block(NodeType::MultiWay);
        let inner = cb.block(NodeType::MultiWay);
        let a = cb.block(NodeType::OneWay);
        let i1 = cb.block(NodeType::OneWay);
        let i2 = cb.block(NodeType::OneWay);
        let ix = cb.block(NodeType::OneWay);
        let x = cb.block(NodeType::Return);
        cb.edge(outer, inner);
        cb.edge(outer, a);
        cb.edge(inner, i1);
        cb.edge(inner, i2);
        cb.edge(i1, ix);
        cb.edge(i2, ix);
        cb.edge(ix, x);
        cb.edge(a, x);
        let mut proc = cb.finish();

        find_immed_dom(&mut proc);
        struct_cases(&mut proc);

        let inner_head = proc.blocks[inner].dfs_last_num;
        let outer_head = proc.blocks[outer].dfs_last_num;
        assert_eq!(proc.blocks[i1].case_head, Some(inner_head));
        assert_eq!(proc.blocks[i2].case_head, Some(inner_head));
        assert_eq!(proc.blocks[a].case_head, Some(outer_head));
        assert_eq!(
            proc.blocks[inner].case_tail,
            Some(proc.blocks[ix].dfs_last_num)
        );
        assert_eq!(
            proc.blocks[outer].case_tail,
            Some(proc.blocks[x].dfs_last_num)
        );
        // The inner header itself stays a member of its own case, not the
        // outer one.
        assert_eq!(proc.blocks[inner].case_head, Some(inner_head));
        assert_eq!(proc.blocks[ix].case_head, Some(inner_head));
        assert_eq!(proc.blocks[x].case_head, Some(outer_head));
    }
}
