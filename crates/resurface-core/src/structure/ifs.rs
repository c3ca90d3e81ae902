//! Two-way (if/else) structurer.
//!
//! Scans in reverse DFS-last order so nested branches are seen before the
//! ones enclosing them. A branch with no qualifying follow of its own waits
//! on the unresolved queue until an enclosing branch finds one; nested ifs
//! then share the outer follow.

use crate::ir::{NodeType, Procedure, JX_LOOP};

/// Assign `if_follow` to two-way branches that are not loop branches
/// (their final instruction does not carry the loop flag).
pub(crate) fn struct_ifs(proc: &mut Procedure) {
    let mut unresolved: Vec<usize> = Vec::new();

    for curr in (0..proc.num_blocks()).rev() {
        let blk = proc.block_at(curr);
        if blk.invalid || blk.node_type != NodeType::TwoWay {
            continue;
        }
        if proc.icode.ll_flag(blk.last_icode()) & JX_LOOP != 0 {
            continue;
        }

        // The follow candidate is the immediate dominee with the most
        // incoming forward edges; ties keep the last one encountered.
        let mut follow: Option<usize> = None;
        let mut follow_in_edges: isize = 0;
        for desc in curr + 1..proc.num_blocks() {
            let d = proc.block_at(desc);
            if d.immed_dom != Some(curr) {
                continue;
            }
            let effective = d.in_edges.len() as isize - d.num_back_edges as isize;
            if effective >= follow_in_edges {
                follow = Some(desc);
                follow_in_edges = effective;
            }
        }

        // Only a join of two or more forward paths qualifies; otherwise the
        // branch waits for an enclosing one to resolve it.
        if let (Some(follow), true) = (follow, follow_in_edges > 1) {
            proc.block_at_mut(curr).if_follow = Some(follow);
            for unres in unresolved.drain(..) {
                proc.block_at_mut(unres).if_follow = Some(follow);
            }
        } else {
            unresolved.push(curr);
        }
    }
}
