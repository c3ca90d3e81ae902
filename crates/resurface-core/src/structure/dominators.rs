//! Immediate-dominator solver.
//!
//! Iterative refinement over blocks in ascending DFS-last order, in the
//! style of Hecht and Ullman. Only forward-edge predecessors contribute;
//! on a reducible graph every dominator is a forward-edge ancestor, so
//! back edges can be ignored outright.

use crate::ir::Procedure;

/// Populate `immed_dom` on every non-invalid block. The graph is assumed
/// reducible; no detection is performed.
pub(crate) fn find_immed_dom(proc: &mut Procedure) {
    for curr in 0..proc.num_blocks() {
        if proc.block_at(curr).invalid {
            continue;
        }
        let preds = proc.block_at(curr).in_edges.clone();
        for pred in preds {
            let pred_num = proc.blocks[pred].dfs_last_num;
            if pred_num < curr {
                let merged = common_dom(proc.block_at(curr).immed_dom, Some(pred_num), proc);
                proc.block_at_mut(curr).immed_dom = merged;
            }
        }
    }
}

/// Find the common dominator of two candidates by walking both up the
/// partially built dominator tree, always lifting the larger DFS-last
/// number. `None` is the entry, which dominates everything.
fn common_dom(curr: Option<usize>, pred: Option<usize>, proc: &Procedure) -> Option<usize> {
    if curr.is_none() {
        return pred;
    }
    if pred.is_none() {
        return curr;
    }

    let mut curr = curr;
    let mut pred = pred;
    while let (Some(c), Some(p)) = (curr, pred) {
        if c == p {
            break;
        }
        if c < p {
            pred = proc.block_at(p).immed_dom;
        } else {
            curr = proc.block_at(c).immed_dom;
        }
    }
    curr
}
