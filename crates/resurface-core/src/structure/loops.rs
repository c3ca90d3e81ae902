//! Loop structurer.
//!
//! Walks the derived interval sequence level by level. Each interval is
//! flattened back to its G1 blocks; the greatest back edge into the G1
//! header (if any) names the latch, and the loop induced by that pair is
//! classified and annotated. Loops discovered at lower levels keep their
//! nodes — an already-owned latch is never reclaimed.

use std::collections::HashSet;

use crate::ir::{BlockId, LoopType, NodeType, Procedure, ELSE, JX_LOOP, THEN};

pub(crate) fn struct_loops(proc: &mut Procedure) {
    // Snapshot each interval's G1 header and member set up front; the walk
    // below mutates the block arena the derived sequence refers to.
    let mut work: Vec<(BlockId, HashSet<BlockId>)> = Vec::new();
    for level in &proc.derived.levels {
        for &interval in level {
            let head = proc.derived.g1_header(interval);
            let members = proc.derived.g1_members(interval).into_iter().collect();
            work.push((head, members));
        }
    }

    for (head_id, members) in work {
        // Greatest enclosing back edge into the interval header.
        let mut latch: Option<BlockId> = None;
        let preds = proc.blocks[head_id].in_edges.clone();
        for pred in preds {
            if !members.contains(&pred) || !is_back_edge(proc, pred, head_id) {
                continue;
            }
            match latch {
                None => latch = Some(pred),
                Some(cur)
                    if proc.blocks[pred].dfs_last_num > proc.blocks[cur].dfs_last_num =>
                {
                    latch = Some(pred)
                }
                _ => {}
            }
        }

        let Some(latch_id) = latch else { continue };

        // The latch must sit at the same case-nesting level as the header
        // and must not already close another loop.
        if proc.blocks[latch_id].case_head != proc.blocks[head_id].case_head
            || proc.blocks[latch_id].loop_head.is_some()
        {
            continue;
        }

        proc.blocks[head_id].latch_node = Some(proc.blocks[latch_id].dfs_last_num);
        find_nodes_in_loop(proc, latch_id, head_id, &members);
        proc.blocks[latch_id].is_latch = true;
    }
}

/// Back-edge test: true when `pred` was first visited no earlier than
/// `head`. Counts the edge on the head's back-edge tally as a side effect;
/// the two-way structurer consumes that count.
fn is_back_edge(proc: &mut Procedure, pred: BlockId, head: BlockId) -> bool {
    if proc.blocks[pred].dfs_first_num >= proc.blocks[head].dfs_first_num {
        proc.blocks[head].num_back_edges += 1;
        return true;
    }
    false
}

/// Claim the nodes of the loop `(latch, head)` and classify it.
fn find_nodes_in_loop(
    proc: &mut Procedure,
    latch_id: BlockId,
    head_id: BlockId,
    members: &HashSet<BlockId>,
) {
    let head_dfs = proc.blocks[head_id].dfs_last_num;
    let latch_dfs = proc.blocks[latch_id].dfs_last_num;

    // Nodes between header and latch whose dominator is already inside the
    // loop, restricted to the interval.
    proc.blocks[head_id].loop_head = Some(head_dfs);
    let mut loop_nodes: HashSet<usize> = HashSet::new();
    loop_nodes.insert(head_dfs);
    for i in head_dfs + 1..latch_dfs {
        let bid = proc.dfs_last[i];
        if proc.blocks[bid].invalid {
            continue;
        }
        let dominated = proc.blocks[bid]
            .immed_dom
            .is_some_and(|d| loop_nodes.contains(&d));
        if dominated && members.contains(&bid) {
            loop_nodes.insert(i);
            if proc.blocks[bid].loop_head.is_none() {
                proc.blocks[bid].loop_head = Some(head_dfs);
            }
        }
    }
    proc.blocks[latch_id].loop_head = Some(head_dfs);
    if latch_id != head_id {
        loop_nodes.insert(latch_dfs);
    }

    let head_type = proc.blocks[head_id].node_type;
    let latch_type = proc.blocks[latch_id].node_type;

    if latch_type == NodeType::TwoWay {
        if head_type == NodeType::TwoWay || latch_id == head_id {
            let then_dfs = edge_dfs(proc, head_id, THEN);
            let else_dfs = edge_dfs(proc, head_id, ELSE);
            if latch_id == head_id
                || (loop_nodes.contains(&then_dfs) && loop_nodes.contains(&else_dfs))
            {
                // Both header branches stay inside: the exit test is at the
                // latch.
                proc.blocks[head_id].loop_type = Some(LoopType::PostTest);
                proc.blocks[head_id].loop_follow = Some(latch_exit(proc, latch_id, head_id));
                let flag_at = proc.blocks[latch_id].last_icode();
                proc.icode.set_ll_flag(flag_at, JX_LOOP);
            } else {
                proc.blocks[head_id].loop_type = Some(LoopType::PreTest);
                let follow = if loop_nodes.contains(&then_dfs) {
                    else_dfs
                } else {
                    then_dfs
                };
                proc.blocks[head_id].loop_follow = Some(follow);
                let flag_at = proc.blocks[head_id].last_icode();
                proc.icode.set_ll_flag(flag_at, JX_LOOP);
            }
        } else {
            // Header is anything but two-way; the latch carries the test.
            proc.blocks[head_id].loop_type = Some(LoopType::PostTest);
            proc.blocks[head_id].loop_follow = Some(latch_exit(proc, latch_id, head_id));
            let flag_at = proc.blocks[latch_id].last_icode();
            proc.icode.set_ll_flag(flag_at, JX_LOOP);
        }
    } else if latch_type == NodeType::LoopSelf {
        proc.blocks[head_id].loop_type = Some(LoopType::PostTest);
        let exit = proc.blocks[latch_id].edges[0];
        proc.blocks[head_id].loop_follow = Some(proc.blocks[exit].dfs_last_num);
    } else if head_type == NodeType::TwoWay {
        // One-way latch under a two-way header: walk the dominator chain up
        // from the latch until it meets one of the header's branches — the
        // follow is the other branch.
        proc.blocks[head_id].loop_type = Some(LoopType::PreTest);
        let then_dfs = edge_dfs(proc, head_id, THEN);
        let else_dfs = edge_dfs(proc, head_id, ELSE);
        let mut walk = latch_id;
        loop {
            let d = proc.blocks[walk].dfs_last_num;
            if d == then_dfs {
                proc.blocks[head_id].loop_follow = Some(else_dfs);
                break;
            }
            if d == else_dfs {
                proc.blocks[head_id].loop_follow = Some(then_dfs);
                break;
            }
            if d <= head_dfs {
                // The walk escaped above the header: a strangely formed
                // loop, safer to treat as endless.
                proc.blocks[head_id].loop_type = Some(LoopType::Endless);
                find_endless_follow(proc, &loop_nodes, head_id);
                break;
            }
            let idom = proc.blocks[walk]
                .immed_dom
                .expect("dominator walk escaped the entry");
            walk = proc.dfs_last[idom];
        }
        if proc.blocks[walk].dfs_last_num > head_dfs {
            // The member scan claimed the follow tentatively; un-claim it.
            let follow = proc.blocks[head_id]
                .loop_follow
                .expect("pre-test follow set by the walk");
            let fid = proc.dfs_last[follow];
            proc.blocks[fid].loop_head = None;
        }
        let flag_at = proc.blocks[head_id].last_icode();
        proc.icode.set_ll_flag(flag_at, JX_LOOP);
    } else {
        proc.blocks[head_id].loop_type = Some(LoopType::Endless);
        find_endless_follow(proc, &loop_nodes, head_id);
    }
}

fn edge_dfs(proc: &Procedure, block: BlockId, which: usize) -> usize {
    let target = proc.blocks[block].edges[which];
    proc.blocks[target].dfs_last_num
}

/// The latch's out-edge that does not re-enter the header.
fn latch_exit(proc: &Procedure, latch_id: BlockId, head_id: BlockId) -> usize {
    if proc.blocks[latch_id].edges[THEN] == head_id {
        edge_dfs(proc, latch_id, ELSE)
    } else {
        edge_dfs(proc, latch_id, THEN)
    }
}

/// Follow of an endless loop: the smallest DFS-last successor outside the
/// loop, if any member has one.
fn find_endless_follow(proc: &mut Procedure, loop_nodes: &HashSet<usize>, head_id: BlockId) {
    let mut follow: Option<usize> = None;
    for &n in loop_nodes {
        let succs = proc.block_at(n).edges.clone();
        for succ in succs {
            let s = proc.blocks[succ].dfs_last_num;
            if !loop_nodes.contains(&s) && follow.map_or(true, |f| s < f) {
                follow = Some(s);
            }
        }
    }
    proc.blocks[head_id].loop_follow = follow;
}
