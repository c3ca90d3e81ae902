use std::fmt;

use super::block::{BasicBlock, LoopType, NodeType};
use super::proc::Procedure;

fn fmt_node_type(t: NodeType, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match t {
        NodeType::OneWay => "1w",
        NodeType::TwoWay => "2w",
        NodeType::MultiWay => "nw",
        NodeType::Return => "ret",
        NodeType::LoopSelf => "self",
        NodeType::Call => "call",
        NodeType::FallThrough => "fall",
    };
    write!(f, "{s}")
}

fn fmt_loop_type(t: LoopType, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match t {
        LoopType::PreTest => "pre-test",
        LoopType::PostTest => "post-test",
        LoopType::Endless => "endless",
    };
    write!(f, "{s}")
}

fn fmt_opt(name: &str, v: Option<usize>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(v) = v {
        write!(f, " {name}={v}")?;
    }
    Ok(())
}

fn fmt_block(proc: &Procedure, blk: &BasicBlock, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "  b{}: ", blk.dfs_last_num)?;
    fmt_node_type(blk.node_type, f)?;
    write!(f, " ->")?;
    for &e in &blk.edges {
        write!(f, " b{}", proc.blocks[e].dfs_last_num)?;
    }
    if blk.invalid {
        write!(f, " INVALID")?;
    }
    fmt_opt("idom", blk.immed_dom, f)?;
    if let Some(lt) = blk.loop_type {
        write!(f, " loop=")?;
        fmt_loop_type(lt, f)?;
        match blk.loop_follow {
            Some(follow) => write!(f, " follow=b{follow}")?,
            None => write!(f, " follow=none")?,
        }
    }
    fmt_opt("head", blk.loop_head, f)?;
    fmt_opt("latch", blk.latch_node, f)?;
    fmt_opt("case", blk.case_head, f)?;
    fmt_opt("tail", blk.case_tail, f)?;
    fmt_opt("if-follow", blk.if_follow, f)?;
    if blk.is_latch {
        write!(f, " LATCH")?;
    }
    writeln!(f)
}

/// Formats a procedure's structural annotations, one block per line in
/// DFS-last order. Intended for debugging and test-failure dumps.
pub struct ProcPrinter<'a>(pub &'a Procedure);

impl fmt::Display for ProcPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proc = self.0;
        writeln!(f, "proc {} ({} blocks)", proc.name, proc.num_blocks())?;
        for n in 0..proc.num_blocks() {
            fmt_block(proc, proc.block_at(n), f)?;
        }
        Ok(())
    }
}
