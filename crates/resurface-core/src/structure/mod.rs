//! Control-flow structuring.
//!
//! Recovers source-level control constructs from a procedure's CFG and its
//! derived interval sequence: dominators first, then case, loop and if
//! structure, and finally compound-condition collapsing. Every stage
//! annotates blocks in place; only the collapser changes the topology,
//! which is why it runs last — it invalidates absorbed blocks and their
//! DFS numbering.

pub mod cases;
pub mod compound;
pub mod dominators;
pub mod ifs;
pub mod loops;

use crate::error::CoreError;
use crate::ir::{Procedure, Program};
use crate::pipeline::Pass;

/// Run the full structuring pipeline over one procedure.
///
/// Expects DFS numbering and the derived sequence populated, and assumes
/// the graph is reducible. Malformed graphs are programmer errors and trip
/// assertions; there are no partial results.
pub fn structure(proc: &mut Procedure) {
    dominators::find_immed_dom(proc);
    if proc.has_case {
        cases::struct_cases(proc);
    }
    loops::struct_loops(proc);
    ifs::struct_ifs(proc);
    compound::compound_conds(proc);
}

/// Pipeline pass applying [`structure`] to every procedure of a program.
pub struct StructurePass;

impl Pass for StructurePass {
    fn name(&self) -> &str {
        "structure"
    }

    fn apply(&self, program: &mut Program) -> Result<(), CoreError> {
        for id in program.procs.keys().collect::<Vec<_>>() {
            let proc = &mut program.procs[id];
            if proc.dfs_last.len() != proc.blocks.len() {
                return Err(CoreError::MalformedProc {
                    proc: proc.name.clone(),
                    message: "DFS numbering not populated".into(),
                });
            }
            structure(proc);
        }
        Ok(())
    }
}
